//! Control panel cue sequences, touch cycle, dimmer polling and the
//! watcher thread against mock peripherals.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use wakelight::app::commands::LightCommand;
use wakelight::app::controller::{LightController, RampConfig};
use wakelight::app::ports::PagerSource;
use wakelight::cancel::CancellationToken;
use wakelight::light::{LightName, LightSettings, LightState};
use wakelight::panel::{ControlPanel, PanelInputs, PanelWatcher, SharedAdc};

use crate::mock_hw::{
    ManualClock, MockAdc, MockDelay, MockEdgeInput, MockOutput, MockPin, MockSpeaker, RecordingSink,
    Step, Timeline, TimelineNotifier, wait_until,
};

type TestPanel = ControlPanel<MockPin, MockSpeaker, MockDelay>;

fn panel(timeline: &Timeline) -> TestPanel {
    ControlPanel::new(
        1,
        MockPin::new("led", timeline),
        MockSpeaker::new(timeline),
        MockPin::new("latch", timeline),
        MockDelay::new(timeline),
        0,
    )
}

fn led(high: bool) -> Step {
    Step::Pin { label: "led", high }
}

fn latch(high: bool) -> Step {
    Step::Pin {
        label: "latch",
        high,
    }
}

// ── Cue sequences ─────────────────────────────────────────────

#[test]
fn pager_press_plays_cues_around_notification() {
    let timeline = Timeline::new();
    let mut panel = panel(&timeline);
    let notifier = TimelineNotifier(timeline.clone());

    panel.on_pager_pressed(&notifier);

    assert_eq!(
        timeline.steps(),
        vec![
            led(true),
            Step::DelayMs(500),
            led(false),
            Step::Tone(6000),
            Step::DelayMs(80),
            Step::Silence,
            Step::DelayMs(50),
            Step::Tone(6000),
            Step::DelayMs(80),
            Step::Silence,
            latch(true),
            latch(false),
            Step::Notify(PagerSource::Panel(1)),
            Step::DelayMs(500),
            led(true),
            Step::DelayMs(500),
            led(false),
            Step::Tone(5000),
            Step::DelayMs(200),
            Step::Silence,
        ]
    );
}

#[test]
fn touch_plays_rising_chirp_then_resets_latch() {
    let timeline = Timeline::new();
    let mut panel = panel(&timeline);
    let settings = LightSettings::default();

    let next = panel.on_touch_detected(&LightState::off(), &settings);
    assert_eq!(next, settings.low());

    assert_eq!(
        timeline.steps(),
        vec![
            led(true),
            Step::DelayMs(500),
            led(false),
            Step::Tone(5000),
            Step::DelayMs(80),
            Step::Silence,
            Step::DelayMs(50),
            Step::Tone(7000),
            Step::DelayMs(80),
            Step::Silence,
            latch(true),
            latch(false),
        ]
    );
}

#[test]
fn touch_cycle_and_wakeup_escape() {
    let timeline = Timeline::new();
    let mut panel = panel(&timeline);
    let s = LightSettings::default();

    let low = panel.on_touch_detected(&s.off(), &s);
    let full = panel.on_touch_detected(&low, &s);
    let off = panel.on_touch_detected(&full, &s);
    assert_eq!((low.name, full.name, off.name), (LightName::Low, LightName::Full, LightName::Off));

    let ramping = s.full().scaled(0.4, LightName::Wakeup);
    assert_eq!(panel.on_touch_detected(&ramping, &s), s.full());
}

#[test]
fn remote_page_acknowledgement_has_no_side_effects() {
    let timeline = Timeline::new();
    let mut panel = panel(&timeline);
    panel.acknowledge_pager();

    let steps = timeline.steps();
    assert_eq!(timeline.rises("led").len(), 2);
    assert_eq!(timeline.count(&Step::Tone(5000)), 2);
    assert!(timeline.rises("latch").is_empty(), "{steps:?}");
    assert!(!steps.iter().any(|s| matches!(s, Step::Notify(_))));
}

// ── Dimmer ────────────────────────────────────────────────────

#[test]
fn dimmer_reports_only_changes() {
    let timeline = Timeline::new();
    let mut panel = panel(&timeline);
    let mut adc = MockAdc::default();

    adc.readings.insert(0, 1023);
    assert_eq!(panel.poll_dimmer(&mut adc), Some(100));
    assert_eq!(panel.poll_dimmer(&mut adc), None);

    adc.readings.insert(0, 511);
    assert_eq!(panel.poll_dimmer(&mut adc), Some(49));

    adc.readings.insert(0, 0);
    assert_eq!(panel.poll_dimmer(&mut adc), Some(0));
}

#[test]
fn dimmer_read_error_reports_nothing() {
    let timeline = Timeline::new();
    let mut panel = panel(&timeline);
    let mut adc = MockAdc::default();
    assert_eq!(panel.poll_dimmer(&mut adc), None);
}

// ── Watcher thread ────────────────────────────────────────────

#[test]
fn watcher_routes_inputs() {
    let timeline = Timeline::new();
    let output = MockOutput::new();
    let settings = LightSettings::default();
    let controller = LightController::with_parts(
        output.clone(),
        settings,
        RampConfig::default(),
        Box::new(RecordingSink::default()),
        ManualClock::new(),
    );

    let (pager, pager_trigger) = MockEdgeInput::new(8);
    let (touch, touch_trigger) = MockEdgeInput::new(25);
    let mut adc = MockAdc::default();
    adc.readings.insert(0, 700);
    let dimmer: SharedAdc = Arc::new(Mutex::new(adc));

    let watcher = PanelWatcher {
        panel: Arc::new(Mutex::new(panel(&timeline))),
        inputs: PanelInputs { pager, touch },
        controller: controller.clone(),
        notifier: Arc::new(TimelineNotifier(timeline.clone())),
        dimmer: Some(dimmer),
        poll_timeout: Duration::from_millis(10),
    };
    let cancel = CancellationToken::new();
    let handle = watcher.spawn(cancel.clone()).unwrap();

    touch_trigger.fire();
    assert!(wait_until(Duration::from_secs(2), || {
        controller.current() == settings.low()
    }));
    assert_eq!(output.last(), Some(settings.low()));

    pager_trigger.fire();
    assert!(wait_until(Duration::from_secs(2), || {
        timeline
            .steps()
            .contains(&Step::Notify(PagerSource::Panel(1)))
    }));

    cancel.cancel();
    handle.join().unwrap();
}

/// Delay that delivers one light command the first time the panel pauses,
/// standing in for an RF press that lands while a cue is playing.
struct CommandDuringCue {
    pending: Option<(LightController<MockOutput>, LightCommand)>,
}

impl DelayNs for CommandDuringCue {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, _ms: u32) {
        if let Some((controller, cmd)) = self.pending.take() {
            controller.handle_command(cmd);
        }
    }
}

#[test]
fn touch_applies_to_state_reached_during_cue() {
    let timeline = Timeline::new();
    let output = MockOutput::new();
    let settings = LightSettings::default();
    let controller = LightController::with_parts(
        output.clone(),
        settings,
        RampConfig::default(),
        Box::new(RecordingSink::default()),
        ManualClock::new(),
    );
    let panel = ControlPanel::new(
        1,
        MockPin::new("led", &timeline),
        MockSpeaker::new(&timeline),
        MockPin::new("latch", &timeline),
        CommandDuringCue {
            pending: Some((controller.clone(), LightCommand::On)),
        },
        0,
    );

    let (pager, _pager_trigger) = MockEdgeInput::new(8);
    let (touch, touch_trigger) = MockEdgeInput::new(25);
    let watcher = PanelWatcher {
        panel: Arc::new(Mutex::new(panel)),
        inputs: PanelInputs { pager, touch },
        controller: controller.clone(),
        notifier: Arc::new(TimelineNotifier(timeline.clone())),
        dimmer: None,
        poll_timeout: Duration::from_millis(10),
    };
    let cancel = CancellationToken::new();
    let handle = watcher.spawn(cancel.clone()).unwrap();

    // Off when touched, full by the end of the cue: the touch turns it off.
    touch_trigger.fire();
    assert!(wait_until(Duration::from_secs(2), || {
        timeline.rises("latch").len() == 1 && output.write_count() == 2
    }));
    cancel.cancel();
    handle.join().unwrap();

    assert_eq!(output.writes(), vec![settings.full(), settings.off()]);
    assert_eq!(controller.current(), settings.off());
}
