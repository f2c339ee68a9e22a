//! Wakelight node: main entry point.
//!
//! Hexagonal architecture with one thread per input source.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  PwmLightOutput   RpiGpio        Mcp3008      LogEventSink     │
//! │  (LightOutput)    (GpioBank)     (AnalogIn)   (EventSink)      │
//! │  PwmSpeaker       MonotonicClock StdDelay     LogPagerNotifier │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │        LightController (state · ramp session)          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │     ▲ RF watchers (A-D)   ▲ panel watchers   ▲ console         │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::{self, BufRead};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use wakelight::adapters::log_sink::LogPagerNotifier;
use wakelight::adapters::rpi::{Mcp3008, PwmLightOutput, PwmSpeaker, RpiEdgeInput, RpiGpio, RpiOutput};
use wakelight::adapters::time::StdDelay;
use wakelight::app::commands::LightCommand;
use wakelight::app::controller::LightController;
use wakelight::app::ports::{GpioBank, LightOutput, PagerNotifier, PagerSource};
use wakelight::cancel::CancellationToken;
use wakelight::config::{NodeConfig, PanelConfig};
use wakelight::error::DriveError;
use wakelight::light::LightState;
use wakelight::panel::{ControlPanel, PanelInputs, PanelWatcher, SharedAdc, SharedPanel};
use wakelight::rf::{LatchedReceiver, RfChannel};

type Panel = SharedPanel<RpiOutput, PwmSpeaker, StdDelay>;

/// Output used when the LED strip is disabled: records nothing, drives
/// nothing.
struct DisabledOutput;

impl LightOutput for DisabledOutput {
    fn apply(&mut self, state: &LightState) -> Result<(), DriveError> {
        debug!("LED strip disabled, not driving {state}");
        Ok(())
    }
}

fn main() -> Result<()> {
    // ── 1. Config + logging ───────────────────────────────────
    let config = NodeConfig::load().context("loading configuration")?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level)).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  Wakelight v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
    info!("Node '{}'", config.node_name);

    let cancel = CancellationToken::new();
    let mut gpio = RpiGpio::new().context("opening GPIO")?;

    // ── 2. Light controller ───────────────────────────────────
    let output: Box<dyn LightOutput> = if config.led_strip_enabled {
        Box::new(PwmLightOutput::new(&mut gpio, &config.led_pins, config.pwm_frequency_hz)?)
    } else {
        warn!("LED strip disabled");
        Box::new(DisabledOutput)
    };
    let controller = LightController::new(output, config.light_settings()?, config.ramp_config());
    controller.set_immediate(LightState::off());

    let notifier: Arc<dyn PagerNotifier> = Arc::new(LogPagerNotifier::new(config.node_name.clone()));

    // ── 3. Control panels ─────────────────────────────────────
    let dimmer: Option<SharedAdc> = if config.enabled_panels().next().is_some() {
        match Mcp3008::new(&config.adc) {
            Ok(adc) => Some(Arc::new(Mutex::new(adc))),
            Err(e) => {
                warn!("Dimmer ADC unavailable ({e}), panels run without dimmers");
                None
            }
        }
    } else {
        None
    };

    let mut panels: Vec<Panel> = Vec::new();
    let mut panel_threads: Vec<JoinHandle<()>> = Vec::new();
    for (id, panel_config) in config.enabled_panels() {
        let (panel, inputs) = build_panel(&mut gpio, id, panel_config)?;
        let panel = Arc::new(Mutex::new(panel));
        let watcher = PanelWatcher {
            panel: Arc::clone(&panel),
            inputs,
            controller: controller.clone(),
            notifier: Arc::clone(&notifier),
            dimmer: dimmer.clone(),
            poll_timeout: config.rf_wait_timeout(),
        };
        panel_threads.push(watcher.spawn(cancel.clone())?);
        panels.push(panel);
    }

    // ── 4. RF remote ──────────────────────────────────────────
    let mut receiver = LatchedReceiver::new(&mut gpio, config.rf_pins)?
        .with_wait_timeout(config.rf_wait_timeout());

    for (channel, command) in [
        (RfChannel::A, LightCommand::On),
        (RfChannel::B, LightCommand::Dim),
        (RfChannel::C, LightCommand::Off),
    ] {
        let controller = controller.clone();
        receiver.register_handler(channel, move || controller.handle_command(command));
    }
    {
        let panels = panels.clone();
        let notifier = Arc::clone(&notifier);
        receiver.register_handler(RfChannel::D, move || {
            for panel in &panels {
                panel
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .acknowledge_pager();
            }
            notifier.notify(PagerSource::Remote);
        });
    }
    let running = receiver.run(&cancel)?;

    // ── 5. Console command loop ───────────────────────────────
    info!(
        "Ready. Commands: on, off, dim, toggle, wakeup, halt, \
         color <r> <g> <w> <b>, dim-level <fraction>, quit"
    );
    for line in io::stdin().lock().lines() {
        let line = line?;
        let word = line.trim();
        if word.is_empty() {
            continue;
        }
        if word.eq_ignore_ascii_case("quit") {
            break;
        }
        match word.parse::<LightCommand>() {
            Ok(cmd) => controller.handle_command(cmd),
            Err(e) => warn!("{e}"),
        }
    }

    // ── 6. Shutdown ───────────────────────────────────────────
    info!("Shutting down");
    cancel.cancel();
    controller.halt_wakeup();
    running.join();
    for handle in panel_threads {
        if handle.join().is_err() {
            warn!("Panel watcher panicked");
        }
    }
    Ok(())
}

fn build_panel(
    gpio: &mut RpiGpio,
    id: u8,
    config: &PanelConfig,
) -> Result<(ControlPanel<RpiOutput, PwmSpeaker, StdDelay>, PanelInputs<RpiEdgeInput>)> {
    let claim_out = |gpio: &mut RpiGpio, pin: u8, what: &str| {
        gpio.claim_output_low(pin)
            .with_context(|| format!("panel {id}: {what} (gpio {pin})"))
    };
    let claim_in = |gpio: &mut RpiGpio, pin: u8, what: &str| {
        gpio.claim_rising_edge_input(pin)
            .with_context(|| format!("panel {id}: {what} (gpio {pin})"))
    };

    let led = claim_out(gpio, config.led_pin, "LED")?;
    let latch_reset = claim_out(gpio, config.reset_pin, "latch reset")?;
    let speaker = PwmSpeaker::new(gpio, config.speaker_pin)?;
    let inputs = PanelInputs {
        pager: claim_in(gpio, config.pager_pin, "pager")?,
        touch: claim_in(gpio, config.touch_pin, "touch")?,
    };
    let panel = ControlPanel::new(id, led, speaker, latch_reset, StdDelay, config.dimmer_channel);
    info!("Panel {id} ready");
    Ok((panel, inputs))
}
