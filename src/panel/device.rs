//! Control panel feedback: status LED, piezo speaker and input latch.
//!
//! A panel has two latched inputs (pager button and touch sensor), an
//! indicator LED, a speaker and a latch-reset line.  Every recognised
//! input plays a short cue so the user knows it registered.
//!
//! | Input          | Cue                                              |
//! |----------------|--------------------------------------------------|
//! | Pager pressed  | blink, 6 kHz double chirp; later blink, 5 kHz     |
//! | Touch          | blink, 5 kHz chirp, 7 kHz chirp                   |
//! | Remote page    | double short blink, double 5 kHz chirp            |

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use crate::app::ports::{AnalogInput, PagerNotifier, PagerSource, Speaker};
use crate::light::{LightSettings, LightState};

use super::mapper::next_light_state;

/// Full-scale reading of the 10-bit dimmer ADC.
const DIMMER_FULL_SCALE: u32 = 1023;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cue {
    Blink { ms: u32 },
    Chirp { hz: u32, ms: u32 },
    Pause { ms: u32 },
}

const PAGER_RECEIVED: &[Cue] = &[
    Cue::Blink { ms: 500 },
    Cue::Chirp { hz: 6000, ms: 80 },
    Cue::Pause { ms: 50 },
    Cue::Chirp { hz: 6000, ms: 80 },
];

const PAGER_SENT: &[Cue] = &[
    Cue::Pause { ms: 500 },
    Cue::Blink { ms: 500 },
    Cue::Chirp { hz: 5000, ms: 200 },
];

const TOUCH: &[Cue] = &[
    Cue::Blink { ms: 500 },
    Cue::Chirp { hz: 5000, ms: 80 },
    Cue::Pause { ms: 50 },
    Cue::Chirp { hz: 7000, ms: 80 },
];

const REMOTE_PAGE: &[Cue] = &[
    Cue::Blink { ms: 250 },
    Cue::Pause { ms: 80 },
    Cue::Blink { ms: 250 },
    Cue::Chirp { hz: 5000, ms: 80 },
    Cue::Pause { ms: 80 },
    Cue::Chirp { hz: 5000, ms: 80 },
];

/// One physical control panel.
pub struct ControlPanel<P, S, D> {
    id: u8,
    led: P,
    speaker: S,
    latch_reset: P,
    delay: D,
    dimmer_channel: u8,
    dimmer_percent: Option<u16>,
}

impl<P, S, D> ControlPanel<P, S, D>
where
    P: OutputPin,
    S: Speaker,
    D: DelayNs,
{
    pub fn new(id: u8, led: P, speaker: S, latch_reset: P, delay: D, dimmer_channel: u8) -> Self {
        Self {
            id,
            led,
            speaker,
            latch_reset,
            delay,
            dimmer_channel,
            dimmer_percent: None,
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Pager button: acknowledge locally, clear the latch, page upstream,
    /// then confirm the page went out.
    pub fn on_pager_pressed(&mut self, notifier: &dyn PagerNotifier) {
        info!("Panel {}: pager pressed", self.id);
        self.play(PAGER_RECEIVED);
        self.reset_latch();
        notifier.notify(PagerSource::Panel(self.id));
        self.play(PAGER_SENT);
    }

    /// Touch sensor: play the cue, clear the latch and return the next
    /// state in the touch cycle.  The caller drives it.
    pub fn on_touch_detected(&mut self, current: &LightState, settings: &LightSettings) -> LightState {
        self.play_touch_feedback();
        let next = next_light_state(current, settings);
        debug!("Panel {}: touch {} -> {}", self.id, current.name, next.name);
        next
    }

    /// Touch cue followed by the latch reset.  The light transition is
    /// left to the caller.
    pub fn play_touch_feedback(&mut self) {
        self.play(TOUCH);
        self.reset_latch();
    }

    /// A page arrived from the RF remote.
    pub fn acknowledge_pager(&mut self) {
        info!("Panel {}: remote page", self.id);
        self.play(REMOTE_PAGE);
    }

    /// Read the dimmer knob as a percentage.  Returns `Some` only when the
    /// value differs from the previous reading.
    pub fn poll_dimmer(&mut self, adc: &mut (impl AnalogInput + ?Sized)) -> Option<u16> {
        let raw = match adc.read_channel(self.dimmer_channel) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Panel {}: dimmer read failed: {e}", self.id);
                return None;
            }
        };
        let percent = (u32::from(raw).min(DIMMER_FULL_SCALE) * 100 / DIMMER_FULL_SCALE) as u16;
        if self.dimmer_percent == Some(percent) {
            return None;
        }
        self.dimmer_percent = Some(percent);
        Some(percent)
    }

    // ── Cue playback ──────────────────────────────────────────

    fn play(&mut self, cues: &[Cue]) {
        for cue in cues {
            match *cue {
                Cue::Blink { ms } => self.blink(ms),
                Cue::Chirp { hz, ms } => self.chirp(hz, ms),
                Cue::Pause { ms } => self.delay.delay_ms(ms),
            }
        }
    }

    fn blink(&mut self, ms: u32) {
        if let Err(e) = self.led.set_high() {
            warn!("Panel {}: LED on failed: {e:?}", self.id);
        }
        self.delay.delay_ms(ms);
        if let Err(e) = self.led.set_low() {
            warn!("Panel {}: LED off failed: {e:?}", self.id);
        }
    }

    fn chirp(&mut self, hz: u32, ms: u32) {
        if let Err(e) = self.speaker.tone(hz) {
            warn!("Panel {}: {e}", self.id);
        }
        self.delay.delay_ms(ms);
        if let Err(e) = self.speaker.silence() {
            warn!("Panel {}: {e}", self.id);
        }
    }

    /// Clear the hardware input latch so the next press registers.
    fn reset_latch(&mut self) {
        if let Err(e) = self.latch_reset.set_high() {
            warn!("Panel {}: latch reset failed: {e:?}", self.id);
        }
        self.delay.delay_us(1);
        if let Err(e) = self.latch_reset.set_low() {
            warn!("Panel {}: latch release failed: {e:?}", self.id);
        }
    }
}
