//! Touch-cycle mapping: the next light state for a panel touch.

use crate::light::{LightName, LightSettings, LightState};

/// Off → Low → Full → Off.  A ramp in progress jumps straight to Full.
///
/// Pure: the result depends only on `current.name` and the presets.
pub fn next_light_state(current: &LightState, settings: &LightSettings) -> LightState {
    match current.name {
        LightName::Off => settings.low(),
        LightName::Low => settings.full(),
        LightName::Full => settings.off(),
        LightName::Wakeup => settings.full(),
    }
}
