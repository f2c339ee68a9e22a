//! Fuzz target: `LightCommand` parsing
//!
//! Any accepted line must round-trip through `Display`, and parsing
//! never panics on arbitrary UTF-8.
//!
//! cargo fuzz run fuzz_light_command

#![no_main]

use libfuzzer_sys::fuzz_target;
use wakelight::app::commands::LightCommand;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(cmd) = text.parse::<LightCommand>() {
        assert_eq!(cmd.to_string().parse::<LightCommand>(), Ok(cmd));
    }
});
