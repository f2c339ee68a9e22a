//! Fuzz target: `NodeConfig` JSON parsing and validation
//!
//! Feeds arbitrary bytes through the same path `NodeConfig::from_json_file`
//! takes and checks:
//! - No panics under any byte sequence
//! - A config that passes `validate()` always yields light settings
//!
//! cargo fuzz run fuzz_node_config

#![no_main]

use libfuzzer_sys::fuzz_target;
use wakelight::config::NodeConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = serde_json::from_slice::<NodeConfig>(data) else {
        return;
    };
    if config.validate().is_ok() {
        assert!(config.light_settings().is_ok());
        let ramp = config.ramp_config();
        assert!(ramp.ticks_for(ramp.duration) >= 1);
    }
});
