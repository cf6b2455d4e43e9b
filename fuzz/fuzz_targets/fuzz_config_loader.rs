#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    let Ok(cfg) = ridewatch_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        // Anything the TOML layer accepts must also satisfy the engine's checks.
        let dc = ridewatch_core::DetectionConfig::from(&cfg);
        assert!(ridewatch_core::builder::validate(&dc).is_ok());
    }
});
