#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validate must reject garbage without panicking; a config
    // that validates must also map onto the runtime types.
    if let Ok(cfg) = fanctl_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        let rt = fanctl_core::ControlCfg::try_from(&cfg);
        assert!(rt.is_ok(), "validated config rejected: {rt:?}");
    }
});
