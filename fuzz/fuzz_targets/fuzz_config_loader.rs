#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse or validation errors are fine; panics are not.
    let Ok(cfg) = thermo_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    // Anything the schema accepts must convert and construct a controller.
    let params = thermo_core::Params::from(&cfg);
    if let Err(e) = thermo_core::ZoneController::new(params) {
        assert!(
            e.downcast_ref::<thermo_core::ConfigurationError>().is_some(),
            "unexpected construction error: {e}"
        );
    }
});
