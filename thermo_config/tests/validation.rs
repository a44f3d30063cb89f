use rstest::rstest;
use thermo_config::load_toml;

#[test]
fn empty_file_yields_valid_defaults() {
    let cfg = load_toml("").expect("parse TOML");
    cfg.validate().expect("defaults should validate");
    assert_eq!(cfg.actuator.max_offset_c, 8.0);
    assert_eq!(cfg.window.open_delay_s, 600);
    assert!(cfg.modes.coast_offset_c.is_none());
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let toml = r#"
[comfort]
kp = 3.5

[command]
min_interval_s = 300

[window]
enabled = false
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.comfort.kp, 3.5);
    assert_eq!(cfg.comfort.i_small_max_c, 2.0);
    assert_eq!(cfg.command.min_interval_s, 300);
    assert_eq!(cfg.command.max_step_up_c, 0.5);
    assert!(!cfg.window.enabled);
}

#[rstest]
#[case("[bias]\nmin_c = 2.0\nmax_c = 1.0\n", "bias.min_c must be <= bias.max_c")]
#[case("[actuator]\nmin_c = 30.0\n", "actuator.min_c must be <= actuator.max_c")]
#[case("[trend]\nalpha = 0.0\n", "trend.alpha must be in (0.0, 1.0]")]
#[case("[trend]\ndrop_threshold_c_per_min = 0.1\n", "drop_threshold_c_per_min must be < 0")]
#[case("[bias]\ntau_s = 0.0\n", "bias.tau_s must be > 0")]
#[case("[modes]\nboost_error_off_c = 1.0\n", "boost_error_off_c must be <=")]
#[case("[modes]\ncoast_error_on_c = 0.0\n", "coast_error_on_c must be <=")]
#[case("[fast_recovery]\nmax_step_up_c = 0.1\n", "fast_recovery.max_step_up_c must be >=")]
#[case("[window]\nfrost_protection_c = 2.0\n", "frost_protection_c must lie within")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation must be one of")]
#[case("[comfort]\nkp = nan\n", "comfort.kp must be a finite number")]
fn rejects_invalid_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "message {msg:?} lacks {needle:?}");
}

#[test]
fn coast_offset_must_be_non_negative() {
    let cfg = load_toml("[modes]\ncoast_offset_c = -1.0\n").expect("parse TOML");
    let err = cfg.validate().expect_err("negative offset");
    assert!(format!("{err}").contains("coast_offset_c must be >= 0"));
}

#[test]
fn unknown_types_fail_at_parse_time() {
    let err = load_toml("[command]\nmin_interval_s = \"soon\"\n").expect_err("type mismatch");
    assert!(format!("{err}").contains("min_interval_s"));
}
