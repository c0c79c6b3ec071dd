use super::*;
use serde_json::json;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

fn create_test_params(
    distance_filter_meters: f64,
    requested_accuracy_distance: i64,
    interval_ms: i64,
    aggressive_interval_ms: i64,
    activity_label: &str,
) -> ConfigureParams {
    ConfigureParams {
        distance_filter_meters,
        requested_accuracy_distance,
        interval_ms,
        aggressive_interval_ms,
        activity_label: activity_label.to_string(),
        debug: Some(true),
        use_activity_detection: false,
    }
}

#[test]
fn test_configuration_defaults() {
    let config = Configuration::default();
    assert_eq!(config.distance_filter_meters, 0.0);
    assert_eq!(config.accuracy_tier, AccuracyTier::Best);
    assert_eq!(config.interval_seconds, 5.0);
    assert_eq!(config.aggressive_interval_seconds, 2.0);
    assert_eq!(config.activity_hint, ActivityHint::Other);
    assert!(!config.debug_enabled);
    assert!(!config.use_activity_detection);
}

#[test]
fn test_interval_conversion_is_exact() {
    let config =
        Configuration::try_from(create_test_params(0.0, 0, 5000, 2000, "Fitness")).unwrap();
    assert_eq!(config.interval_seconds, 5.0);
    assert_eq!(config.aggressive_interval_seconds, 2.0);

    // Sub-second remainders are kept
    let config =
        Configuration::try_from(create_test_params(0.0, 0, 2500, 750, "Fitness")).unwrap();
    assert_eq!(config.interval_seconds, 2.5);
    assert_eq!(config.aggressive_interval_seconds, 0.75);
}

#[test]
fn test_configuration_resolves_tier_and_hint() {
    let config =
        Configuration::try_from(create_test_params(25.0, 150, 1000, 1000, "OtherNavigation"))
            .unwrap();
    assert_eq!(config.distance_filter_meters, 25.0);
    assert_eq!(config.accuracy_tier, AccuracyTier::HundredMeters);
    assert_eq!(config.activity_hint, ActivityHint::OtherNavigation);
    assert!(config.debug_enabled);
}

#[test]
fn test_debug_defaults_to_false_when_unset() {
    let mut params = create_test_params(0.0, 10, 1000, 1000, "Other");
    params.debug = None;
    let config = Configuration::try_from(params).unwrap();
    assert!(!config.debug_enabled);
}

#[test]
fn test_huge_requested_accuracy_saturates() {
    let config =
        Configuration::try_from(create_test_params(0.0, i64::MAX, 1000, 1000, "Other")).unwrap();
    assert_eq!(config.accuracy_tier, AccuracyTier::ThreeKilometers);
}

#[test]
fn test_negative_requested_accuracy_maps_to_best() {
    let args = vec![
        json!(0),
        json!(-5),
        json!(5000),
        json!(1000),
        json!(2000),
        json!(false),
        json!(""),
        json!(""),
        json!("Fitness"),
        json!(false),
    ];
    let params = ConfigureParams::from_positional(&args).unwrap();
    let config = Configuration::try_from(params).unwrap();
    assert_eq!(config.accuracy_tier, AccuracyTier::Best);

    let config =
        Configuration::try_from(create_test_params(0.0, -1, 1000, 1000, "Other")).unwrap();
    assert_eq!(config.accuracy_tier, AccuracyTier::Best);
}

#[test]
fn test_validation_rejects_out_of_range_fields() {
    let cases = [
        (create_test_params(-1.0, 10, 1000, 1000, "Other"), "distance_filter_meters"),
        (create_test_params(f64::NAN, 10, 1000, 1000, "Other"), "distance_filter_meters"),
        (create_test_params(f64::INFINITY, 10, 1000, 1000, "Other"), "distance_filter_meters"),
        (create_test_params(0.0, 10, -1, 1000, "Other"), "interval_ms"),
        (create_test_params(0.0, 10, 1000, -1, "Other"), "aggressive_interval_ms"),
    ];

    for (params, field) in cases {
        let err = Configuration::try_from(params).unwrap_err();
        assert_eq!(err.field(), field);
        assert!(err.to_string().starts_with("invalid configuration"));
    }
}

#[test]
fn test_positional_arguments() {
    let args = vec![
        json!(15.5),
        json!(100),
        json!(5000),
        json!(1000), // fastest interval, ignored
        json!(2000),
        json!(true),
        json!("title"),
        json!("text"),
        json!("AutomotiveNavigation"),
        json!(true),
    ];

    let params = ConfigureParams::from_positional(&args).unwrap();
    assert_eq!(params.distance_filter_meters, 15.5);
    assert_eq!(params.requested_accuracy_distance, 100);
    assert_eq!(params.interval_ms, 5000);
    assert_eq!(params.aggressive_interval_ms, 2000);
    assert_eq!(params.debug, Some(true));
    assert_eq!(params.activity_label, "AutomotiveNavigation");
    assert!(params.use_activity_detection);

    let config = Configuration::try_from(params).unwrap();
    assert_eq!(config.accuracy_tier, AccuracyTier::HundredMeters);
    assert_eq!(config.activity_hint, ActivityHint::Automotive);
}

#[test]
fn test_positional_whole_floats_accepted_as_integers() {
    let args = vec![
        json!(0),
        json!(10.0),
        json!(5000.0),
        json!(null),
        json!(2000),
        json!("yes"),
        json!(null),
        json!(null),
        json!("Fitness"),
        json!(false),
    ];

    let params = ConfigureParams::from_positional(&args).unwrap();
    assert_eq!(params.requested_accuracy_distance, 10);
    assert_eq!(params.interval_ms, 5000);
    // A non-boolean debug flag is treated as unset
    assert_eq!(params.debug, None);
}

#[test]
fn test_positional_missing_and_ill_typed() {
    let err = ConfigureParams::from_positional(&[json!(0), json!(10)]).unwrap_err();
    assert_eq!(err.field(), "interval_ms");

    let mut args = vec![
        json!(0),
        json!(10),
        json!(5000),
        json!(null),
        json!(2000),
        json!(false),
        json!(null),
        json!(null),
        json!("Fitness"),
        json!(false),
    ];

    args[0] = json!("ten");
    assert_eq!(
        ConfigureParams::from_positional(&args).unwrap_err().field(),
        "distance_filter_meters"
    );

    args[0] = json!(0);
    args[2] = json!(12.5);
    assert_eq!(
        ConfigureParams::from_positional(&args).unwrap_err().field(),
        "interval_ms"
    );

    args[2] = json!(5000);
    args[8] = json!(3);
    assert_eq!(
        ConfigureParams::from_positional(&args).unwrap_err().field(),
        "activity_label"
    );

    args[8] = json!("Fitness");
    args[9] = json!("true");
    assert_eq!(
        ConfigureParams::from_positional(&args).unwrap_err().field(),
        "use_activity_detection"
    );
}

#[test]
fn test_named_arguments() {
    let fields = json!({
        "distance_filter_meters": 5.0,
        "requested_accuracy_distance": 100,
        "interval_ms": 5000,
        "aggressive_interval_ms": 2000,
        "activity_label": "Fitness",
        "debug": "yes",
        "use_activity_detection": false,
    });

    let params = ConfigureParams::from_named(fields.as_object().unwrap()).unwrap();
    assert_eq!(params.requested_accuracy_distance, 100);
    assert_eq!(params.activity_label, "Fitness");
    assert_eq!(params.debug, None);
}

#[test]
fn test_named_arguments_report_offending_field() {
    let mut fields = json!({
        "distance_filter_meters": 5.0,
        "requested_accuracy_distance": 100,
        "aggressive_interval_ms": 2000,
        "activity_label": "Fitness",
        "use_activity_detection": false,
    });

    let err = ConfigureParams::from_named(fields.as_object().unwrap()).unwrap_err();
    assert_eq!(err.field(), "interval_ms");
    assert!(err.to_string().contains("is missing"));

    fields["interval_ms"] = json!("soon");
    let err = ConfigureParams::from_named(fields.as_object().unwrap()).unwrap_err();
    assert_eq!(err.field(), "interval_ms");
}

#[test]
fn test_non_boolean_debug_in_options_file_is_unset() {
    let params: ConfigureParams = toml::from_str(
        r#"
distance_filter_meters = 0.0
requested_accuracy_distance = 10
interval_ms = 5000
aggressive_interval_ms = 2000
activity_label = "Other"
debug = "verbose"
use_activity_detection = false
"#,
    )
    .unwrap();
    assert_eq!(params.debug, None);

    let params: ConfigureParams = serde_json::from_value(json!({
        "distance_filter_meters": 0.0,
        "requested_accuracy_distance": 10,
        "interval_ms": 5000,
        "aggressive_interval_ms": 2000,
        "activity_label": "Other",
        "use_activity_detection": false,
    }))
    .unwrap();
    assert_eq!(params.debug, None);
}

#[test]
fn test_load_from_path_parses_options_file() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("locatr.toml");
    fs::write(
        &path,
        r#"
distance_filter_meters = 5
requested_accuracy_distance = 0
interval_ms = 5000
aggressive_interval_ms = 2000
activity_label = "Fitness"
debug = true
use_activity_detection = false
"#,
    )
    .unwrap();

    let params = load_from_path(&path).unwrap();
    assert_eq!(params.distance_filter_meters, 5.0);
    assert_eq!(params.activity_label, "Fitness");
    assert_eq!(params.debug, Some(true));
}

#[test]
fn test_load_from_path_missing_field_fails() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("locatr.toml");
    fs::write(&path, "distance_filter_meters = 5\n").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
#[serial]
fn test_load_creates_default_config() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("locatr").join("locatr.toml");

    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let result = load();

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    let params = result.unwrap();
    assert!(config_path.exists());

    let config = Configuration::try_from(params).unwrap();
    assert_eq!(config.accuracy_tier, AccuracyTier::NearestTenMeters);
    assert_eq!(config.interval_seconds, 5.0);
    assert!(!config.debug_enabled);
}

#[test]
fn test_default_config_round_trips_through_validation() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nested").join("locatr.toml");

    create_default_config(&path).unwrap();
    let params = load_from_path(&path).unwrap();
    assert!(Configuration::try_from(params).is_ok());
}
