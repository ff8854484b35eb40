use serde_json::json;
use siggen::config::cli::{parse_args, DEFAULT_OUTPUT_DIR};
use siggen::config::{ConfigError, ConfigSchema, Requirement, SignalConfig};
use siggen::core::RevolvingManner;

fn argv(s: &str) -> Vec<String> {
    s.split_whitespace().map(String::from).collect()
}

const BASE_ARGS: &str = "siggen --reference_frequency 100 --reference_amplitude 1 \
                         --sample_rate 10000 --signal_time_length 1";

#[test]
fn test_signal_schema_declares_conditional_requirement() {
    let schema = ConfigSchema::signal();
    let spec = schema.field("revolving_frequency").unwrap();

    assert_eq!(
        spec.requirement,
        Requirement::When {
            key: "revolving_manner",
            equals: "non_arbitrary",
        }
    );
    assert_eq!(schema.fields().len(), 6);
}

#[test]
fn test_cli_non_arbitrary_with_frequency() {
    let (cli, unknown) = parse_args(argv(&format!(
        "{} --revolving_manner non_arbitrary --revolving_frequency 500",
        BASE_ARGS
    )))
    .unwrap();

    assert!(unknown.is_empty());
    assert_eq!(cli.output_dir.to_str(), Some(DEFAULT_OUTPUT_DIR));

    let config = cli.signal_config().unwrap();
    assert_eq!(config.reference_frequency, 100.0);
    assert_eq!(config.revolving_manner, RevolvingManner::NonArbitrary);
    assert_eq!(config.revolving_frequency, Some(500.0));
}

#[test]
fn test_cli_non_arbitrary_without_frequency_is_usage_error() {
    let (cli, _) = parse_args(argv(&format!("{} --revolving_manner non_arbitrary", BASE_ARGS))).unwrap();

    let err = cli.signal_config().unwrap_err();
    assert_eq!(
        err,
        ConfigError::ConditionallyRequired {
            key: "revolving_frequency".to_string(),
            when_key: "revolving_manner".to_string(),
            when_value: "non_arbitrary".to_string(),
        }
    );
    assert_eq!(
        err.to_string(),
        "--revolving_frequency is required when --revolving_manner is 'non_arbitrary'"
    );
}

#[test]
fn test_cli_arbitrary_without_frequency() {
    let (cli, _) = parse_args(argv(&format!("{} --revolving_manner arbitrary", BASE_ARGS))).unwrap();
    let config = cli.signal_config().unwrap();
    assert_eq!(config.revolving_frequency, None);
}

#[test]
fn test_cli_unknown_arguments_tolerated() {
    let (cli, unknown) = parse_args(argv(&format!(
        "{} --revolving_manner arbitrary --operator alice --dry-run",
        BASE_ARGS
    )))
    .unwrap();

    assert_eq!(unknown, argv("--operator alice --dry-run"));
    assert!(cli.signal_config().is_ok());
}

#[test]
fn test_cli_rejects_unknown_manner() {
    let result = parse_args(argv(&format!("{} --revolving_manner sideways", BASE_ARGS)));
    assert!(result.is_err());
}

#[test]
fn test_cli_missing_required_flag() {
    let result = parse_args(argv("siggen --reference_frequency 100 --revolving_manner arbitrary"));
    assert!(result.is_err());
}

#[test]
fn test_cli_annotations_and_points() {
    let (cli, _) = parse_args(argv(&format!(
        "{} --revolving_manner arbitrary --annotate operator=alice --annotate bench=3 --points 1000",
        BASE_ARGS
    )))
    .unwrap();

    assert_eq!(cli.points, Some(1000));
    assert_eq!(
        cli.annotations,
        vec![
            ("operator".to_string(), "alice".to_string()),
            ("bench".to_string(), "3".to_string()),
        ]
    );
}

#[test]
fn test_json_config_conditional_requirement() {
    let err = SignalConfig::from_json(json!({
        "reference_frequency": 100.0,
        "reference_amplitude": 1.0,
        "sample_rate": 10000,
        "signal_time_length": 1.0,
        "revolving_manner": "non_arbitrary"
    }))
    .unwrap_err();

    assert!(matches!(err, ConfigError::ConditionallyRequired { .. }));
}

#[test]
fn test_json_config_type_and_choice_errors() {
    let err = SignalConfig::from_json(json!({
        "reference_frequency": "100",
        "reference_amplitude": 1.0,
        "sample_rate": 10000,
        "signal_time_length": 1.0,
        "revolving_manner": "arbitrary"
    }))
    .unwrap_err();
    assert_eq!(
        err,
        ConfigError::InvalidType {
            key: "reference_frequency".to_string(),
            expected: "a number",
        }
    );

    let err = SignalConfig::from_json(json!({
        "reference_frequency": 100.0,
        "reference_amplitude": 1.0,
        "sample_rate": 10000,
        "signal_time_length": 1.0,
        "revolving_manner": "non-arbitrary"
    }))
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidChoice { .. }));
}

#[test]
fn test_json_config_tolerates_unknown_keys() {
    let config = SignalConfig::from_json(json!({
        "reference_frequency": 100.0,
        "reference_amplitude": 1.0,
        "sample_rate": 10000,
        "signal_time_length": 1.0,
        "revolving_manner": "arbitrary",
        "operator": "alice"
    }))
    .unwrap();

    assert_eq!(config.revolving_manner, RevolvingManner::Arbitrary);
}

#[test]
fn test_boundary_does_not_enforce_engineering_limits() {
    // Limits belong to the container; the boundary only checks shape
    let config = SignalConfig::from_json(json!({
        "reference_frequency": 1.0,
        "reference_amplitude": 1.0,
        "sample_rate": 10000,
        "signal_time_length": 1.0,
        "revolving_manner": "arbitrary"
    }))
    .unwrap();

    assert!(config.to_metadata().unwrap().validate().is_err());
}
