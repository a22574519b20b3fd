//! End-to-end protection scenarios: excellent data under default
//! config, bad data under raise/warn modes, auto-generation,
//! bundled-standard precedence, and a dimension-minimum override.

use adri::config::{AdriConfig, ConfigurationLoader, FailureMode};
use adri::protection::{ProtectOptions, ProtectionEngine};
use adri::value::{Cell, Column, Dataset};

fn isolated_config(tmp: &std::path::Path) -> AdriConfig {
    let mut config = ConfigurationLoader::create_default_config("integration-tests");
    config.paths.contracts = tmp.join("contracts");
    config.paths.assessments = tmp.join("assessments");
    config.paths.training_data = tmp.join("training-data");
    config.paths.audit_logs = tmp.join("audit-logs");
    config
}

fn excellent_customers() -> Dataset {
    Dataset::new(vec![
        Column::new(
            "customer_id",
            vec![Cell::Integer(1), Cell::Integer(2), Cell::Integer(3), Cell::Integer(4)],
        ),
        Column::new(
            "email",
            vec![
                Cell::Text("alice@example.com".into()),
                Cell::Text("bob@example.com".into()),
                Cell::Text("carol@example.com".into()),
                Cell::Text("dave@example.com".into()),
            ],
        ),
        Column::new(
            "age",
            vec![Cell::Integer(28), Cell::Integer(41), Cell::Integer(35), Cell::Integer(52)],
        ),
    ])
}

fn corrupted_customers() -> Dataset {
    Dataset::new(vec![
        Column::new(
            "customer_id",
            vec![Cell::Integer(1), Cell::Integer(1), Cell::Null, Cell::Integer(4)],
        ),
        Column::new(
            "email",
            vec![
                Cell::Text("not-an-email".into()),
                Cell::Null,
                Cell::Text("????".into()),
                Cell::Text("dave@example.com".into()),
            ],
        ),
        Column::new(
            "age",
            vec![Cell::Integer(-12), Cell::Integer(9001), Cell::Null, Cell::Integer(52)],
        ),
    ])
}

#[test]
fn excellent_data_is_allowed_under_default_config() {
    let tmp = tempfile::tempdir().unwrap();
    let config = isolated_config(tmp.path());
    let engine = ProtectionEngine::new(config).unwrap();

    let mut invoked = false;
    let options = ProtectOptions::new().with_min_score(75.0).with_auto_generate(true);
    let result = engine.protect("process_customers", &excellent_customers(), &options, |_| {
        invoked = true;
        "done"
    });

    assert_eq!(result.unwrap(), "done");
    assert!(invoked);
}

#[test]
fn bad_data_is_blocked_in_raise_mode() {
    let tmp = tempfile::tempdir().unwrap();
    let config = isolated_config(tmp.path());
    let engine = ProtectionEngine::new(config).unwrap();

    // Train a standard against clean data first.
    let train_options = ProtectOptions::new().with_min_score(80.0).with_auto_generate(true);
    engine
        .protect("process_customers", &excellent_customers(), &train_options, |_| ())
        .unwrap();

    let mut invoked = false;
    let options = ProtectOptions::new()
        .with_min_score(80.0)
        .with_on_failure(FailureMode::Raise);
    let result = engine.protect("process_customers", &corrupted_customers(), &options, |_| {
        invoked = true;
    });

    assert!(result.is_err());
    assert!(!invoked, "raise mode must not invoke the wrapped function");
}

#[test]
fn bad_data_only_warns_in_warn_mode() {
    let tmp = tempfile::tempdir().unwrap();
    let config = isolated_config(tmp.path());
    let engine = ProtectionEngine::new(config).unwrap();

    let train_options = ProtectOptions::new().with_min_score(80.0).with_auto_generate(true);
    engine
        .protect("process_customers", &excellent_customers(), &train_options, |_| ())
        .unwrap();

    let options = ProtectOptions::new()
        .with_min_score(80.0)
        .with_on_failure(FailureMode::Warn);
    let result = engine.protect("process_customers", &corrupted_customers(), &options, |_| "ran anyway");

    assert_eq!(result.unwrap(), "ran anyway");
}

#[test]
fn auto_generation_persists_a_standard_file_for_reuse() {
    let tmp = tempfile::tempdir().unwrap();
    let config = isolated_config(tmp.path());
    let engine = ProtectionEngine::new(config.clone()).unwrap();

    let options = ProtectOptions::new().with_min_score(75.0).with_auto_generate(true);
    engine
        .protect("process_customers", &excellent_customers(), &options, |_| ())
        .unwrap();

    let expected_path = config.paths.contracts.join("process_customers_data.yaml");
    assert!(expected_path.is_file(), "auto-generation should write a standard to disk");

    // A second engine pointed at the same directory should reuse the
    // persisted file rather than regenerating it.
    let second_engine = ProtectionEngine::new(config).unwrap();
    let no_autogen = ProtectOptions::new().with_min_score(75.0).with_auto_generate(false);
    let result = second_engine.protect("process_customers", &excellent_customers(), &no_autogen, |_| "reused");
    assert_eq!(result.unwrap(), "reused");
}

#[test]
fn bundled_standard_takes_precedence_over_file_lookup() {
    let tmp = tempfile::tempdir().unwrap();
    let config = isolated_config(tmp.path());
    let engine = ProtectionEngine::new(config).unwrap();

    let data = Dataset::new(vec![
        Column::new(
            "customer_id",
            vec![Cell::Integer(1), Cell::Integer(2), Cell::Integer(3)],
        ),
        Column::new(
            "email",
            vec![
                Cell::Text("alice@example.com".into()),
                Cell::Text("bob@example.com".into()),
                Cell::Text("carol@example.com".into()),
            ],
        ),
        Column::new("status", vec![Cell::Text("active".into()), Cell::Text("active".into()), Cell::Text("inactive".into())]),
        Column::new("age", vec![Cell::Integer(25), Cell::Integer(40), Cell::Integer(33)]),
    ]);

    let options = ProtectOptions::new()
        .with_standard_name("customer_data")
        .with_min_score(50.0);
    let result = engine.protect("any_function", &data, &options, |_| "used bundled");
    assert_eq!(result.unwrap(), "used bundled");
}

#[test]
fn dimension_minimum_override_blocks_despite_passing_overall_score() {
    let tmp = tempfile::tempdir().unwrap();
    let config = isolated_config(tmp.path());
    let engine = ProtectionEngine::new(config).unwrap();

    let train_options = ProtectOptions::new().with_min_score(75.0).with_auto_generate(true);
    engine
        .protect("process_customers", &excellent_customers(), &train_options, |_| ())
        .unwrap();

    // Demand a near-perfect completeness score that the otherwise-passing
    // corrupted dataset cannot reach, even though nothing else in this
    // call requires it.
    let options = ProtectOptions::new()
        .with_min_score(0.0)
        .with_dimension_minimum("completeness", 19.5)
        .with_on_failure(FailureMode::Raise);
    let result = engine.protect("process_customers", &corrupted_customers(), &options, |_| "should not run");

    assert!(result.is_err());
}
