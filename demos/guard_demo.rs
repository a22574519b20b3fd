//! # Guard Demo
//!
//! Demonstrates wiring `ProtectionEngine`/`Guard` in front of a user
//! function: a clean batch of customer records sails through, a
//! corrupted batch gets blocked, and both decisions land in the audit
//! log.

use adri::config::ConfigurationLoader;
use adri::protection::{Guard, ProtectOptions, ProtectionEngine};
use adri::value::{Cell, Column, Dataset};

fn process_customers(data: &Dataset) -> usize {
    data.row_count()
}

fn clean_customers() -> Dataset {
    Dataset::new(vec![
        Column::new(
            "email",
            vec![
                Cell::Text("alice@example.com".into()),
                Cell::Text("bob@example.com".into()),
                Cell::Text("carol@example.com".into()),
            ],
        ),
        Column::new("age", vec![Cell::Integer(28), Cell::Integer(41), Cell::Integer(35)]),
    ])
}

fn corrupted_customers() -> Dataset {
    Dataset::new(vec![
        Column::new(
            "email",
            vec![
                Cell::Text("not-an-email".into()),
                Cell::Null,
                Cell::Text("????".into()),
            ],
        ),
        Column::new("age", vec![Cell::Integer(-12), Cell::Integer(9001), Cell::Null]),
    ])
}

fn main() -> adri::Result<()> {
    tracing_subscriber::fmt::init();

    let tmp = tempfile::tempdir().expect("create scratch dir for the demo's standards/audit output");
    let mut config = ConfigurationLoader::create_default_config("guard-demo");
    config.paths.contracts = tmp.path().join("contracts");
    config.paths.assessments = tmp.path().join("assessments");
    config.paths.training_data = tmp.path().join("training-data");
    config.paths.audit_logs = tmp.path().join("audit-logs");

    let engine = ProtectionEngine::new(config)?;
    let guard = Guard::new(&engine, "process_customers").with_options(
        ProtectOptions::new().with_min_score(80.0).with_auto_generate(true),
    );

    let clean_rows = guard.call(&clean_customers(), process_customers)?;
    println!("clean batch allowed through: {clean_rows} rows processed");

    let strict = Guard::new(&engine, "process_customers").with_options(
        ProtectOptions::new()
            .with_min_score(80.0)
            .with_on_failure(adri::config::FailureMode::Raise),
    );
    match strict.call(&corrupted_customers(), process_customers) {
        Ok(rows) => println!("unexpectedly allowed {rows} rows"),
        Err(e) => println!("corrupted batch blocked as expected: {e}"),
    }

    Ok(())
}
