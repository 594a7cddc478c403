mod helpers;

use helpers::{orders_and_customers, FakeOracle, FakeProvider};
use oraschema::db::QueryOutcome;
use oraschema::error::SchemaError;
use oraschema::schema::teardown::TeardownOptions;
use oraschema::schema::SchemaAdmin;

fn admin(db: FakeOracle) -> SchemaAdmin<FakeProvider> {
    SchemaAdmin::new(FakeProvider::new(db))
}

fn history_row(version: &str, script: &str) -> Vec<Option<String>> {
    vec![
        Some(version.into()),
        Some("init".into()),
        Some("SQL".into()),
        Some(script.into()),
        Some("2025-03-10 08:15:00".into()),
        Some("1".into()),
    ]
}

#[test]
fn teardown_through_admin_returns_its_session() {
    let admin = admin(orders_and_customers());
    let report = admin.teardown(&TeardownOptions::default(), &mut |_| {}).unwrap();

    assert_eq!(report.succeeded(), 3);
    assert_eq!(admin.provider().acquired.get(), 1);
    assert_eq!(admin.provider().outstanding(), 0);
}

#[test]
fn session_is_returned_when_the_catalog_read_fails() {
    let mut db = orders_and_customers();
    db.catalog_down = true;
    let admin = admin(db);

    let err = admin
        .teardown(&TeardownOptions::default(), &mut |_| {})
        .unwrap_err();
    assert!(matches!(err, SchemaError::CatalogRead(_)));
    assert_eq!(admin.provider().acquired.get(), 1);
    assert_eq!(admin.provider().outstanding(), 0);
}

#[test]
fn refused_connection_is_a_connection_error() {
    let mut provider = FakeProvider::new(orders_and_customers());
    provider.refuse = true;
    let admin = SchemaAdmin::new(provider);

    let err = admin.list_inventory().unwrap_err();
    assert!(matches!(err, SchemaError::Connection(_)));
    assert!(err.to_string().contains("ORA-01017"));
    assert_eq!(admin.provider().outstanding(), 0);
}

#[test]
fn list_inventory_is_sorted() {
    let admin = admin(
        FakeOracle::new()
            .with_tables(&["ZONES", "ACCOUNTS"])
            .with_sequences(&["SEQ_B", "SEQ_A"]),
    );
    let inventory = admin.list_inventory().unwrap();

    let tables: Vec<&str> = inventory.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tables, vec!["ACCOUNTS", "ZONES"]);
    let sequences: Vec<&str> = inventory.sequences.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(sequences, vec!["SEQ_A", "SEQ_B"]);
    assert_eq!(inventory.constraints.len(), 2);
    assert_eq!(inventory.foreign_keys().count(), 0);
}

#[test]
fn migration_history_presence_needs_the_exact_name() {
    let lookalike = admin(FakeOracle::new().with_tables(&["FLYWAY_SCHEMA_HISTORY_OLD", "ORDERS"]));
    assert!(!lookalike.is_migration_history_present().unwrap());

    let lowercase = admin(FakeOracle::new().with_tables(&["flyway_schema_history"]));
    assert!(!lowercase.is_migration_history_present().unwrap());

    let real = admin(FakeOracle::new().with_tables(&["FLYWAY_SCHEMA_HISTORY"]));
    assert!(real.is_migration_history_present().unwrap());
}

#[test]
fn migration_history_is_none_without_flyway() {
    let admin = admin(orders_and_customers());
    assert!(admin.migration_history().unwrap().is_none());
    assert_eq!(admin.provider().outstanding(), 0);
}

#[test]
fn migration_history_reads_rows_in_order() {
    let mut db = FakeOracle::new().with_tables(&["FLYWAY_SCHEMA_HISTORY"]);
    db.history = vec![
        history_row("1", "V1__create_tables.sql"),
        history_row("2", "V2__seed.sql"),
    ];
    let admin = admin(db);

    let records = admin.migration_history().unwrap().unwrap();
    let scripts: Vec<&str> = records.iter().map(|r| r.script.as_str()).collect();
    assert_eq!(scripts, vec!["V1__create_tables.sql", "V2__seed.sql"]);
    assert!(records.iter().all(|r| r.success && r.installed_on.is_some()));
    assert_eq!(admin.provider().outstanding(), 0);
}

#[test]
fn check_tables_keeps_the_requested_order() {
    let admin = admin(FakeOracle::new().with_tables(&["USUARIOS", "EMPRESAS"]));
    let names: Vec<String> = ["USUARIOS", "NORMA_AMBIENTAL", "EMPRESAS"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let checks = admin.check_tables(&names).unwrap();
    assert_eq!(
        checks,
        vec![
            ("USUARIOS".to_string(), true),
            ("NORMA_AMBIENTAL".to_string(), false),
            ("EMPRESAS".to_string(), true),
        ]
    );
}

#[test]
fn run_sql_returns_rows_or_a_statement_error() {
    let db = FakeOracle::new().failing(
        "DELETE FROM nowhere",
        oraschema::error::QueryError::new("ORA-00942: table or view does not exist", Some(942)),
    );
    let admin = admin(db);

    match admin.run_sql("SELECT 42 FROM dual").unwrap() {
        QueryOutcome::Rows(rows) => assert_eq!(rows.value(0, "RESULT"), Some("42")),
        other => panic!("expected rows, got {other:?}"),
    }

    let err = admin.run_sql("DELETE FROM nowhere").unwrap_err();
    assert!(matches!(err, SchemaError::Statement(_)));
    assert!(err.query_error().and_then(|e| e.hint()).is_some());
    assert_eq!(admin.provider().outstanding(), 0);
}
