//! Lint a few analyzed statements against the seeded catalog.
//!
//! Run with `RUST_LOG=sqlrule=debug cargo run --example lint_statement`
//! to see cache misses and skipped rules. Pass a JSON catalog path to use it
//! instead of the built-in rules.

use sqlrule::{
    seed, MemoryCatalog, RuleCatalog, RuleRunner, SqlRuleError, StatementValues, TypedValue,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), SqlRuleError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut catalog = match std::env::args().nth(1) {
        Some(path) => MemoryCatalog::from_file(path)?,
        None => MemoryCatalog::new(),
    };
    let seeded = seed(&mut catalog)?;
    tracing::info!(%catalog, inserted = seeded.inserted, "catalog ready");

    let runner = RuleRunner::new();

    let statements = [
        (
            "CommandRule",
            "TRUNCATE TABLE t_orders",
            StatementValues::new()
                .set("HighRiskCommandRule", "truncate")
                .set("BanCommandRule", "truncate"),
        ),
        (
            "CreateTableRule",
            "CREATE TABLE t (a BLOB, ...) ENGINE=MyISAM",
            StatementValues::new()
                .set("SuggestBlobColumCount", 12_i64)
                .set("SuggestEngine", "myisam")
                .set("NeedPrimaryKey", 0_i64)
                .set("DefinerRule", "ADMIN@localhost"),
        ),
        (
            "AlterTableRule",
            "ALTER TABLE t ADD COLUMN c INT, DROP INDEX idx_b",
            StatementValues::new()
                .set("HighRiskType", "add_column")
                .set("HighRiskPkAlterType", "add_column")
                .set("AlterUseAfter", "")
                .set("AddColumnMixed", vec!["add_column", "drop_index"]),
        ),
        (
            "DmlRule",
            "DELETE FROM t_orders",
            StatementValues::new().set("DmlNotHasWhere", false),
        ),
    ];

    for (group, sql, values) in &statements {
        let report = runner.run_group(&catalog, group, values)?;
        println!("{sql}");
        println!("  {report}");
        for outcome in report.violations() {
            println!("  - [{}] {}: {}", outcome.warn_level(), outcome.rule_name(), outcome.desc());
        }
        for failure in report.failures() {
            println!("  ! {failure}");
        }
        if report.is_blocked() {
            println!("  => blocked");
        }
    }

    let outcome = runner.check_rule(&catalog, "DmlRule", "DmlNotHasWhere", &TypedValue::Bool(true))?;
    println!("DELETE ... WHERE id = 1 -> {outcome}");
    println!("rules: {}, compiled: {}", catalog.all_rules()?.len(), runner.cached_len());
    Ok(())
}
