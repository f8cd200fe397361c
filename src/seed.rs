use tracing::info;

use crate::catalog::{CatalogError, RuleCatalog, UpsertOutcome};
use crate::{SyntaxRule, WarnLevel};

/// Counts from one [`seed`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub ignored: usize,
}

impl SeedReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.inserted + self.ignored
    }
}

fn rule(group: &str, name: &str, expr: &str, item_type: &str, item: &str, desc: &str) -> SyntaxRule {
    SyntaxRule::new(group, name, expr)
        .with_raw_item(item_type, item)
        .with_desc(desc)
}

/// The eleven rules shipped with the linting service.
///
/// Items are kept exactly as the service wrote them, including line breaks,
/// the legacy `arry` tag and a repeated entry in `BanCommandRule`.
#[must_use]
pub fn default_rules() -> Vec<SyntaxRule> {
    vec![
        rule(
            "CommandRule",
            "HighRiskCommandRule",
            "Val in Item",
            "arry",
            "[\"drop_table\", \"drop_index\", \"lock_tables\", \"drop_db\", \"analyze\",\"rename_table\", \n\t\t\t\"drop_procedure\", \"drop_view\",\"drop_trigger\",\"drop_function\", \"drop_server\", \n\t\t\t\"drop_event\", \"drop_compression_dictionary\",\"optimize\", \"alter_tablespace\"]",
            "high-risk command",
        ),
        rule(
            "CommandRule",
            "BanCommandRule",
            "Val in Item",
            "arry",
            "[\"truncate\", \"revoke\", \"kill\", \"reset\", \"drop_user\", \"grant\",\n\t\t\t\t\t\"create_user\", \"revoke_all\", \"shutdown\", \"lock_tables_for_backup\",\n\t\t\t\t\t\"reset\", \"purge\", \"lock_binlog_for_backup\",\"lock_tables_for_backup\",\n\t\t\t\t\t\"install_plugin\", \"uninstall_plugin\",\"alter_user\"]",
            "banned command",
        )
        .with_warn_level(WarnLevel::Blocking),
        rule(
            "CreateTableRule",
            "SuggestBlobColumCount",
            "Val >= Item ",
            "int",
            "10",
            "too many blob columns in one table",
        ),
        rule(
            "CreateTableRule",
            "SuggestEngine",
            "not (Val contains Item) and ( len(Val) != 0 )",
            "string",
            "\"innodb\"",
            "use the InnoDB storage engine",
        ),
        rule(
            "CreateTableRule",
            "NeedPrimaryKey",
            "Val == Item",
            "int",
            "1",
            "table should have a primary key",
        ),
        rule(
            "CreateTableRule",
            "DefinerRule",
            "Val not in Item ",
            "arry",
            "[\"ADMIN@localhost\"]",
            "definer must be specified",
        ),
        rule(
            "AlterTableRule",
            "HighRiskType",
            "Val in Item",
            "arry",
            "[\"drop_column\"]",
            "high-risk alter type",
        ),
        rule(
            "AlterTableRule",
            "HighRiskPkAlterType",
            "Val in Item",
            "arry",
            "[\"add_column\", \"add_key\", \"change_column\"]",
            "high-risk alter type on primary key",
        ),
        rule(
            "AlterTableRule",
            "AlterUseAfter",
            "Val != Item",
            "string",
            "\"\"",
            "alter table uses AFTER",
        ),
        rule(
            "AlterTableRule",
            "AddColumnMixed",
            "( Item in Val ) && ( len(Val) > 1 )",
            "string",
            "\"add_column\"",
            "add column mixed with other alter types may not run online",
        ),
        rule(
            "DmlRule",
            "DmlNotHasWhere",
            " Val != Item ",
            "bool",
            "true",
            "no WHERE or LIMIT; the whole table may change",
        ),
    ]
}

/// Install [`default_rules`] into `catalog`. Rules already present are left
/// as they are, so calling this again is harmless.
///
/// # Errors
///
/// Stops at the first rule the catalog refuses and returns its error.
pub fn seed<C: RuleCatalog + ?Sized>(catalog: &mut C) -> Result<SeedReport, CatalogError> {
    let mut report = SeedReport::default();
    for rule in default_rules() {
        match catalog.upsert_rule_if_absent(rule)? {
            UpsertOutcome::Inserted => report.inserted += 1,
            UpsertOutcome::DuplicateIgnored => report.ignored += 1,
        }
    }
    info!(
        inserted = report.inserted,
        ignored = report.ignored,
        "seeded syntax rules"
    );
    Ok(report)
}
