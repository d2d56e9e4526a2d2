//! SQLite adapter.
//!
//! Schemas are attached databases (`main`, `temp`, ...). SQLite cannot disable
//! a single foreign key inside a transaction, so a plan with constraints to
//! disable defers all foreign-key checks to commit instead. Foreign keys are
//! unnamed in SQLite; constraint names are synthesized as `fk_<table>_<id>`.

use super::{filter_clauses, DbAdapter};
use crate::config::ResetOptions;
use crate::planner::DeletionPlan;

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

const INTERNAL_TABLES: &str = r"NOT LIKE 'sqlite\_%' ESCAPE '\'";

impl DbAdapter for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn build_table_query(&self, options: &ResetOptions) -> String {
        format!(
            "SELECT t.\"schema\", t.name \
             FROM pragma_table_list AS t \
             WHERE t.type = 'table' AND t.name {INTERNAL_TABLES}{} \
             ORDER BY t.\"schema\", t.name",
            filter_clauses(options, "t.\"schema\"", "t.name")
        )
    }

    fn build_relationship_query(&self, options: &ResetOptions) -> String {
        format!(
            "SELECT p.\"schema\", p.name, t.\"schema\", t.name, 'fk_' || t.name || '_' || fk.id \
             FROM pragma_table_list AS t \
             JOIN pragma_foreign_key_list(t.name, t.\"schema\") AS fk \
             JOIN pragma_table_list AS p \
               ON p.\"schema\" = t.\"schema\" AND p.name = fk.\"table\" COLLATE NOCASE \
             WHERE t.type = 'table' AND p.type = 'table' AND fk.seq = 0 \
               AND t.name {INTERNAL_TABLES}{}{} \
             ORDER BY t.\"schema\", t.name, fk.id",
            filter_clauses(options, "t.\"schema\"", "t.name"),
            filter_clauses(options, "p.\"schema\"", "p.name")
        )
    }

    fn build_delete_script(&self, plan: &DeletionPlan) -> String {
        let mut script = String::new();
        if !plan.foreign_keys_to_disable.is_empty() {
            script.push_str("PRAGMA defer_foreign_keys = ON;\n");
        }
        for table in plan.tables_to_delete() {
            script.push_str(&format!("DELETE FROM {table};\n"));
        }
        script
    }
}
