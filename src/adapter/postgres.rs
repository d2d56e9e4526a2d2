//! PostgreSQL adapter.
//!
//! Foreign keys are enforced by system triggers on both the referencing and
//! the referenced table. Constraints are suspended by disabling all triggers on
//! every table of the layer they sit in, and re-enabled after the deletes.

use super::{filter_clauses, DbAdapter};
use crate::config::ResetOptions;
use crate::planner::DeletionPlan;
use crate::schema::TableName;

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl DbAdapter for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn build_table_query(&self, options: &ResetOptions) -> String {
        format!(
            "SELECT t.table_schema, t.table_name \
             FROM information_schema.tables t \
             WHERE t.table_type = 'BASE TABLE' \
               AND t.table_schema NOT IN ('pg_catalog', 'information_schema'){} \
             ORDER BY t.table_schema, t.table_name",
            filter_clauses(options, "t.table_schema", "t.table_name")
        )
    }

    fn build_relationship_query(&self, options: &ResetOptions) -> String {
        format!(
            "SELECT pn.nspname::text, pc.relname::text, fn.nspname::text, fc.relname::text, con.conname::text \
             FROM pg_constraint con \
             JOIN pg_class fc ON fc.oid = con.conrelid \
             JOIN pg_namespace fn ON fn.oid = fc.relnamespace \
             JOIN pg_class pc ON pc.oid = con.confrelid \
             JOIN pg_namespace pn ON pn.oid = pc.relnamespace \
             WHERE con.contype = 'f'{}{} \
             ORDER BY fn.nspname, fc.relname, con.conname",
            filter_clauses(options, "fn.nspname", "fc.relname"),
            filter_clauses(options, "pn.nspname", "pc.relname")
        )
    }

    fn build_delete_script(&self, plan: &DeletionPlan) -> String {
        let toggled = trigger_tables(plan);

        let mut script = String::new();
        for table in &toggled {
            script.push_str(&format!("ALTER TABLE {table} DISABLE TRIGGER ALL;\n"));
        }
        for table in plan.tables_to_delete() {
            script.push_str(&format!("DELETE FROM {table};\n"));
        }
        for table in &toggled {
            script.push_str(&format!("ALTER TABLE {table} ENABLE TRIGGER ALL;\n"));
        }
        script
    }
}

/// Tables whose triggers are switched off around the deletes.
///
/// A foreign key is enforced by triggers on both the child and the parent
/// table, so disabling only the owning table is not enough. Every table in a
/// layer that holds the owner of a disabled constraint is toggled; both ends of
/// a disabled constraint always share that layer.
fn trigger_tables(plan: &DeletionPlan) -> Vec<&TableName> {
    let mut tables: Vec<&TableName> = Vec::new();
    for layer in &plan.layers {
        let owns_disabled = plan
            .foreign_keys_to_disable
            .iter()
            .any(|constraint| layer.contains(&constraint.table));
        if !owns_disabled {
            continue;
        }
        for table in layer {
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
    }
    tables
}
