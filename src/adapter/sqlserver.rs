//! SQL Server adapter.

use super::{filter_clauses, DbAdapter};
use crate::config::ResetOptions;
use crate::planner::DeletionPlan;
use crate::schema::TableName;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServer;

fn bracket(table: &TableName) -> String {
    table.quoted_with('[', ']')
}

fn bracket_ident(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

impl DbAdapter for SqlServer {
    fn name(&self) -> &'static str {
        "sql_server"
    }

    fn build_table_query(&self, options: &ResetOptions) -> String {
        format!(
            "SELECT s.name, t.name \
             FROM sys.tables t \
             INNER JOIN sys.schemas s ON t.schema_id = s.schema_id \
             WHERE t.is_ms_shipped = 0{} \
             ORDER BY s.name, t.name",
            filter_clauses(options, "s.name", "t.name")
        )
    }

    fn build_relationship_query(&self, options: &ResetOptions) -> String {
        format!(
            "SELECT ps.name, pt.name, fs.name, ft.name, fk.name \
             FROM sys.foreign_keys fk \
             INNER JOIN sys.tables ft ON fk.parent_object_id = ft.object_id \
             INNER JOIN sys.schemas fs ON ft.schema_id = fs.schema_id \
             INNER JOIN sys.tables pt ON fk.referenced_object_id = pt.object_id \
             INNER JOIN sys.schemas ps ON pt.schema_id = ps.schema_id \
             WHERE 1 = 1{}{} \
             ORDER BY fs.name, ft.name, fk.name",
            filter_clauses(options, "fs.name", "ft.name"),
            filter_clauses(options, "ps.name", "pt.name")
        )
    }

    fn build_delete_script(&self, plan: &DeletionPlan) -> String {
        let mut script = String::new();
        for fk in &plan.foreign_keys_to_disable {
            script.push_str(&format!(
                "ALTER TABLE {} NOCHECK CONSTRAINT {};\n",
                bracket(&fk.table),
                bracket_ident(&fk.name)
            ));
        }
        for table in plan.tables_to_delete() {
            script.push_str(&format!("DELETE FROM {};\n", bracket(table)));
        }
        for fk in &plan.foreign_keys_to_disable {
            script.push_str(&format!(
                "ALTER TABLE {} WITH CHECK CHECK CONSTRAINT {};\n",
                bracket(&fk.table),
                bracket_ident(&fk.name)
            ));
        }
        script
    }
}
