//! Dialect adapters.
//!
//! Provides the [`DbAdapter`] trait and one implementation per supported
//! engine. An adapter owns everything dialect-specific: the metadata queries
//! that enumerate tables and foreign keys, identifier quoting, and the shape of
//! the final delete script. The planner never sees any of it. Adapters are
//! created via [`create_adapter`] from an [`AdapterKind`].

pub mod postgres;
pub mod sqlite;
pub mod sqlserver;

use serde::{Deserialize, Serialize};

use crate::config::ResetOptions;
use crate::planner::DeletionPlan;

/// SQL synthesis for one database engine.
///
/// The table query must return rows of `(schema, name)` where `schema` may be
/// NULL. The relationship query must return rows of
/// `(parent_schema, parent_table, child_schema, child_table, constraint_name)`
/// and only cover foreign keys whose both ends are returned by the table query.
pub trait DbAdapter: Send + Sync {
    /// Short engine name, used in logs.
    fn name(&self) -> &'static str;

    /// Query enumerating the tables to empty.
    fn build_table_query(&self, options: &ResetOptions) -> String;

    /// Query enumerating the foreign keys between those tables.
    fn build_relationship_query(&self, options: &ResetOptions) -> String;

    /// Script that disables `plan.foreign_keys_to_disable`, empties every
    /// planned table in order, and restores constraints if the engine needs it.
    fn build_delete_script(&self, plan: &DeletionPlan) -> String;
}

/// Selects a built-in adapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    #[default]
    Sqlite,
    Postgres,
    SqlServer,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::SqlServer => "sql_server",
        }
    }
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdapterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sql_server" | "sqlserver" | "mssql" => Ok(Self::SqlServer),
            _ => Err(format!("unknown database adapter: {s}")),
        }
    }
}

/// Create the adapter for `kind`.
pub fn create_adapter(kind: AdapterKind) -> Box<dyn DbAdapter> {
    match kind {
        AdapterKind::Sqlite => Box::new(sqlite::Sqlite),
        AdapterKind::Postgres => Box::new(postgres::Postgres),
        AdapterKind::SqlServer => Box::new(sqlserver::SqlServer),
    }
}

/// Quote a value as a SQL string literal.
pub(crate) fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn literal_list<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    values
        .into_iter()
        .map(sql_literal)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Split an ignore entry into an optional schema and a table name.
///
/// Only a dot outside double quotes separates the two, so `"a.b"` is a bare
/// table named `a.b` and `app."a.b"` is that table in `app`. Surrounding quotes
/// are stripped and doubled quotes inside them unescaped.
fn parse_ignore_entry(entry: &str) -> (Option<String>, String) {
    let mut in_quotes = false;
    let mut split_at = None;
    for (i, c) in entry.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => {
                split_at = Some(i);
                break;
            }
            _ => {}
        }
    }
    match split_at {
        Some(i) => (Some(unquote(&entry[..i])), unquote(&entry[i + 1..])),
        None => (None, unquote(entry)),
    }
}

fn unquote(part: &str) -> String {
    match part.strip_prefix('"').and_then(|p| p.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => part.to_string(),
    }
}

/// `AND ...` clauses restricting a `(schema, name)` column pair by the ignore
/// list and schema filters. Empty when nothing is configured.
///
/// Ignore entries are either a bare table name (any schema) or `schema.name`;
/// see [`parse_ignore_entry`] for quoting.
pub(crate) fn filter_clauses(options: &ResetOptions, schema_col: &str, name_col: &str) -> String {
    let mut clauses = String::new();

    let mut bare = Vec::new();
    let mut qualified = Vec::new();
    for entry in &options.tables_to_ignore {
        match parse_ignore_entry(entry) {
            (Some(schema), name) => qualified.push((schema, name)),
            (None, name) => bare.push(name),
        }
    }

    if !bare.is_empty() {
        clauses.push_str(&format!(
            " AND {name_col} NOT IN ({})",
            literal_list(bare.iter().map(String::as_str))
        ));
    }
    for (schema, name) in &qualified {
        clauses.push_str(&format!(
            " AND NOT ({schema_col} = {} AND {name_col} = {})",
            sql_literal(schema),
            sql_literal(name)
        ));
    }

    if !options.schemas_to_include.is_empty() {
        clauses.push_str(&format!(
            " AND {schema_col} IN ({})",
            literal_list(options.schemas_to_include.iter().map(String::as_str))
        ));
    }
    if !options.schemas_to_exclude.is_empty() {
        clauses.push_str(&format!(
            " AND {schema_col} NOT IN ({})",
            literal_list(options.schemas_to_exclude.iter().map(String::as_str))
        ));
    }

    clauses
}
