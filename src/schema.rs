//! Schema objects discovered from the database.
//!
//! Defines [`TableName`] (a qualified table identifier), [`Constraint`] (a
//! foreign-key constraint owned by a table) and [`Relationship`] (a directed
//! edge from a child table to the parent table it references).

use serde::{Deserialize, Serialize};

/// A fully-qualified table identifier.
///
/// Two identifiers are equal when both the schema and the name match. The
/// [`Display`](std::fmt::Display) form is the ANSI-quoted qualified name;
/// adapters render their own quoting from [`schema`](Self::schema) and
/// [`name`](Self::name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableName {
    /// Owning schema (or attached database for SQLite). `None` when the
    /// database has no notion of schema.
    pub schema: Option<String>,
    /// Unqualified table name, unquoted.
    pub name: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// A table name without a schema qualifier.
    pub fn unqualified(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// Render the qualified name with the given quote pair, doubling any
    /// embedded closing quote.
    pub fn quoted_with(&self, open: char, close: char) -> String {
        let quote = |part: &str| {
            let escaped = part.replace(close, &format!("{close}{close}"));
            format!("{open}{escaped}{close}")
        };
        match &self.schema {
            Some(schema) => format!("{}.{}", quote(schema), quote(&self.name)),
            None => quote(&self.name),
        }
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.quoted_with('"', '"'))
    }
}

/// A foreign-key constraint, identified by its name and owning (child) table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    /// Constraint name as reported by the database.
    pub name: String,
    /// The table that declares the foreign key.
    pub table: TableName,
}

/// One foreign key, as a directed edge from the child table to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// The referenced (parent) table.
    pub primary_key_table: TableName,
    /// The referencing (child) table.
    pub foreign_key_table: TableName,
    /// The constraint that enforces this edge.
    pub constraint: Constraint,
}

impl Relationship {
    /// Build a relationship whose constraint is owned by the child table.
    pub fn new(
        primary_key_table: TableName,
        foreign_key_table: TableName,
        constraint_name: impl Into<String>,
    ) -> Self {
        let constraint = Constraint {
            name: constraint_name.into(),
            table: foreign_key_table.clone(),
        };
        Self {
            primary_key_table,
            foreign_key_table,
            constraint,
        }
    }

    /// A table referencing itself never forces an order between tables.
    pub fn is_self_referencing(&self) -> bool {
        self.primary_key_table == self.foreign_key_table
    }
}
