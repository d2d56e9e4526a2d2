//! Error types for planning and resetting.

use crate::schema::TableName;

/// Boxed driver error, as returned by a [`Database`](crate::db::Database).
pub type DatabaseError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to produce a deletion plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Only raised under [`CyclePolicy::Reject`](crate::planner::CyclePolicy::Reject).
    #[error(
        "there is a dependency involving the tables ({}) and a safe deletion order cannot be built; \
         check for circular references, and if you ignore tables also ignore the tables they reference",
        join_tables(.tables)
    )]
    CircularDependency { tables: Vec<TableName> },
}

/// Failure of a reset (or of compiling the reset script).
#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("metadata query failed: {0}")]
    Metadata(#[source] DatabaseError),

    #[error("malformed metadata row: {0}")]
    MalformedMetadata(String),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("delete script failed: {0}")]
    Execution(#[source] DatabaseError),

    #[error("reset task failed: {0}")]
    Task(String),
}

fn join_tables(tables: &[TableName]) -> String {
    tables
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_dependency_names_tables() {
        let err = PlanError::CircularDependency {
            tables: vec![TableName::unqualified("a"), TableName::new("s", "b")],
        };
        let msg = err.to_string();
        assert!(msg.contains(r#""a","s"."b""#), "{msg}");
        assert!(msg.contains("circular references"));
    }

    #[test]
    fn plan_error_is_transparent_in_reset_error() {
        let err: ResetError = PlanError::CircularDependency {
            tables: vec![TableName::unqualified("a")],
        }
        .into();
        assert!(err.to_string().starts_with("there is a dependency"));
    }
}
