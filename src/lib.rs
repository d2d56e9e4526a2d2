//! Empty a relational database between test runs, keeping its schema.
//!
//! Tabula discovers the tables and foreign keys of a database, plans an order
//! in which the tables can be emptied without violating a foreign key, and
//! runs the resulting delete script in one transaction. The plan is computed
//! once per [`Resetter`](reset::Resetter) and cached, so repeated resets cost a
//! single round trip.
//!
//! ```no_run
//! use tabula::config::ResetOptions;
//! use tabula::reset::Resetter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut conn = rusqlite::Connection::open("fixtures.db")?;
//! let resetter = Resetter::new(ResetOptions {
//!     tables_to_ignore: vec!["schema_migrations".into()],
//!     ..ResetOptions::default()
//! });
//! resetter.reset(&mut conn)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Cycles
//!
//! When foreign keys form a cycle no table can go first. By default the
//! constraints of the cycle are disabled (or deferred, depending on the
//! engine) and the tables are emptied together;
//! [`CyclePolicy::Reject`](planner::CyclePolicy::Reject) fails instead.
//!
//! # Modules
//!
//! - [`schema`] - Table, constraint, and relationship identifiers
//! - [`planner`] - Dependency-aware deletion planning
//! - [`adapter`] - Per-engine metadata queries and delete scripts
//! - [`db`] - The driver contract, implemented for `rusqlite`
//! - [`reset`] - The caching reset orchestrator
//! - [`config`] - Configuration loading from TOML files and environment variables

pub mod adapter;
pub mod config;
pub mod db;
pub mod error;
pub mod planner;
pub mod reset;
pub mod schema;

pub use error::{PlanError, ResetError};
pub use planner::{plan, CyclePolicy, DeletionPlan};
pub use reset::Resetter;
