//! Infrastructure layer - database migrations.

pub mod migrations;

pub use migrations::Migrator;

/// Database handle of this service.
pub type Database = common::db::Database<Migrator>;
