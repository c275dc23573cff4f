//! Infrastructure layer - database migrations.

pub mod migrations;

pub use migrations::Migrator;

pub type Database = common::db::Database<Migrator>;
