//! Database connection and migration management shared by the services.

use std::collections::HashSet;
use std::marker::PhantomData;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection, DbErr,
    EntityTrait, QueryOrder, Statement,
};
use sea_orm_migration::{seaql_migrations, MigrationName, MigratorTrait};
use tracing::info;

use crate::config::DatabaseConfig;

/// Connection pool of one service, tied to that service's migrator.
pub struct Database<M> {
    connection: DatabaseConnection,
    _migrator: PhantomData<fn() -> M>,
}

impl<M> Clone for Database<M> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
            _migrator: PhantomData,
        }
    }
}

impl<M: MigratorTrait> Database<M> {
    /// Connect and apply pending migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbErr> {
        let db = Self::connect_without_migrations(config).await?;
        db.run_migrations().await?;
        info!("Database connected and migrations applied");
        Ok(db)
    }

    /// Connect without running migrations (for CLI commands).
    pub async fn connect_without_migrations(config: &DatabaseConfig) -> Result<Self, DbErr> {
        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .sqlx_logging(false);

        let connection = SeaDatabase::connect(options).await?;
        Ok(Self {
            connection,
            _migrator: PhantomData,
        })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    pub fn get_connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    pub async fn run_migrations(&self) -> Result<(), DbErr> {
        M::up(&self.connection, None).await
    }

    /// Roll back the last migration.
    pub async fn rollback_migration(&self) -> Result<(), DbErr> {
        M::down(&self.connection, Some(1)).await
    }

    /// Every defined migration with its applied flag.
    pub async fn migration_status(&self) -> Result<Vec<(String, bool)>, DbErr> {
        let applied: HashSet<String> = seaql_migrations::Entity::find()
            .order_by_asc(seaql_migrations::Column::Version)
            .all(&self.connection)
            .await?
            .into_iter()
            .map(|m| m.version)
            .collect();

        Ok(M::migrations()
            .iter()
            .map(|m| {
                let name = m.name().to_string();
                let is_applied = applied.contains(&name);
                (name, is_applied)
            })
            .collect())
    }

    /// Drop everything and reapply all migrations.
    pub async fn fresh_migrations(&self) -> Result<(), DbErr> {
        M::fresh(&self.connection).await
    }

    /// Check connectivity with a trivial query.
    pub async fn ping(&self) -> Result<(), DbErr> {
        self.connection
            .execute(Statement::from_string(
                self.connection.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }
}

/// Migration command shared by the service binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::Subcommand))]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Roll back the last applied migration
    Down,
    /// List migrations and whether they are applied
    Status,
    /// Drop every table and migrate from scratch
    Fresh,
}

/// Run a migration command against the given database.
pub async fn run_migration_action<M: MigratorTrait>(
    config: &DatabaseConfig,
    action: MigrateAction,
) -> Result<(), DbErr> {
    let db = Database::<M>::connect_without_migrations(config).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            for (name, applied) in db.migration_status().await? {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}
