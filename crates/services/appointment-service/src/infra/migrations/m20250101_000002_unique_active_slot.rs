//! Migration: at most one non-cancelled appointment per (date, time).
//!
//! Partial indexes are not expressible through the schema builder, so this
//! one is raw SQL.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_appointments_active_slot \
                 ON appointments (scheduled_date, scheduled_time) WHERE status <> 'CANCELLED'",
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS uq_appointments_active_slot")
            .await?;
        Ok(())
    }
}
