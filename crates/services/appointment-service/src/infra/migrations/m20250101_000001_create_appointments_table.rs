//! Migration: create the appointments table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Appointments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Appointments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Appointments::CustomerId).big_integer().not_null())
                    .col(ColumnDef::new(Appointments::PetId).big_integer().not_null())
                    .col(ColumnDef::new(Appointments::ServiceIds).json_binary().not_null())
                    .col(ColumnDef::new(Appointments::ScheduledDate).date().not_null())
                    .col(ColumnDef::new(Appointments::ScheduledTime).time().not_null())
                    .col(ColumnDef::new(Appointments::Status).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Appointments::AttendanceMethod)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Appointments::PetSize).string_len(10).null())
                    .col(ColumnDef::new(Appointments::Total).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(Appointments::Notes).text().null())
                    .col(
                        ColumnDef::new(Appointments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Appointments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_appointments_customer_id")
                    .table(Appointments::Table)
                    .col(Appointments::CustomerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_appointments_scheduled_date")
                    .table(Appointments::Table)
                    .col(Appointments::ScheduledDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Appointments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Appointments {
    Table,
    Id,
    CustomerId,
    PetId,
    ServiceIds,
    ScheduledDate,
    ScheduledTime,
    Status,
    AttendanceMethod,
    PetSize,
    Total,
    Notes,
    CreatedAt,
    UpdatedAt,
}
