//! Create `service` table with FK to `user`.
//!
//! `neighborhood` is a soft name reference into the fee directory; it is
//! validated at write time but not enforced by key, so historical rows keep
//! whatever name was current when they were written.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Service::Table)
                    .if_not_exists()
                    .col(uuid(Service::Id).primary_key())
                    .col(string_len(Service::Neighborhood, 128).not_null())
                    .col(string_len(Service::Kind, 32).not_null())
                    .col(string_len(Service::Document, 128).not_null())
                    .col(string_len(Service::Provider, 32).not_null())
                    .col(boolean(Service::FeeApplied).not_null())
                    .col(boolean(Service::CardMachine).not_null())
                    .col(double(Service::Value).not_null())
                    .col(text(Service::Note).not_null())
                    .col(timestamp_with_time_zone(Service::CreatedAt).not_null())
                    .col(string_len(Service::Status, 32).not_null())
                    // Milestone timestamps and the route slot only exist for a
                    // subset of the lifecycle; keep them explicitly nullable.
                    .col(ColumnDef::new(Service::EnRouteAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Service::FinishedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Service::CancelledAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Service::RouteOrder).integer().null())
                    .col(ColumnDef::new(Service::PostalCode).string_len(16).null())
                    .col(ColumnDef::new(Service::Street).string_len(255).null())
                    .col(ColumnDef::new(Service::HouseNumber).integer().null())
                    .col(ColumnDef::new(Service::District).string_len(128).null())
                    .col(ColumnDef::new(Service::City).string_len(128).null())
                    .col(ColumnDef::new(Service::State).string_len(64).null())
                    .col(ColumnDef::new(Service::Complement).string_len(255).null())
                    .col(uuid(Service::UserId).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_user")
                            .from(Service::Table, Service::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Service::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Service {
    Table,
    Id,
    Neighborhood,
    Kind,
    Document,
    Provider,
    FeeApplied,
    CardMachine,
    Value,
    Note,
    CreatedAt,
    Status,
    EnRouteAt,
    FinishedAt,
    CancelledAt,
    RouteOrder,
    PostalCode,
    Street,
    HouseNumber,
    District,
    City,
    State,
    Complement,
    UserId,
}

#[derive(DeriveIden)]
enum User { Table, Id }
