use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Service: index on user_id (ownership checks, per-user breakdowns)
        manager
            .create_index(
                Index::create()
                    .name("idx_service_user")
                    .table(Service::Table)
                    .col(Service::UserId)
                    .to_owned(),
            )
            .await?;

        // Service: board columns filter by status, en-route ordering reads
        // (status, route_order)
        manager
            .create_index(
                Index::create()
                    .name("idx_service_status")
                    .table(Service::Table)
                    .col(Service::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_service_status_order")
                    .table(Service::Table)
                    .col(Service::Status)
                    .col(Service::RouteOrder)
                    .to_owned(),
            )
            .await?;

        // Service: window queries scan milestone timestamps
        manager
            .create_index(
                Index::create()
                    .name("idx_service_created_at")
                    .table(Service::Table)
                    .col(Service::CreatedAt)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_service_finished_at")
                    .table(Service::Table)
                    .col(Service::FinishedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_service_user").table(Service::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_service_status").table(Service::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop().name("idx_service_status_order").table(Service::Table).to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop().name("idx_service_created_at").table(Service::Table).to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop().name("idx_service_finished_at").table(Service::Table).to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Service { Table, UserId, Status, RouteOrder, CreatedAt, FinishedAt }
