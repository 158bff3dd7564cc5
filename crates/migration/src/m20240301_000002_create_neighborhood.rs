//! Create `neighborhood` table: named areas and their flat delivery fee.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Neighborhood::Table)
                    .if_not_exists()
                    .col(uuid(Neighborhood::Id).primary_key())
                    .col(string_len(Neighborhood::Name, 128).unique_key().not_null())
                    .col(double(Neighborhood::Fee).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Neighborhood::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Neighborhood { Table, Id, Name, Fee }
