//! Initial schema.
//!
//! - `accounts`: named buckets movements are recorded against
//! - `account_aliases`: aliases registered for an account
//! - `events`: append-only movement facts
//! - `event_deltas`: signed quantity per unit of an event

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Name,
    NameNorm,
    CreatedAt,
}

#[derive(Iden)]
enum AccountAliases {
    Table,
    Alias,
    AccountId,
    CreatedAt,
}

#[derive(Iden)]
enum Events {
    Table,
    Id,
    AccountId,
    Flow,
    CreatedAt,
}

#[derive(Iden)]
enum EventDeltas {
    Table,
    Id,
    EventId,
    UnitId,
    Delta,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::NameNorm).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-name_norm")
                    .table(Accounts::Table)
                    .col(Accounts::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AccountAliases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountAliases::Alias)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AccountAliases::AccountId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountAliases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-account_aliases-account_id")
                            .from(AccountAliases::Table, AccountAliases::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-account_aliases-account_id")
                    .table(AccountAliases::Table)
                    .col(AccountAliases::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Events::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Events::AccountId).integer().not_null())
                    .col(ColumnDef::new(Events::Flow).string().not_null())
                    .col(
                        ColumnDef::new(Events::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-events-account_id")
                            .from(Events::Table, Events::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-events-account_id")
                    .table(Events::Table)
                    .col(Events::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventDeltas::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventDeltas::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EventDeltas::EventId).integer().not_null())
                    .col(ColumnDef::new(EventDeltas::UnitId).string().not_null())
                    .col(ColumnDef::new(EventDeltas::Delta).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-event_deltas-event_id")
                            .from(EventDeltas::Table, EventDeltas::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per unit and event.
        manager
            .create_index(
                Index::create()
                    .name("idx-event_deltas-event_id-unit_id")
                    .table(EventDeltas::Table)
                    .col(EventDeltas::EventId)
                    .col(EventDeltas::UnitId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventDeltas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccountAliases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
