use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Code tables are append-only; the row with the highest id is the live code
        let table = Table::create()
            .table(VolunteerCodes::Table)
            .if_not_exists()
            .col(pk_auto(VolunteerCodes::Id))
            .col(string(VolunteerCodes::Code))
            .to_owned();
        manager.create_table(table).await?;

        let table = Table::create()
            .table(TeacherCodes::Table)
            .if_not_exists()
            .col(pk_auto(TeacherCodes::Id))
            .col(string(TeacherCodes::Code))
            .to_owned();
        manager.create_table(table).await?;

        let table = Table::create()
            .table(Passwords::Table)
            .if_not_exists()
            .col(pk_auto(Passwords::Id))
            .col(string_uniq(Passwords::Username))
            .col(string(Passwords::Hash))
            .to_owned();
        manager.create_table(table).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Passwords::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(TeacherCodes::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(VolunteerCodes::Table).to_owned())
            .await?;

        Ok(())
    }
}
