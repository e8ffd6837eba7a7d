use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(Deadlines::Table)
            .if_not_exists()
            .col(pk_auto(Deadlines::Id))
            .col(string_uniq(Deadlines::MonthYear))
            .col(date(Deadlines::VolunteerStart))
            .col(date(Deadlines::VolunteerEnd))
            .col(date(Deadlines::DropoffStart))
            .col(date(Deadlines::DropoffEnd))
            .col(date_null(Deadlines::TeacherStart))
            .col(date(Deadlines::TeacherEnd))
            .check(Expr::col(Deadlines::DropoffEnd).gte(Expr::col(Deadlines::DropoffStart)))
            .to_owned();
        manager.create_table(table).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Deadlines::Table).to_owned())
            .await?;

        Ok(())
    }
}
