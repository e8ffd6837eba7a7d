use sea_orm_migration::{prelude::*, schema::*};

use crate::iden::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create Volunteers Table
        let table = Table::create()
            .table(Volunteers::Table)
            .if_not_exists()
            .col(pk_auto(Volunteers::Id))
            .col(string_uniq(Volunteers::Name))
            .col(string(Volunteers::Email))
            .col(string(Volunteers::Phone))
            .col(date(Volunteers::DateAdded))
            .to_owned();
        manager.create_table(table).await?;

        // Create Teachers Table
        let table = Table::create()
            .table(Teachers::Table)
            .if_not_exists()
            .col(pk_auto(Teachers::Id))
            .col(string(Teachers::Name))
            .col(string(Teachers::Email))
            .to_owned();
        manager.create_table(table).await?;

        // Create Recipes Table
        let table = Table::create()
            .table(Recipes::Table)
            .if_not_exists()
            .col(pk_auto(Recipes::Id))
            .col(string(Recipes::Name))
            .col(text(Recipes::Ingredients))
            .col(text(Recipes::Instructions))
            .col(integer(Recipes::CreatorId))
            .col(string_null(Recipes::ImageUrl))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_recipe_creator")
                    .from(Recipes::Table, Recipes::CreatorId)
                    .to(Volunteers::Table, Volunteers::Id)
                    .on_delete(ForeignKeyAction::Restrict),
            )
            .to_owned();
        manager.create_table(table).await?;

        // Create Meals Table
        let table = Table::create()
            .table(Meals::Table)
            .if_not_exists()
            .col(pk_auto(Meals::Id))
            .col(date(Meals::Date))
            .col(integer(Meals::VolunteerId))
            .col(integer(Meals::RecipeId))
            .col(integer_null(Meals::TeacherId))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_meal_volunteer")
                    .from(Meals::Table, Meals::VolunteerId)
                    .to(Volunteers::Table, Volunteers::Id)
                    .on_delete(ForeignKeyAction::Restrict),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_meal_recipe")
                    .from(Meals::Table, Meals::RecipeId)
                    .to(Recipes::Table, Recipes::Id)
                    .on_delete(ForeignKeyAction::Restrict),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_meal_teacher")
                    .from(Meals::Table, Meals::TeacherId)
                    .to(Teachers::Table, Teachers::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            )
            .to_owned();
        manager.create_table(table).await?;

        // Create GiftCards Table
        let table = Table::create()
            .table(GiftCards::Table)
            .if_not_exists()
            .col(pk_auto(GiftCards::Id))
            .col(string(GiftCards::Name))
            .col(date(GiftCards::Date))
            .col(integer(GiftCards::VolunteerId))
            .col(integer_null(GiftCards::TeacherId))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_gift_card_volunteer")
                    .from(GiftCards::Table, GiftCards::VolunteerId)
                    .to(Volunteers::Table, Volunteers::Id)
                    .on_delete(ForeignKeyAction::Restrict),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_gift_card_teacher")
                    .from(GiftCards::Table, GiftCards::TeacherId)
                    .to(Teachers::Table, Teachers::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            )
            .to_owned();
        manager.create_table(table).await?;

        // A teacher is identified by the (name, email) pair they claim with
        manager
            .create_index(
                Index::create()
                    .name("idx_teacher_identity")
                    .table(Teachers::Table)
                    .col(Teachers::Name)
                    .col(Teachers::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_meal_date")
                    .table(Meals::Table)
                    .col(Meals::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_gift_card_date")
                    .table(GiftCards::Table)
                    .col(GiftCards::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop all tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(GiftCards::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Meals::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Recipes::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Teachers::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Volunteers::Table).to_owned())
            .await?;

        Ok(())
    }
}
