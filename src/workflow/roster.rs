//! Volunteers, recipes and the participation rankings built from them.

use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::entities::{gift_card, meal, prelude::*, recipe, volunteer};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct NewVolunteer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct RecipeFields {
    pub name: String,
    pub ingredients: String,
    pub instructions: String,
}

impl RecipeFields {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty()
            || self.ingredients.trim().is_empty()
            || self.instructions.trim().is_empty()
        {
            return Err(AppError::Validation(
                "Recipe name, ingredients and instructions are required".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: i32,
    pub name: String,
    pub creator_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: recipe::Model,
    pub creator_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolunteerRanking {
    pub id: i32,
    pub name: String,
    pub reward_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeRanking {
    pub id: i32,
    pub name: String,
    pub creator_name: String,
    pub meal_count: i64,
}

pub async fn volunteer_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<volunteer::Model, AppError> {
    Volunteer::find()
        .filter(volunteer::Column::Name.eq(name))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Volunteer {name:?}")))
}

pub async fn recipe_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<recipe::Model, AppError> {
    Recipe::find()
        .filter(recipe::Column::Name.eq(name))
        .order_by_asc(recipe::Column::Id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {name:?}")))
}

pub async fn list_volunteers<C: ConnectionTrait>(db: &C) -> Result<Vec<volunteer::Model>, DbErr> {
    Volunteer::find()
        .order_by_asc(volunteer::Column::Name)
        .all(db)
        .await
}

pub async fn add_volunteer<C: ConnectionTrait>(
    db: &C,
    new: NewVolunteer,
    today: NaiveDate,
) -> Result<volunteer::Model, AppError> {
    let name = new.name.trim().to_string();
    if name.is_empty() || new.email.trim().is_empty() || new.phone.trim().is_empty() {
        return Err(AppError::Validation(
            "Name, email and phone are all required".into(),
        ));
    }
    if Volunteer::find()
        .filter(volunteer::Column::Name.eq(&name))
        .one(db)
        .await?
        .is_some()
    {
        return Err(AppError::Validation(format!(
            "A volunteer named {name:?} already exists"
        )));
    }

    let volunteer = volunteer::ActiveModel {
        name: Set(name),
        email: Set(new.email.trim().to_string()),
        phone: Set(new.phone.trim().to_string()),
        date_added: Set(today),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = volunteer.id, name = %volunteer.name, "Added volunteer");
    Ok(volunteer)
}

/// Removes a volunteer who has no bookings or recipes.
pub async fn delete_volunteer<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, AppError> {
    let meals = Meal::find()
        .filter(meal::Column::VolunteerId.eq(id))
        .count(db)
        .await?;
    let gift_cards = GiftCard::find()
        .filter(gift_card::Column::VolunteerId.eq(id))
        .count(db)
        .await?;
    let recipes = Recipe::find()
        .filter(recipe::Column::CreatorId.eq(id))
        .count(db)
        .await?;
    if meals + gift_cards + recipes > 0 {
        return Err(AppError::Validation(
            "Volunteer still has bookings or recipes".into(),
        ));
    }

    let deleted = Volunteer::delete_by_id(id).exec(db).await?.rows_affected > 0;
    if deleted {
        info!(id, "Deleted volunteer");
    }
    Ok(deleted)
}

/// All recipes by name, with their creator.
pub async fn list_recipes<C: ConnectionTrait>(db: &C) -> Result<Vec<RecipeSummary>, DbErr> {
    let recipes = Recipe::find()
        .find_also_related(Volunteer)
        .order_by_asc(recipe::Column::Name)
        .all(db)
        .await?;

    Ok(recipes
        .into_iter()
        .filter_map(|(recipe, creator)| {
            Some(RecipeSummary {
                id: recipe.id,
                name: recipe.name,
                creator_name: creator?.name,
            })
        })
        .collect())
}

pub async fn get_recipe<C: ConnectionTrait>(db: &C, id: i32) -> Result<RecipeDetail, AppError> {
    let (recipe, creator) = Recipe::find_by_id(id)
        .find_also_related(Volunteer)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {id}")))?;

    Ok(RecipeDetail {
        recipe,
        creator_name: creator.map(|c| c.name).unwrap_or_default(),
    })
}

pub async fn create_recipe<C: ConnectionTrait>(
    db: &C,
    fields: RecipeFields,
    creator_name: &str,
    image_url: Option<String>,
) -> Result<recipe::Model, AppError> {
    fields.validate()?;
    let creator = volunteer_by_name(db, creator_name).await?;

    let recipe = recipe::ActiveModel {
        name: Set(fields.name.trim().to_string()),
        ingredients: Set(fields.ingredients),
        instructions: Set(fields.instructions),
        creator_id: Set(creator.id),
        image_url: Set(image_url),
        ..Default::default()
    }
    .insert(db)
    .await?;

    debug!(id = recipe.id, name = %recipe.name, "Created recipe");
    Ok(recipe)
}

/// Rewrites a recipe's text and, when `new_image` is given, its image.
/// Returns the recipe together with the image reference it no longer uses.
pub async fn update_recipe<C: ConnectionTrait>(
    db: &C,
    id: i32,
    fields: RecipeFields,
    new_image: Option<String>,
) -> Result<(recipe::Model, Option<String>), AppError> {
    fields.validate()?;
    let existing = Recipe::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {id}")))?;
    let old_image = existing.image_url.clone();

    let mut recipe = existing.into_active_model();
    recipe.name = Set(fields.name.trim().to_string());
    recipe.ingredients = Set(fields.ingredients);
    recipe.instructions = Set(fields.instructions);
    let replaced = match new_image {
        Some(image) => {
            let replaced = old_image.filter(|old| *old != image);
            recipe.image_url = Set(Some(image));
            replaced
        }
        None => None,
    };
    let recipe = recipe.update(db).await?;

    info!(id, "Updated recipe");
    Ok((recipe, replaced))
}

/// Deletes a recipe no meal refers to, returning its image reference.
pub async fn delete_recipe<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<String>, AppError> {
    let existing = Recipe::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {id}")))?;
    let meals = Meal::find()
        .filter(meal::Column::RecipeId.eq(id))
        .count(db)
        .await?;
    if meals > 0 {
        return Err(AppError::Validation(format!(
            "{} is booked for {meals} meal(s)",
            existing.name
        )));
    }

    Recipe::delete_by_id(id).exec(db).await?;
    info!(id, "Deleted recipe");
    Ok(existing.image_url)
}

async fn count_by<C, E>(db: &C, column: E::Column) -> Result<HashMap<i32, i64>, DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let counts: Vec<(i32, i64)> = E::find()
        .select_only()
        .column(column)
        .column_as(column.count(), "count")
        .group_by(column)
        .into_tuple()
        .all(db)
        .await?;
    Ok(counts.into_iter().collect())
}

/// Volunteers by total bookings, most first.
pub async fn volunteer_rankings<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<VolunteerRanking>, DbErr> {
    let meals = count_by::<_, Meal>(db, meal::Column::VolunteerId).await?;
    let gift_cards = count_by::<_, GiftCard>(db, gift_card::Column::VolunteerId).await?;

    let mut rankings: Vec<VolunteerRanking> = list_volunteers(db)
        .await?
        .into_iter()
        .map(|v| VolunteerRanking {
            reward_count: meals.get(&v.id).copied().unwrap_or(0)
                + gift_cards.get(&v.id).copied().unwrap_or(0),
            id: v.id,
            name: v.name,
        })
        .collect();
    rankings.sort_by(|a, b| b.reward_count.cmp(&a.reward_count).then(a.name.cmp(&b.name)));
    Ok(rankings)
}

/// Recipes by number of meals booked with them, most first.
pub async fn recipe_rankings<C: ConnectionTrait>(db: &C) -> Result<Vec<RecipeRanking>, DbErr> {
    let meals = count_by::<_, Meal>(db, meal::Column::RecipeId).await?;

    let mut rankings: Vec<RecipeRanking> = list_recipes(db)
        .await?
        .into_iter()
        .map(|r| RecipeRanking {
            meal_count: meals.get(&r.id).copied().unwrap_or(0),
            id: r.id,
            name: r.name,
            creator_name: r.creator_name,
        })
        .collect();
    rankings.sort_by(|a, b| b.meal_count.cmp(&a.meal_count).then(a.name.cmp(&b.name)));
    Ok(rankings)
}
