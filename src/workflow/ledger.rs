//! Meal and gift-card commitments.
//!
//! The two booking tables share one contract, [`BookingTable`], and callers
//! pick an implementation through [`BookingKind`] instead of naming a table.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, Set, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entities::{gift_card, meal, prelude::*, recipe, teacher, volunteer};
use crate::error::AppError;
use crate::workflow::{deadlines, roster};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingKind {
    Meal,
    GiftCard,
}

impl BookingKind {
    pub fn label(self) -> &'static str {
        match self {
            BookingKind::Meal => "meal",
            BookingKind::GiftCard => "gift card",
        }
    }
}

impl fmt::Display for BookingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BookingKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meal" | "meals" => Ok(BookingKind::Meal),
            "gift_card" | "gift_cards" => Ok(BookingKind::GiftCard),
            other => Err(AppError::Validation(format!("Unknown reward type: {other}"))),
        }
    }
}

/// A booking joined with the people and recipe it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    pub kind: BookingKind,
    pub id: i32,
    pub date: NaiveDate,
    /// Recipe name for a meal, card name for a gift card.
    pub label: String,
    pub recipe_id: Option<i32>,
    pub volunteer: volunteer::Model,
    pub teacher: Option<teacher::Model>,
}

/// The part of a booking an edit may replace besides its date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingContent {
    Recipe(i32),
    GiftCard(String),
}

impl BookingContent {
    pub fn kind(&self) -> BookingKind {
        match self {
            BookingContent::Recipe(_) => BookingKind::Meal,
            BookingContent::GiftCard(_) => BookingKind::GiftCard,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct BookingRow {
    pub(crate) kind: BookingKind,
    pub(crate) id: i32,
    pub(crate) date: NaiveDate,
    pub(crate) volunteer_id: i32,
    pub(crate) recipe_id: Option<i32>,
    pub(crate) gift_card_name: Option<String>,
    pub(crate) teacher_id: Option<i32>,
}

impl From<meal::Model> for BookingRow {
    fn from(row: meal::Model) -> Self {
        Self {
            kind: BookingKind::Meal,
            id: row.id,
            date: row.date,
            volunteer_id: row.volunteer_id,
            recipe_id: Some(row.recipe_id),
            gift_card_name: None,
            teacher_id: row.teacher_id,
        }
    }
}

impl From<gift_card::Model> for BookingRow {
    fn from(row: gift_card::Model) -> Self {
        Self {
            kind: BookingKind::GiftCard,
            id: row.id,
            date: row.date,
            volunteer_id: row.volunteer_id,
            recipe_id: None,
            gift_card_name: Some(row.name),
            teacher_id: row.teacher_id,
        }
    }
}

/// Storage operations shared by the meal and gift-card tables.
pub(crate) trait BookingTable {
    /// Recipe id for meals, card name for gift cards.
    type Content;

    /// Rows dated on or after `from`, and on or before `to` when given.
    async fn select<C: ConnectionTrait>(
        db: &C,
        from: NaiveDate,
        to: Option<NaiveDate>,
    ) -> Result<Vec<BookingRow>, DbErr>;

    async fn get<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<BookingRow>, DbErr>;

    async fn insert<C: ConnectionTrait>(
        db: &C,
        volunteer_id: i32,
        date: NaiveDate,
        content: Self::Content,
    ) -> Result<BookingRow, DbErr>;

    async fn update<C: ConnectionTrait>(
        db: &C,
        id: i32,
        date: NaiveDate,
        content: Self::Content,
    ) -> Result<Option<BookingRow>, DbErr>;

    async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, DbErr>;

    async fn assign_teacher<C: ConnectionTrait>(
        db: &C,
        id: i32,
        teacher_id: i32,
    ) -> Result<bool, DbErr>;
}

pub(crate) struct Meals;

pub(crate) struct GiftCards;

impl BookingTable for Meals {
    type Content = i32;

    async fn select<C: ConnectionTrait>(
        db: &C,
        from: NaiveDate,
        to: Option<NaiveDate>,
    ) -> Result<Vec<BookingRow>, DbErr> {
        let mut query = Meal::find().filter(meal::Column::Date.gte(from));
        if let Some(to) = to {
            query = query.filter(meal::Column::Date.lte(to));
        }
        Ok(query.all(db).await?.into_iter().map(BookingRow::from).collect())
    }

    async fn get<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<BookingRow>, DbErr> {
        Ok(Meal::find_by_id(id).one(db).await?.map(BookingRow::from))
    }

    async fn insert<C: ConnectionTrait>(
        db: &C,
        volunteer_id: i32,
        date: NaiveDate,
        recipe_id: i32,
    ) -> Result<BookingRow, DbErr> {
        let row = meal::ActiveModel {
            date: Set(date),
            volunteer_id: Set(volunteer_id),
            recipe_id: Set(recipe_id),
            teacher_id: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(row.into())
    }

    async fn update<C: ConnectionTrait>(
        db: &C,
        id: i32,
        date: NaiveDate,
        recipe_id: i32,
    ) -> Result<Option<BookingRow>, DbErr> {
        let Some(existing) = Meal::find_by_id(id).one(db).await? else {
            return Ok(None);
        };
        let mut row = existing.into_active_model();
        row.date = Set(date);
        row.recipe_id = Set(recipe_id);
        Ok(Some(row.update(db).await?.into()))
    }

    async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, DbErr> {
        Ok(Meal::delete_by_id(id).exec(db).await?.rows_affected > 0)
    }

    async fn assign_teacher<C: ConnectionTrait>(
        db: &C,
        id: i32,
        teacher_id: i32,
    ) -> Result<bool, DbErr> {
        let result = Meal::update_many()
            .col_expr(meal::Column::TeacherId, Expr::value(teacher_id))
            .filter(meal::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

impl BookingTable for GiftCards {
    type Content = String;

    async fn select<C: ConnectionTrait>(
        db: &C,
        from: NaiveDate,
        to: Option<NaiveDate>,
    ) -> Result<Vec<BookingRow>, DbErr> {
        let mut query = GiftCard::find().filter(gift_card::Column::Date.gte(from));
        if let Some(to) = to {
            query = query.filter(gift_card::Column::Date.lte(to));
        }
        Ok(query.all(db).await?.into_iter().map(BookingRow::from).collect())
    }

    async fn get<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<BookingRow>, DbErr> {
        Ok(GiftCard::find_by_id(id).one(db).await?.map(BookingRow::from))
    }

    async fn insert<C: ConnectionTrait>(
        db: &C,
        volunteer_id: i32,
        date: NaiveDate,
        name: String,
    ) -> Result<BookingRow, DbErr> {
        let row = gift_card::ActiveModel {
            name: Set(name),
            date: Set(date),
            volunteer_id: Set(volunteer_id),
            teacher_id: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(row.into())
    }

    async fn update<C: ConnectionTrait>(
        db: &C,
        id: i32,
        date: NaiveDate,
        name: String,
    ) -> Result<Option<BookingRow>, DbErr> {
        let Some(existing) = GiftCard::find_by_id(id).one(db).await? else {
            return Ok(None);
        };
        let mut row = existing.into_active_model();
        row.date = Set(date);
        row.name = Set(name);
        Ok(Some(row.update(db).await?.into()))
    }

    async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, DbErr> {
        Ok(GiftCard::delete_by_id(id).exec(db).await?.rows_affected > 0)
    }

    async fn assign_teacher<C: ConnectionTrait>(
        db: &C,
        id: i32,
        teacher_id: i32,
    ) -> Result<bool, DbErr> {
        let result = GiftCard::update_many()
            .col_expr(gift_card::Column::TeacherId, Expr::value(teacher_id))
            .filter(gift_card::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

async fn hydrate<C: ConnectionTrait>(db: &C, rows: Vec<BookingRow>) -> Result<Vec<Booking>, DbErr> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let volunteer_ids: Vec<i32> = rows.iter().map(|row| row.volunteer_id).collect();
    let volunteers: HashMap<i32, volunteer::Model> = Volunteer::find()
        .filter(volunteer::Column::Id.is_in(volunteer_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    let recipe_ids: Vec<i32> = rows.iter().filter_map(|row| row.recipe_id).collect();
    let recipes: HashMap<i32, String> = if recipe_ids.is_empty() {
        HashMap::new()
    } else {
        Recipe::find()
            .filter(recipe::Column::Id.is_in(recipe_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|r| (r.id, r.name))
            .collect()
    };

    let teacher_ids: Vec<i32> = rows.iter().filter_map(|row| row.teacher_id).collect();
    let teachers: HashMap<i32, teacher::Model> = if teacher_ids.is_empty() {
        HashMap::new()
    } else {
        Teacher::find()
            .filter(teacher::Column::Id.is_in(teacher_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect()
    };

    // Rows whose volunteer or recipe vanished are dropped, as an inner join would
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let volunteer = volunteers.get(&row.volunteer_id)?.clone();
            let label = match row.kind {
                BookingKind::Meal => recipes.get(&row.recipe_id?)?.clone(),
                BookingKind::GiftCard => row.gift_card_name?,
            };
            Some(Booking {
                kind: row.kind,
                id: row.id,
                date: row.date,
                label,
                recipe_id: row.recipe_id,
                volunteer,
                teacher: row.teacher_id.and_then(|id| teachers.get(&id).cloned()),
            })
        })
        .collect())
}

async fn bookings_between<C: ConnectionTrait>(
    db: &C,
    from: NaiveDate,
    to: Option<NaiveDate>,
) -> Result<Vec<Booking>, DbErr> {
    let mut rows = Meals::select(db, from, to).await?;
    rows.extend(GiftCards::select(db, from, to).await?);
    hydrate(db, rows).await
}

fn sort_by_volunteer(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| {
        a.volunteer
            .name
            .cmp(&b.volunteer.name)
            .then(a.date.cmp(&b.date))
            .then(a.kind.cmp(&b.kind))
            .then(a.id.cmp(&b.id))
    });
}

/// First day of the program year: August 1 of this year from August on,
/// otherwise of last year.
pub fn season_start(today: NaiveDate) -> NaiveDate {
    let year = if today.month() >= 8 {
        today.year()
    } else {
        today.year() - 1
    };
    NaiveDate::from_ymd_opt(year, 8, 1).unwrap_or(today)
}

async fn ensure_in_dropoff<C: ConnectionTrait>(db: &C, date: NaiveDate) -> Result<(), AppError> {
    let window = deadlines::current_window(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Current deadline window".into()))?;
    if !window.dropoff_contains(date) {
        return Err(AppError::Validation(format!(
            "{date} is outside the {} drop-off window",
            window.month_year
        )));
    }
    Ok(())
}

pub async fn create_meal<C: ConnectionTrait>(
    db: &C,
    volunteer_name: &str,
    recipe_name: &str,
    date: NaiveDate,
) -> Result<Booking, AppError> {
    let volunteer = roster::volunteer_by_name(db, volunteer_name).await?;
    let recipe = roster::recipe_by_name(db, recipe_name).await?;
    ensure_in_dropoff(db, date).await?;

    let row = Meals::insert(db, volunteer.id, date, recipe.id).await?;
    debug!(id = row.id, volunteer = %volunteer.name, %date, "Booked meal");
    Ok(Booking {
        kind: BookingKind::Meal,
        id: row.id,
        date,
        label: recipe.name,
        recipe_id: Some(recipe.id),
        volunteer,
        teacher: None,
    })
}

pub async fn create_gift_card<C: ConnectionTrait>(
    db: &C,
    volunteer_name: &str,
    gift_card_name: &str,
    date: NaiveDate,
) -> Result<Booking, AppError> {
    let gift_card_name = gift_card_name.trim();
    if gift_card_name.is_empty() {
        return Err(AppError::Validation("Gift card name is required".into()));
    }
    let volunteer = roster::volunteer_by_name(db, volunteer_name).await?;
    ensure_in_dropoff(db, date).await?;

    let row = GiftCards::insert(db, volunteer.id, date, gift_card_name.to_string()).await?;
    debug!(id = row.id, volunteer = %volunteer.name, %date, "Booked gift card");
    Ok(Booking {
        kind: BookingKind::GiftCard,
        id: row.id,
        date,
        label: gift_card_name.to_string(),
        recipe_id: None,
        volunteer,
        teacher: None,
    })
}

/// Every booking dated on or after `start`, by volunteer name then date.
pub async fn list_for_window<C: ConnectionTrait>(
    db: &C,
    start: NaiveDate,
) -> Result<Vec<Booking>, AppError> {
    let mut bookings = bookings_between(db, start, None).await?;
    sort_by_volunteer(&mut bookings);
    Ok(bookings)
}

/// Every booking since the start of the current program year.
pub async fn list_for_season<C: ConnectionTrait>(
    db: &C,
    today: NaiveDate,
) -> Result<Vec<Booking>, AppError> {
    list_for_window(db, season_start(today)).await
}

/// Bookings dated within the calendar month of `today`, by label.
pub async fn list_for_month<C: ConnectionTrait>(
    db: &C,
    today: NaiveDate,
) -> Result<Vec<Booking>, AppError> {
    let (first, last) = deadlines::month_bounds(today);
    let mut bookings = bookings_between(db, first, Some(last)).await?;
    bookings.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then(a.label.cmp(&b.label))
            .then(a.date.cmp(&b.date))
            .then(a.id.cmp(&b.id))
    });
    Ok(bookings)
}

/// Meals dated within `[start, end]` that a teacher has claimed.
pub async fn claimed_meals<C: ConnectionTrait>(
    db: &C,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Booking>, AppError> {
    let rows = Meals::select(db, start, Some(end))
        .await?
        .into_iter()
        .filter(|row| row.teacher_id.is_some())
        .collect();
    let mut meals = hydrate(db, rows).await?;
    meals.retain(|meal| meal.teacher.is_some());
    meals.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    Ok(meals)
}

pub async fn find<C: ConnectionTrait>(
    db: &C,
    kind: BookingKind,
    id: i32,
) -> Result<Booking, AppError> {
    let row = match kind {
        BookingKind::Meal => Meals::get(db, id).await?,
        BookingKind::GiftCard => GiftCards::get(db, id).await?,
    };
    let not_found = || AppError::NotFound(format!("{kind} {id}"));
    let row = row.ok_or_else(not_found)?;
    hydrate(db, vec![row]).await?.pop().ok_or_else(not_found)
}

/// Replaces a booking's date and its recipe or card name.
pub async fn update<C: ConnectionTrait>(
    db: &C,
    id: i32,
    date: NaiveDate,
    content: BookingContent,
) -> Result<Booking, AppError> {
    let kind = content.kind();
    let updated = match content {
        BookingContent::Recipe(recipe_id) => {
            if Recipe::find_by_id(recipe_id).one(db).await?.is_none() {
                return Err(AppError::NotFound(format!("Recipe {recipe_id}")));
            }
            Meals::update(db, id, date, recipe_id).await?
        }
        BookingContent::GiftCard(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::Validation("Gift card name is required".into()));
            }
            GiftCards::update(db, id, date, name).await?
        }
    };
    if updated.is_none() {
        return Err(AppError::NotFound(format!("{kind} {id}")));
    }

    info!(%kind, id, %date, "Updated booking");
    find(db, kind, id).await
}

pub async fn delete<C: ConnectionTrait>(
    db: &C,
    kind: BookingKind,
    id: i32,
) -> Result<bool, AppError> {
    let deleted = match kind {
        BookingKind::Meal => Meals::delete(db, id).await?,
        BookingKind::GiftCard => GiftCards::delete(db, id).await?,
    };
    if deleted {
        info!(%kind, id, "Deleted booking");
    }
    Ok(deleted)
}

/// Points a booking at a teacher, replacing any earlier claim. Returns false
/// when the booking no longer exists.
pub(crate) async fn assign_teacher<C: ConnectionTrait>(
    db: &C,
    kind: BookingKind,
    id: i32,
    teacher_id: i32,
) -> Result<bool, DbErr> {
    match kind {
        BookingKind::Meal => Meals::assign_teacher(db, id, teacher_id).await,
        BookingKind::GiftCard => GiftCards::assign_teacher(db, id, teacher_id).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::testing::{day, recipe, test_db, volunteer, window};

    #[tokio::test]
    async fn test_create_meal_resolves_names() {
        let db = test_db().await;
        let alice = volunteer(&db, "Alice").await;
        let lasagna = recipe(&db, "Lasagna", &alice).await;
        window(&db, "April 2025", day(2025, 4, 10), day(2025, 4, 20)).await;

        let booking = create_meal(&db, "Alice", "Lasagna", day(2025, 4, 12))
            .await
            .expect("create");
        assert_eq!(booking.kind, BookingKind::Meal);
        assert_eq!(booking.volunteer.id, alice.id);
        assert_eq!(booking.recipe_id, Some(lasagna.id));
        assert_eq!(booking.teacher, None);

        let stored = find(&db, BookingKind::Meal, booking.id).await.expect("find");
        assert_eq!(stored, booking);
    }

    #[tokio::test]
    async fn test_create_meal_unknown_names_are_not_found() {
        let db = test_db().await;
        let alice = volunteer(&db, "Alice").await;
        recipe(&db, "Lasagna", &alice).await;
        window(&db, "April 2025", day(2025, 4, 10), day(2025, 4, 20)).await;

        assert!(matches!(
            create_meal(&db, "alice", "Lasagna", day(2025, 4, 12)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            create_meal(&db, "Alice", "Lasagne", day(2025, 4, 12)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            create_gift_card(&db, "Bob", "Coffee", day(2025, 4, 12)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_outside_dropoff_is_rejected() {
        let db = test_db().await;
        volunteer(&db, "Alice").await;
        window(&db, "April 2025", day(2025, 4, 10), day(2025, 4, 20)).await;

        assert!(matches!(
            create_gift_card(&db, "Alice", "Coffee", day(2025, 4, 21)).await,
            Err(AppError::Validation(_))
        ));
        create_gift_card(&db, "Alice", "Coffee", day(2025, 4, 20))
            .await
            .expect("last day is inside");
    }

    #[tokio::test]
    async fn test_list_for_window_orders_by_volunteer_then_date() {
        let db = test_db().await;
        let bob = volunteer(&db, "Bob").await;
        let alice = volunteer(&db, "Alice").await;
        let soup = recipe(&db, "Soup", &bob).await;

        Meals::insert(&db, bob.id, day(2025, 4, 3), soup.id).await.expect("insert");
        GiftCards::insert(&db, alice.id, day(2025, 4, 15), "Bakery".into())
            .await
            .expect("insert");
        Meals::insert(&db, alice.id, day(2025, 4, 9), soup.id).await.expect("insert");
        // Before the window start
        Meals::insert(&db, alice.id, day(2025, 3, 31), soup.id).await.expect("insert");

        let bookings = list_for_window(&db, day(2025, 4, 1)).await.expect("list");
        let summary: Vec<(&str, NaiveDate, BookingKind)> = bookings
            .iter()
            .map(|b| (b.volunteer.name.as_str(), b.date, b.kind))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Alice", day(2025, 4, 9), BookingKind::Meal),
                ("Alice", day(2025, 4, 15), BookingKind::GiftCard),
                ("Bob", day(2025, 4, 3), BookingKind::Meal),
            ]
        );
        assert_eq!(bookings[1].label, "Bakery");
        assert_eq!(bookings[2].label, "Soup");
    }

    #[test]
    fn test_season_start_boundary() {
        assert_eq!(season_start(day(2025, 7, 31)), day(2024, 8, 1));
        assert_eq!(season_start(day(2025, 8, 1)), day(2025, 8, 1));
        assert_eq!(season_start(day(2026, 1, 15)), day(2025, 8, 1));
    }

    #[tokio::test]
    async fn test_list_for_season_boundary() {
        let db = test_db().await;
        let alice = volunteer(&db, "Alice").await;
        GiftCards::insert(&db, alice.id, day(2025, 7, 31), "July".into())
            .await
            .expect("insert");
        GiftCards::insert(&db, alice.id, day(2025, 8, 1), "August".into())
            .await
            .expect("insert");

        let on_first = list_for_season(&db, day(2025, 8, 1)).await.expect("list");
        let labels: Vec<&str> = on_first.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["August"]);

        let day_before = list_for_season(&db, day(2025, 7, 31)).await.expect("list");
        let labels: Vec<&str> = day_before.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["July", "August"]);
    }

    #[tokio::test]
    async fn test_update_meal_round_trip() {
        let db = test_db().await;
        let alice = volunteer(&db, "Alice").await;
        let soup = recipe(&db, "Soup", &alice).await;
        let stew = recipe(&db, "Stew", &alice).await;
        let row = Meals::insert(&db, alice.id, day(2025, 4, 12), soup.id)
            .await
            .expect("insert");
        let before = find(&db, BookingKind::Meal, row.id).await.expect("find");

        let updated = update(&db, row.id, day(2025, 4, 14), BookingContent::Recipe(stew.id))
            .await
            .expect("update");
        let reread = find(&db, BookingKind::Meal, row.id).await.expect("find");

        assert_eq!(updated, reread);
        assert_eq!(reread.date, day(2025, 4, 14));
        assert_eq!(reread.recipe_id, Some(stew.id));
        assert_eq!(reread.label, "Stew");
        assert_eq!(reread.volunteer, before.volunteer);
        assert_eq!(reread.teacher, before.teacher);
    }

    #[tokio::test]
    async fn test_update_gift_card_and_missing_rows() {
        let db = test_db().await;
        let alice = volunteer(&db, "Alice").await;
        let row = GiftCards::insert(&db, alice.id, day(2025, 4, 12), "Coffee".into())
            .await
            .expect("insert");

        let updated = update(
            &db,
            row.id,
            day(2025, 4, 13),
            BookingContent::GiftCard("Tea".into()),
        )
        .await
        .expect("update");
        assert_eq!(updated.label, "Tea");
        assert_eq!(updated.date, day(2025, 4, 13));

        assert!(matches!(
            update(&db, row.id + 1, day(2025, 4, 13), BookingContent::GiftCard("Tea".into())).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            update(&db, row.id, day(2025, 4, 13), BookingContent::Recipe(999)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_is_unconditional_and_idempotent() {
        let db = test_db().await;
        let alice = volunteer(&db, "Alice").await;
        let row = GiftCards::insert(&db, alice.id, day(2025, 4, 12), "Coffee".into())
            .await
            .expect("insert");

        assert!(delete(&db, BookingKind::GiftCard, row.id).await.expect("delete"));
        assert!(!delete(&db, BookingKind::GiftCard, row.id).await.expect("delete"));
        assert!(matches!(
            find(&db, BookingKind::GiftCard, row.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_for_month_stays_in_calendar_month() {
        let db = test_db().await;
        let alice = volunteer(&db, "Alice").await;
        let soup = recipe(&db, "Soup", &alice).await;
        let apple = recipe(&db, "Apple Pie", &alice).await;
        Meals::insert(&db, alice.id, day(2025, 4, 30), soup.id).await.expect("insert");
        Meals::insert(&db, alice.id, day(2025, 4, 2), apple.id).await.expect("insert");
        Meals::insert(&db, alice.id, day(2025, 5, 1), soup.id).await.expect("insert");
        GiftCards::insert(&db, alice.id, day(2025, 4, 1), "Bakery".into())
            .await
            .expect("insert");

        let bookings = list_for_month(&db, day(2025, 4, 18)).await.expect("list");
        let labels: Vec<&str> = bookings.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Apple Pie", "Soup", "Bakery"]);
    }

    #[test]
    fn test_booking_kind_tags() {
        assert_eq!("meals".parse::<BookingKind>().expect("parse"), BookingKind::Meal);
        assert_eq!("gift_card".parse::<BookingKind>().expect("parse"), BookingKind::GiftCard);
        assert!("teachers".parse::<BookingKind>().is_err());
    }
}
