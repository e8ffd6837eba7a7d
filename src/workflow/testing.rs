//! Fixtures shared by the workflow tests.

use chrono::NaiveDate;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

use crate::entities::{deadline, recipe, volunteer};

pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // Every pooled connection would otherwise get its own empty database
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.expect("open test db");
    Migrator::up(&db, None).await.expect("migrate test db");
    db
}

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub async fn volunteer(db: &DatabaseConnection, name: &str) -> volunteer::Model {
    volunteer::ActiveModel {
        name: Set(name.to_string()),
        email: Set(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
        phone: Set("555-0100".to_string()),
        date_added: Set(day(2025, 1, 1)),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert volunteer")
}

pub async fn recipe(db: &DatabaseConnection, name: &str, creator: &volunteer::Model) -> recipe::Model {
    recipe::ActiveModel {
        name: Set(name.to_string()),
        ingredients: Set("flour, water".to_string()),
        instructions: Set("mix and bake".to_string()),
        creator_id: Set(creator.id),
        image_url: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert recipe")
}

/// Inserts a window row directly, bypassing the creation checks.
pub async fn window(
    db: &DatabaseConnection,
    month_year: &str,
    dropoff_start: NaiveDate,
    dropoff_end: NaiveDate,
) -> deadline::Model {
    deadline::ActiveModel {
        month_year: Set(month_year.to_string()),
        volunteer_start: Set(dropoff_start - chrono::Duration::days(20)),
        volunteer_end: Set(dropoff_start - chrono::Duration::days(5)),
        dropoff_start: Set(dropoff_start),
        dropoff_end: Set(dropoff_end),
        teacher_start: Set(None),
        teacher_end: Set(dropoff_start - chrono::Duration::days(3)),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert window")
}
