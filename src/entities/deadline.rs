use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One program month. The row with the highest id is the current window.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deadlines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Display label such as `April 2025`.
    #[sea_orm(unique)]
    pub month_year: String,
    pub volunteer_start: Date,
    pub volunteer_end: Date,
    pub dropoff_start: Date,
    pub dropoff_end: Date,
    /// Unset until an administrator pushes the month to teachers.
    pub teacher_start: Option<Date>,
    pub teacher_end: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
