//! Monthly deadline windows.
//!
//! Windows form an append-only log ordered by id. The current window is the
//! newest row, not the one whose dates surround today, so creating next
//! month's window switches the program over immediately.

use chrono::{Datelike, Duration, NaiveDate};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::entities::{deadline, prelude::*};
use crate::error::AppError;

/// Teacher claiming closes this many days before drop-off begins.
pub const TEACHER_LEAD_DAYS: i64 = 3;

pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// Parses the `YYYY-MM` value of a month input into the first day of that month.
pub fn parse_month(input: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(&format!("{}-01", input.trim()), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid month: {input}")))
}

/// Inverse of [`month_label`]: the first day of the labelled month.
pub fn parse_month_label(label: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("1 {}", label.trim()), "%d %B %Y").ok()
}

/// `YYYY-MM` of the month after `today`, the default for a new window.
pub fn next_month_input(today: NaiveDate) -> String {
    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    format!("{year}-{month:02}")
}

/// First and last day of the calendar month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let next = first
        .checked_add_months(chrono::Months::new(1))
        .unwrap_or(first);
    (first, next - Duration::days(1))
}

pub fn teacher_end_for(dropoff_start: NaiveDate) -> NaiveDate {
    dropoff_start - Duration::days(TEACHER_LEAD_DAYS)
}

/// Admin-supplied dates for a window.
#[derive(Debug, Clone)]
pub struct WindowInput {
    /// Any day in the program month; only the month and year are kept.
    pub month: NaiveDate,
    pub dropoff_start: NaiveDate,
    pub dropoff_end: NaiveDate,
    pub volunteer_deadline: NaiveDate,
}

impl WindowInput {
    fn label(&self) -> String {
        month_label(self.month)
    }

    fn validate(&self, volunteer_start: NaiveDate) -> Result<(), AppError> {
        if volunteer_start > self.volunteer_deadline {
            return Err(AppError::Validation(format!(
                "Volunteer deadline {} has already passed",
                self.volunteer_deadline
            )));
        }
        if self.volunteer_deadline > self.dropoff_start {
            return Err(AppError::Validation(
                "Volunteer deadline must not be after drop-off starts".into(),
            ));
        }
        if self.dropoff_start > self.dropoff_end {
            return Err(AppError::Validation(
                "Drop-off must not end before it starts".into(),
            ));
        }
        Ok(())
    }
}

impl deadline::Model {
    pub fn signup_open(&self, today: NaiveDate) -> bool {
        self.volunteer_start <= today && today <= self.volunteer_end
    }

    /// Claiming only opens once the window has been pushed to teachers.
    pub fn claiming_open(&self, today: NaiveDate) -> bool {
        self.teacher_start
            .is_some_and(|start| start <= today && today <= self.teacher_end)
    }

    pub fn dropoff_contains(&self, date: NaiveDate) -> bool {
        self.dropoff_start <= date && date <= self.dropoff_end
    }
}

pub async fn current_window<C: ConnectionTrait>(db: &C) -> Result<Option<deadline::Model>, DbErr> {
    Deadline::find()
        .order_by_desc(deadline::Column::Id)
        .one(db)
        .await
}

pub async fn window_for<C: ConnectionTrait>(
    db: &C,
    month_year: &str,
) -> Result<Option<deadline::Model>, DbErr> {
    Deadline::find()
        .filter(deadline::Column::MonthYear.eq(month_year))
        .one(db)
        .await
}

/// All windows, newest first.
pub async fn list<C: ConnectionTrait>(db: &C) -> Result<Vec<deadline::Model>, DbErr> {
    Deadline::find()
        .order_by_desc(deadline::Column::Id)
        .all(db)
        .await
}

pub async fn find<C: ConnectionTrait>(db: &C, id: i32) -> Result<deadline::Model, AppError> {
    Deadline::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Deadline window {id}")))
}

/// Opens a new month. Volunteer signup starts `today`; teacher claiming stays
/// closed until [`push_teacher_window`].
pub async fn create<C: ConnectionTrait>(
    db: &C,
    input: &WindowInput,
    today: NaiveDate,
) -> Result<deadline::Model, AppError> {
    input.validate(today)?;
    let label = input.label();
    if window_for(db, &label).await?.is_some() {
        return Err(AppError::Validation(format!(
            "A window for {label} already exists"
        )));
    }

    let window = deadline::ActiveModel {
        month_year: Set(label),
        volunteer_start: Set(today),
        volunteer_end: Set(input.volunteer_deadline),
        dropoff_start: Set(input.dropoff_start),
        dropoff_end: Set(input.dropoff_end),
        teacher_start: Set(None),
        teacher_end: Set(teacher_end_for(input.dropoff_start)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = window.id, month = %window.month_year, "Created deadline window");
    Ok(window)
}

/// Rewrites a window's month and dates. The teacher deadline follows the new
/// drop-off start; `volunteer_start` and `teacher_start` are kept.
pub async fn edit<C: ConnectionTrait>(
    db: &C,
    id: i32,
    input: &WindowInput,
) -> Result<deadline::Model, AppError> {
    let existing = find(db, id).await?;
    input.validate(existing.volunteer_start)?;
    let label = input.label();
    if let Some(other) = window_for(db, &label).await? {
        if other.id != id {
            return Err(AppError::Validation(format!(
                "A window for {label} already exists"
            )));
        }
    }

    let mut window = existing.into_active_model();
    window.month_year = Set(label);
    window.volunteer_end = Set(input.volunteer_deadline);
    window.dropoff_start = Set(input.dropoff_start);
    window.dropoff_end = Set(input.dropoff_end);
    window.teacher_end = Set(teacher_end_for(input.dropoff_start));
    let window = window.update(db).await?;

    info!(id, month = %window.month_year, "Edited deadline window");
    Ok(window)
}

/// Removes a window. Bookings made while it was current are left alone.
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, AppError> {
    let result = Deadline::delete_by_id(id).exec(db).await?;
    if result.rows_affected > 0 {
        info!(id, "Deleted deadline window");
    }
    Ok(result.rows_affected > 0)
}

/// Opens teacher claiming on the current window starting `today`.
pub async fn push_teacher_window<C: ConnectionTrait>(
    db: &C,
    today: NaiveDate,
) -> Result<deadline::Model, AppError> {
    let current = current_window(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Current deadline window".into()))?;

    let mut window = current.into_active_model();
    window.teacher_start = Set(Some(today));
    let window = window.update(db).await?;

    info!(id = window.id, month = %window.month_year, "Pushed window to teachers");
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::testing::{day, test_db, window};

    fn april_input() -> WindowInput {
        WindowInput {
            month: day(2025, 4, 1),
            dropoff_start: day(2025, 4, 10),
            dropoff_end: day(2025, 4, 20),
            volunteer_deadline: day(2025, 4, 5),
        }
    }

    #[tokio::test]
    async fn test_create_derives_teacher_end() {
        let db = test_db().await;
        let created = create(&db, &april_input(), day(2025, 3, 20))
            .await
            .expect("create");

        assert_eq!(created.month_year, "April 2025");
        assert_eq!(created.teacher_end, day(2025, 4, 7));
        assert_eq!(created.volunteer_start, day(2025, 3, 20));
        assert_eq!(created.volunteer_end, day(2025, 4, 5));
        assert_eq!(created.teacher_start, None);
    }

    #[tokio::test]
    async fn test_current_window_is_newest_not_by_calendar() {
        let db = test_db().await;
        let march = window(&db, "March 2025", day(2025, 3, 10), day(2025, 3, 20)).await;
        let april = window(&db, "April 2025", day(2025, 4, 10), day(2025, 4, 20)).await;
        assert!(april.id > march.id);

        let current = current_window(&db).await.expect("query").expect("window");
        assert_eq!(current.month_year, "April 2025");

        let by_label = window_for(&db, "March 2025").await.expect("query").expect("window");
        assert_eq!(by_label.id, march.id);
    }

    #[tokio::test]
    async fn test_create_rejects_out_of_order_dates() {
        let db = test_db().await;
        let mut input = april_input();
        input.volunteer_deadline = day(2025, 4, 12);
        assert!(matches!(
            create(&db, &input, day(2025, 3, 20)).await,
            Err(AppError::Validation(_))
        ));

        let mut input = april_input();
        input.dropoff_end = day(2025, 4, 9);
        assert!(matches!(
            create(&db, &input, day(2025, 3, 20)).await,
            Err(AppError::Validation(_))
        ));

        // Deadline already behind us
        assert!(matches!(
            create(&db, &april_input(), day(2025, 4, 6)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_month() {
        let db = test_db().await;
        create(&db, &april_input(), day(2025, 3, 20)).await.expect("create");
        assert!(matches!(
            create(&db, &april_input(), day(2025, 3, 21)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_push_sets_teacher_start_on_newest_window() {
        let db = test_db().await;
        let march = window(&db, "March 2025", day(2025, 3, 10), day(2025, 3, 20)).await;
        window(&db, "April 2025", day(2025, 4, 10), day(2025, 4, 20)).await;

        let pushed = push_teacher_window(&db, day(2025, 3, 28)).await.expect("push");
        assert_eq!(pushed.month_year, "April 2025");
        assert_eq!(pushed.teacher_start, Some(day(2025, 3, 28)));
        assert!(pushed.claiming_open(day(2025, 4, 1)));
        assert!(!pushed.claiming_open(day(2025, 4, 8)));

        let march = find(&db, march.id).await.expect("find");
        assert_eq!(march.teacher_start, None);
    }

    #[tokio::test]
    async fn test_push_without_windows_is_not_found() {
        let db = test_db().await;
        assert!(matches!(
            push_teacher_window(&db, day(2025, 3, 28)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_edit_and_delete() {
        let db = test_db().await;
        let created = create(&db, &april_input(), day(2025, 3, 20)).await.expect("create");

        let mut input = april_input();
        input.dropoff_start = day(2025, 4, 14);
        let edited = edit(&db, created.id, &input).await.expect("edit");
        assert_eq!(edited.dropoff_start, day(2025, 4, 14));
        assert_eq!(edited.teacher_end, day(2025, 4, 11));
        assert_eq!(edited.volunteer_start, created.volunteer_start);

        assert!(delete(&db, created.id).await.expect("delete"));
        assert!(!delete(&db, created.id).await.expect("delete"));
        assert!(current_window(&db).await.expect("query").is_none());
    }

    #[test]
    fn test_month_helpers() {
        assert_eq!(parse_month("2025-04").expect("parse"), day(2025, 4, 1));
        assert!(parse_month("April").is_err());
        assert_eq!(next_month_input(day(2025, 12, 15)), "2026-01");
        assert_eq!(next_month_input(day(2025, 4, 30)), "2025-05");
        assert_eq!(month_bounds(day(2024, 2, 14)), (day(2024, 2, 1), day(2024, 2, 29)));
        assert_eq!(month_label(day(2025, 4, 10)), "April 2025");
        assert_eq!(parse_month_label("April 2025"), Some(day(2025, 4, 1)));
        assert_eq!(parse_month_label("2025-04"), None);
    }
}
