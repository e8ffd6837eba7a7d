//! Teachers claiming a booked reward.
//!
//! The teacher row and the booking update are written in one transaction, so a
//! failure between the two steps leaves nothing behind. Claims are last write
//! wins: claiming an already claimed booking moves it to the new teacher.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait, TryInsertResult, sea_query::OnConflict,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::entities::{prelude::*, teacher};
use crate::error::AppError;
use crate::workflow::ledger::{self, BookingKind};

/// Raw reward signup form. Every field is optional so a malformed post can be
/// turned back to the form instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct ClaimForm {
    pub reward_type: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub kind: BookingKind,
    pub booking_id: i32,
    pub teacher_name: String,
    pub teacher_email: String,
}

impl TryFrom<ClaimForm> for Claim {
    type Error = AppError;

    fn try_from(form: ClaimForm) -> Result<Self, Self::Error> {
        let required = |value: Option<String>, field: &str| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::Validation(format!("{field} is required")))
        };

        let kind = required(form.reward_type, "Reward type")?.parse()?;
        let booking_id = required(form.id, "Reward")?
            .parse::<i32>()
            .map_err(|_| AppError::Validation("Reward id must be a number".into()))?;
        Ok(Claim {
            kind,
            booking_id,
            teacher_name: required(form.name, "Name")?,
            teacher_email: required(form.email, "Email")?,
        })
    }
}

/// Finds the teacher with this exact name and email, creating it if needed.
///
/// The insert goes first and yields to the unique `(name, email)` index, so two
/// first claims racing for the same teacher both end up on the same row.
async fn ensure_teacher<C: ConnectionTrait>(
    db: &C,
    name: &str,
    email: &str,
) -> Result<teacher::Model, AppError> {
    let inserted = Teacher::insert(teacher::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([teacher::Column::Name, teacher::Column::Email])
            .do_nothing()
            .to_owned(),
    )
    .do_nothing()
    .exec(db)
    .await?;
    if let TryInsertResult::Inserted(result) = inserted {
        debug!(id = result.last_insert_id, "Created teacher");
    }

    Teacher::find()
        .filter(teacher::Column::Name.eq(name))
        .filter(teacher::Column::Email.eq(email))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Teacher {name}")))
}

/// Attaches the claiming teacher to the booking. Claiming a booking that no
/// longer exists still records the teacher and otherwise does nothing.
pub async fn claim(db: &DatabaseConnection, claim: &Claim) -> Result<teacher::Model, AppError> {
    let txn = db.begin().await?;
    let teacher = ensure_teacher(&txn, &claim.teacher_name, &claim.teacher_email).await?;
    let attached = ledger::assign_teacher(&txn, claim.kind, claim.booking_id, teacher.id).await?;
    txn.commit().await?;

    if attached {
        info!(
            kind = %claim.kind,
            booking = claim.booking_id,
            teacher = teacher.id,
            "Reward claimed"
        );
    } else {
        debug!(kind = %claim.kind, booking = claim.booking_id, "Claimed reward no longer exists");
    }
    Ok(teacher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::ledger::{BookingTable, GiftCards, Meals, find};
    use crate::workflow::testing::{day, recipe, test_db, volunteer};
    use sea_orm::{ActiveModelTrait, PaginatorTrait};

    fn form(reward_type: &str, id: &str, name: &str, email: &str) -> ClaimForm {
        ClaimForm {
            reward_type: Some(reward_type.into()),
            id: Some(id.into()),
            name: Some(name.into()),
            email: Some(email.into()),
        }
    }

    #[test]
    fn test_claim_form_validation() {
        let claim = Claim::try_from(form("meals", "4", " Jane Doe ", "jane@x.com")).expect("valid");
        assert_eq!(claim.kind, BookingKind::Meal);
        assert_eq!(claim.booking_id, 4);
        assert_eq!(claim.teacher_name, "Jane Doe");

        assert!(Claim::try_from(form("meal", "4", "", "jane@x.com")).is_err());
        assert!(Claim::try_from(form("teachers", "4", "Jane", "jane@x.com")).is_err());
        assert!(Claim::try_from(form("gift_card", "four", "Jane", "jane@x.com")).is_err());
        assert!(Claim::try_from(ClaimForm::default()).is_err());
    }

    #[tokio::test]
    async fn test_claim_is_idempotent_on_teacher_identity() {
        let db = test_db().await;
        let alice = volunteer(&db, "Alice").await;
        let soup = recipe(&db, "Soup", &alice).await;
        let meal = Meals::insert(&db, alice.id, day(2025, 4, 12), soup.id)
            .await
            .expect("insert");
        let request = Claim::try_from(form("meal", &meal.id.to_string(), "Jane Doe", "jane@x.com"))
            .expect("valid");

        let first = claim(&db, &request).await.expect("claim");
        let after_first = find(&db, BookingKind::Meal, meal.id).await.expect("find");
        let second = claim(&db, &request).await.expect("claim");
        let after_second = find(&db, BookingKind::Meal, meal.id).await.expect("find");

        assert_eq!(first.id, second.id);
        assert_eq!(Teacher::find().count(&db).await.expect("count"), 1);
        assert_eq!(after_first.teacher, Some(first));
        assert_eq!(after_second.teacher, after_first.teacher);
    }

    #[tokio::test]
    async fn test_ensure_teacher_reuses_row_created_elsewhere() {
        let db = test_db().await;
        // Stands in for a concurrent claim that created the row first
        let existing = teacher::ActiveModel {
            name: Set("Jane Doe".into()),
            email: Set("jane@x.com".into()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("insert teacher");

        let found = ensure_teacher(&db, "Jane Doe", "jane@x.com").await.expect("ensure");
        assert_eq!(found, existing);
        let other = ensure_teacher(&db, "Jane Doe", "jane@y.com").await.expect("ensure");
        assert_ne!(other.id, existing.id);
        assert_eq!(Teacher::find().count(&db).await.expect("count"), 2);
    }

    #[tokio::test]
    async fn test_later_claim_overwrites_earlier_one() {
        let db = test_db().await;
        let alice = volunteer(&db, "Alice").await;
        let card = GiftCards::insert(&db, alice.id, day(2025, 4, 12), "Coffee".into())
            .await
            .expect("insert");
        let id = card.id.to_string();

        claim(&db, &Claim::try_from(form("gift_cards", &id, "Jane", "jane@x.com")).expect("valid"))
            .await
            .expect("claim");
        let bob = claim(
            &db,
            &Claim::try_from(form("gift_cards", &id, "Bob", "bob@x.com")).expect("valid"),
        )
        .await
        .expect("claim");

        let stored = find(&db, BookingKind::GiftCard, card.id).await.expect("find");
        assert_eq!(stored.teacher, Some(bob));
    }

    #[tokio::test]
    async fn test_claiming_missing_booking_is_a_no_op() {
        let db = test_db().await;
        let request = Claim::try_from(form("meal", "42", "Jane", "jane@x.com")).expect("valid");
        claim(&db, &request).await.expect("claim");
        assert_eq!(Meal::find().count(&db).await.expect("count"), 0);
    }
}
