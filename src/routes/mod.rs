pub mod admin;
pub mod gate;
pub mod recipes;
pub mod signups;
pub mod teachers;
pub mod volunteers;

use axum::response::{IntoResponse, Redirect, Response};
use chrono::NaiveDate;
use tracing::warn;

use crate::error::AppError;

/// Sends a rejected form submission back to `back_to`. Unknown names and
/// invalid input are bounced; every other failure is a real error.
pub(crate) fn bounce(err: AppError, back_to: &str) -> Result<Response, AppError> {
    match err {
        AppError::NotFound(_) | AppError::Validation(_) => {
            warn!(back_to, "Rejected form submission: {err}");
            Ok(Redirect::to(back_to).into_response())
        }
        other => Err(other),
    }
}

/// Parses an `<input type="date">` value.
pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date: {value:?}")))
}

pub(crate) fn parse_id(value: &str) -> Result<i32, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid id: {value:?}")))
}
