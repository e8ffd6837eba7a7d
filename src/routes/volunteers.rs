use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use minijinja::context;

use crate::error::AppError;
use crate::router::AppState;
use crate::util::today;
use crate::workflow::{deadlines, ledger};

pub async fn home(State(state): State<AppState>) -> Result<Response, AppError> {
    let today = today();
    let window = deadlines::current_window(&state.db).await?;
    let signup_open = window.as_ref().is_some_and(|w| w.signup_open(today));

    Ok(state
        .render(
            "volunteers.html",
            context! { window => window, signup_open => signup_open, today => today },
        )?
        .into_response())
}

/// Everything booked since the program year began in August.
pub async fn all_time(State(state): State<AppState>) -> Result<Response, AppError> {
    let today = today();
    let bookings = ledger::list_for_season(&state.db, today).await?;

    Ok(state
        .render(
            "signups_all_time.html",
            context! {
                bookings => bookings,
                season_start => ledger::season_start(today),
            },
        )?
        .into_response())
}
