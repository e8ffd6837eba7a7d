use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use minijinja::context;
use tracing::warn;

use crate::error::AppError;
use crate::router::AppState;
use crate::util::today;
use crate::workflow::{
    claim::{self, Claim, ClaimForm},
    deadlines, ledger,
};

const REWARD_PAGE: &str = "/teachers/reward-signup";

pub async fn home(State(state): State<AppState>) -> Result<Response, AppError> {
    let today = today();
    let window = deadlines::window_for(&state.db, &deadlines::month_label(today)).await?;
    let claiming_open = window.as_ref().is_some_and(|w| w.claiming_open(today));

    Ok(state
        .render(
            "teachers.html",
            context! { window => window, claiming_open => claiming_open, today => today },
        )?
        .into_response())
}

/// This month's rewards and who has claimed them.
pub async fn rewards(State(state): State<AppState>) -> Result<Response, AppError> {
    let today = today();
    let window = deadlines::window_for(&state.db, &deadlines::month_label(today)).await?;
    let claiming_open = window.as_ref().is_some_and(|w| w.claiming_open(today));
    let bookings = ledger::list_for_month(&state.db, today).await?;

    Ok(state
        .render(
            "teacher_rewards.html",
            context! {
                window => window,
                claiming_open => claiming_open,
                bookings => bookings,
            },
        )?
        .into_response())
}

/// Claims a reward. Incomplete or malformed posts go back to the form.
pub async fn claim_reward(
    State(state): State<AppState>,
    Form(form): Form<ClaimForm>,
) -> Result<Response, AppError> {
    let request = match Claim::try_from(form) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected reward claim: {e}");
            return Ok(Redirect::to(REWARD_PAGE).into_response());
        }
    };

    claim::claim(&state.db, &request).await?;
    Ok(Redirect::to(REWARD_PAGE).into_response())
}
