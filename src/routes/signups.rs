//! Booking listings and forms, mounted twice: under `/volunteers` behind the
//! volunteer gate and under `/admin` behind the admin login. Both mounts call
//! the same ledger operations; the [`Surface`] only decides where links and
//! redirects point and whether the current window is shown.

use axum::{
    Extension, Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use minijinja::context;
use serde::{Deserialize, Serialize};

use super::{bounce, parse_date, parse_id};
use crate::error::AppError;
use crate::router::AppState;
use crate::util::today;
use crate::workflow::{
    deadlines,
    ledger::{self, BookingContent, BookingKind},
    roster,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Volunteer,
    Admin,
}

impl Surface {
    pub fn base(self) -> &'static str {
        match self {
            Surface::Volunteer => "/volunteers",
            Surface::Admin => "/admin",
        }
    }

    pub fn listing(self) -> String {
        format!("{}/signups", self.base())
    }

    fn edit_path(self, kind: BookingKind, id: i32) -> String {
        let segment = match kind {
            BookingKind::Meal => "meals",
            BookingKind::GiftCard => "gift-cards",
        };
        format!("{}/signups/{segment}/{id}", self.base())
    }

    fn new_path(self, kind: BookingKind) -> String {
        let segment = match kind {
            BookingKind::Meal => "new-meal",
            BookingKind::GiftCard => "new-gift-card",
        };
        format!("{}/signups/{segment}", self.base())
    }
}

#[derive(Debug, Deserialize)]
pub struct NewBookingForm {
    #[serde(default)]
    name: String,
    /// Recipe name for a meal, card name for a gift card.
    #[serde(default)]
    item: String,
    #[serde(default)]
    date: String,
}

#[derive(Debug, Deserialize)]
pub struct EditBookingForm {
    #[serde(default)]
    action: String,
    #[serde(default)]
    date: String,
    recipe_id: Option<String>,
    gift_card_name: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signups", get(list))
        .route(
            "/signups/meals/{id}",
            get(edit_meal_page).post(edit_meal),
        )
        .route(
            "/signups/gift-cards/{id}",
            get(edit_gift_card_page).post(edit_gift_card),
        )
        .route(
            "/signups/new-meal",
            get(new_meal_page).post(new_meal),
        )
        .route(
            "/signups/new-gift-card",
            get(new_gift_card_page).post(new_gift_card),
        )
}

/// Bookings from the first of this month onwards, by volunteer then date.
async fn list(
    State(state): State<AppState>,
    Extension(surface): Extension<Surface>,
) -> Result<Response, AppError> {
    let today = today();
    let (first_of_month, _) = deadlines::month_bounds(today);
    let bookings = ledger::list_for_window(&state.db, first_of_month).await?;
    let window = deadlines::current_window(&state.db).await?;
    let signup_open = window.as_ref().is_some_and(|w| w.signup_open(today));

    Ok(state
        .render(
            "signups.html",
            context! {
                surface => surface,
                base => surface.base(),
                bookings => bookings,
                window => window,
                signup_open => signup_open,
            },
        )?
        .into_response())
}

async fn booking_page(
    state: &AppState,
    surface: Surface,
    kind: BookingKind,
    id: i32,
) -> Result<Response, AppError> {
    let booking = match ledger::find(&state.db, kind, id).await {
        Ok(booking) => booking,
        Err(e) => return bounce(e, &surface.listing()),
    };
    let recipes = match kind {
        BookingKind::Meal => roster::list_recipes(&state.db).await?,
        BookingKind::GiftCard => Vec::new(),
    };
    let window = deadlines::current_window(&state.db).await?;

    Ok(state
        .render(
            "booking_edit.html",
            context! {
                surface => surface,
                base => surface.base(),
                action => surface.edit_path(kind, id),
                booking => booking,
                recipes => recipes,
                window => window,
            },
        )?
        .into_response())
}

async fn edit_meal_page(
    State(state): State<AppState>,
    Extension(surface): Extension<Surface>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    booking_page(&state, surface, BookingKind::Meal, id).await
}

async fn edit_gift_card_page(
    State(state): State<AppState>,
    Extension(surface): Extension<Surface>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    booking_page(&state, surface, BookingKind::GiftCard, id).await
}

async fn apply_edit(
    state: &AppState,
    surface: Surface,
    kind: BookingKind,
    id: i32,
    form: EditBookingForm,
) -> Result<Response, AppError> {
    if form.action == "delete" {
        ledger::delete(&state.db, kind, id).await?;
        return Ok(Redirect::to(&surface.listing()).into_response());
    }

    let result = async {
        let date = parse_date(&form.date)?;
        let content = match kind {
            BookingKind::Meal => {
                BookingContent::Recipe(parse_id(form.recipe_id.as_deref().unwrap_or_default())?)
            }
            BookingKind::GiftCard => {
                BookingContent::GiftCard(form.gift_card_name.unwrap_or_default())
            }
        };
        ledger::update(&state.db, id, date, content).await
    }
    .await;

    match result {
        Ok(_) => Ok(Redirect::to(&surface.listing()).into_response()),
        Err(e) => bounce(e, &surface.edit_path(kind, id)),
    }
}

async fn edit_meal(
    State(state): State<AppState>,
    Extension(surface): Extension<Surface>,
    Path(id): Path<i32>,
    Form(form): Form<EditBookingForm>,
) -> Result<Response, AppError> {
    apply_edit(&state, surface, BookingKind::Meal, id, form).await
}

async fn edit_gift_card(
    State(state): State<AppState>,
    Extension(surface): Extension<Surface>,
    Path(id): Path<i32>,
    Form(form): Form<EditBookingForm>,
) -> Result<Response, AppError> {
    apply_edit(&state, surface, BookingKind::GiftCard, id, form).await
}

async fn new_booking_page(
    state: &AppState,
    surface: Surface,
    kind: BookingKind,
) -> Result<Response, AppError> {
    let today = today();
    let window = deadlines::current_window(&state.db).await?;
    let signup_open = window.as_ref().is_some_and(|w| w.signup_open(today));
    let volunteers = roster::list_volunteers(&state.db).await?;
    let recipes = match kind {
        BookingKind::Meal => roster::list_recipes(&state.db).await?,
        BookingKind::GiftCard => Vec::new(),
    };

    Ok(state
        .render(
            "booking_new.html",
            context! {
                surface => surface,
                base => surface.base(),
                action => surface.new_path(kind),
                kind => kind,
                volunteers => volunteers,
                recipes => recipes,
                window => window,
                signup_open => signup_open,
            },
        )?
        .into_response())
}

async fn new_meal_page(
    State(state): State<AppState>,
    Extension(surface): Extension<Surface>,
) -> Result<Response, AppError> {
    new_booking_page(&state, surface, BookingKind::Meal).await
}

async fn new_gift_card_page(
    State(state): State<AppState>,
    Extension(surface): Extension<Surface>,
) -> Result<Response, AppError> {
    new_booking_page(&state, surface, BookingKind::GiftCard).await
}

async fn create_booking(
    state: &AppState,
    surface: Surface,
    kind: BookingKind,
    form: NewBookingForm,
) -> Result<Response, AppError> {
    let result = async {
        let date = parse_date(&form.date)?;
        match kind {
            BookingKind::Meal => {
                ledger::create_meal(&state.db, form.name.trim(), form.item.trim(), date).await
            }
            BookingKind::GiftCard => {
                ledger::create_gift_card(&state.db, form.name.trim(), &form.item, date).await
            }
        }
    }
    .await;

    match result {
        Ok(_) => Ok(Redirect::to(&surface.listing()).into_response()),
        Err(e) => bounce(e, &surface.new_path(kind)),
    }
}

async fn new_meal(
    State(state): State<AppState>,
    Extension(surface): Extension<Surface>,
    Form(form): Form<NewBookingForm>,
) -> Result<Response, AppError> {
    create_booking(&state, surface, BookingKind::Meal, form).await
}

async fn new_gift_card(
    State(state): State<AppState>,
    Extension(surface): Extension<Surface>,
    Form(form): Form<NewBookingForm>,
) -> Result<Response, AppError> {
    create_booking(&state, surface, BookingKind::GiftCard, form).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_paths() {
        assert_eq!(Surface::Volunteer.listing(), "/volunteers/signups");
        assert_eq!(
            Surface::Admin.edit_path(BookingKind::GiftCard, 4),
            "/admin/signups/gift-cards/4"
        );
        assert_eq!(
            Surface::Volunteer.new_path(BookingKind::Meal),
            "/volunteers/signups/new-meal"
        );
    }
}
