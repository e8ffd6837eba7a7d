//! The administrator console. Every handler here sits behind the admin login.

use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Multipart;
use minijinja::context;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::{bounce, parse_date, recipes::RecipeSubmission};
use crate::error::AppError;
use crate::router::AppState;
use crate::util::today;
use crate::workflow::{
    access::{self, Audience},
    deadlines::{self, WindowInput},
    notify,
    roster::{self, NewVolunteer},
};

pub async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    let window = deadlines::current_window(&state.db).await?;
    Ok(state
        .render("admin/index.html", context! { window => window })?
        .into_response())
}

// Volunteers

#[derive(Debug, Deserialize)]
pub struct VolunteerForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteVolunteer {
    id: i32,
}

pub async fn volunteers(State(state): State<AppState>) -> Result<Response, AppError> {
    let volunteers = roster::list_volunteers(&state.db).await?;
    Ok(state
        .render("admin/volunteers.html", context! { volunteers => volunteers })?
        .into_response())
}

pub async fn add_volunteer_page(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(state
        .render("admin/volunteer_add.html", context! {})?
        .into_response())
}

pub async fn add_volunteer(
    State(state): State<AppState>,
    Form(form): Form<VolunteerForm>,
) -> Result<Response, AppError> {
    let new = NewVolunteer {
        name: form.name,
        email: form.email,
        phone: form.phone,
    };
    match roster::add_volunteer(&state.db, new, today()).await {
        Ok(_) => Ok(Redirect::to("/admin/volunteers").into_response()),
        Err(e) => bounce(e, "/admin/volunteers/add"),
    }
}

/// Called from the volunteer table with a JSON body.
pub async fn delete_volunteer(
    State(state): State<AppState>,
    Json(DeleteVolunteer { id }): Json<DeleteVolunteer>,
) -> Result<Response, AppError> {
    match roster::delete_volunteer(&state.db, id).await {
        Ok(deleted) => Ok(Json(json!({ "success": deleted })).into_response()),
        Err(AppError::Validation(reason)) => Ok((
            StatusCode::CONFLICT,
            Json(json!({ "success": false, "error": reason })),
        )
            .into_response()),
        Err(e) => Err(e),
    }
}

// Access codes

#[derive(Debug, Deserialize)]
pub struct NewCodeForm {
    #[serde(default)]
    code: String,
}

pub async fn code_page(
    State(state): State<AppState>,
    Path(audience): Path<Audience>,
) -> Result<Response, AppError> {
    let current = access::current(&state.db, audience).await?;
    Ok(state
        .render(
            "admin/code.html",
            context! { audience => audience, current => current },
        )?
        .into_response())
}

pub async fn issue_code(
    State(state): State<AppState>,
    Path(audience): Path<Audience>,
    Form(form): Form<NewCodeForm>,
) -> Result<Response, AppError> {
    match access::issue(&state.db, audience, &form.code).await {
        Ok(_) => Ok(Redirect::to("/admin").into_response()),
        Err(e) => bounce(e, "/admin"),
    }
}

// Deadline windows

#[derive(Debug, Deserialize)]
pub struct WindowForm {
    #[serde(default)]
    action: String,
    #[serde(default)]
    month: String,
    #[serde(default)]
    range_start: String,
    #[serde(default)]
    range_end: String,
    #[serde(default)]
    deadline: String,
}

impl TryFrom<&WindowForm> for WindowInput {
    type Error = AppError;

    fn try_from(form: &WindowForm) -> Result<Self, Self::Error> {
        Ok(WindowInput {
            month: deadlines::parse_month(&form.month)?,
            dropoff_start: parse_date(&form.range_start)?,
            dropoff_end: parse_date(&form.range_end)?,
            volunteer_deadline: parse_date(&form.deadline)?,
        })
    }
}

pub async fn push_to_teachers(State(state): State<AppState>) -> Result<Response, AppError> {
    match deadlines::push_teacher_window(&state.db, today()).await {
        Ok(_) => Ok(Redirect::to("/admin").into_response()),
        Err(e) => bounce(e, "/admin"),
    }
}

pub async fn deadline_list(State(state): State<AppState>) -> Result<Response, AppError> {
    let windows = deadlines::list(&state.db).await?;
    Ok(state
        .render("admin/deadlines.html", context! { windows => windows })?
        .into_response())
}

pub async fn new_deadline_page(State(state): State<AppState>) -> Result<Response, AppError> {
    Ok(state
        .render(
            "admin/deadline_form.html",
            context! {
                action => "/admin/deadlines/new",
                month => deadlines::next_month_input(today()),
            },
        )?
        .into_response())
}

pub async fn create_deadline(
    State(state): State<AppState>,
    Form(form): Form<WindowForm>,
) -> Result<Response, AppError> {
    let created = match WindowInput::try_from(&form) {
        Ok(input) => deadlines::create(&state.db, &input, today()).await,
        Err(e) => Err(e),
    };
    match created {
        Ok(_) => Ok(Redirect::to("/admin/deadlines").into_response()),
        Err(e) => bounce(e, "/admin/deadlines/new"),
    }
}

pub async fn edit_deadline_page(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let window = match deadlines::find(&state.db, id).await {
        Ok(window) => window,
        Err(e) => return bounce(e, "/admin/deadlines"),
    };
    let month = deadlines::parse_month_label(&window.month_year)
        .map(|first| first.format("%Y-%m").to_string())
        .unwrap_or_default();

    Ok(state
        .render(
            "admin/deadline_form.html",
            context! {
                action => format!("/admin/deadlines/{id}"),
                month => month,
                window => window,
            },
        )?
        .into_response())
}

pub async fn edit_deadline(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<WindowForm>,
) -> Result<Response, AppError> {
    if form.action == "delete" {
        deadlines::delete(&state.db, id).await?;
        return Ok(Redirect::to("/admin/deadlines").into_response());
    }

    let edited = match WindowInput::try_from(&form) {
        Ok(input) => deadlines::edit(&state.db, id, &input).await,
        Err(e) => Err(e),
    };
    match edited {
        Ok(_) => Ok(Redirect::to("/admin/deadlines").into_response()),
        Err(e) => bounce(e, &format!("/admin/deadlines/{id}")),
    }
}

// Recipes

pub async fn recipes(State(state): State<AppState>) -> Result<Response, AppError> {
    let recipes = roster::list_recipes(&state.db).await?;
    Ok(state
        .render("admin/recipes.html", context! { recipes => recipes })?
        .into_response())
}

pub async fn edit_recipe_page(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let recipe = match roster::get_recipe(&state.db, id).await {
        Ok(recipe) => recipe,
        Err(e) => return bounce(e, "/admin/recipes"),
    };
    Ok(state
        .render("admin/recipe_edit.html", context! { recipe => recipe })?
        .into_response())
}

async fn discard_image(state: &AppState, reference: Option<String>) {
    if let Some(reference) = reference {
        if let Err(e) = state.images.remove(&reference).await {
            warn!(%reference, "Failed to remove recipe image: {e}");
        }
    }
}

/// Edits or deletes a recipe. Replaced and deleted images are removed from
/// disk once the database change has gone through.
pub async fn edit_recipe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let submission = RecipeSubmission::read(multipart).await?;

    if submission.field("action") == "delete" {
        return match roster::delete_recipe(&state.db, id).await {
            Ok(image) => {
                discard_image(&state, image).await;
                Ok(Redirect::to("/admin/recipes").into_response())
            }
            Err(e) => bounce(e, &format!("/admin/recipes/{id}")),
        };
    }

    let new_image = match &submission.image {
        Some(image) => Some(state.images.save(&image.file_name, &image.bytes).await?),
        None => None,
    };
    match roster::update_recipe(&state.db, id, submission.recipe_fields(), new_image.clone()).await
    {
        Ok((_, replaced)) => {
            discard_image(&state, replaced).await;
            Ok(Redirect::to("/admin/recipes").into_response())
        }
        Err(e) => {
            discard_image(&state, new_image).await;
            bounce(e, &format!("/admin/recipes/{id}"))
        }
    }
}

// Reports

pub async fn rankings(State(state): State<AppState>) -> Result<Response, AppError> {
    let volunteers = roster::volunteer_rankings(&state.db).await?;
    let recipes = roster::recipe_rankings(&state.db).await?;
    Ok(state
        .render(
            "admin/rankings.html",
            context! { volunteers => volunteers, recipes => recipes },
        )?
        .into_response())
}

/// Mails every claimed meal in this month's drop-off window and shows what
/// went out and what failed.
pub async fn send_emails(State(state): State<AppState>) -> Result<Response, AppError> {
    let today = today();
    let report = notify::send_dropoff_notifications(
        &state.db,
        state.mailer.as_ref(),
        &state.letterhead,
        today,
    )
    .await;

    let page = match report {
        Ok(report) => context! { report => report },
        Err(AppError::NotFound(_)) => context! { missing => deadlines::month_label(today) },
        Err(e) => return Err(e),
    };
    Ok(state.render("admin/dispatch.html", page)?.into_response())
}
