//! Shared-code gates in front of the volunteer and teacher areas.
//!
//! A session's [`AccessContext`] records which code version it was admitted
//! with. Every gated request compares that against the live version, so a
//! rotated code shuts out everyone admitted under the old one.

use axum::{
    Form,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_login::tower_sessions::Session;
use minijinja::context;
use serde::Deserialize;
use tracing::debug;

use crate::error::AppError;
use crate::router::AppState;
use crate::workflow::access::{self, AccessContext, Audience};

pub const ACCESS_CONTEXT_KEY: &str = "access.context";

#[derive(Debug, Deserialize)]
pub struct CodeForm {
    #[serde(default)]
    code: String,
}

pub async fn load_context(session: &Session) -> Result<AccessContext, AppError> {
    Ok(session
        .get::<AccessContext>(ACCESS_CONTEXT_KEY)
        .await?
        .unwrap_or_default())
}

async fn gate(
    audience: Audience,
    state: &AppState,
    session: &Session,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let context = load_context(session).await?;
    let current = access::current_version(&state.db, audience).await?;
    if !context.is_admitted(audience, current) {
        debug!(audience = audience.label(), path = %request.uri().path(), "Not admitted");
        return Ok(Redirect::to(audience.entry_path()).into_response());
    }
    Ok(next.run(request).await)
}

pub async fn volunteer_gate(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    gate(Audience::Volunteer, &state, &session, request, next).await
}

pub async fn teacher_gate(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    gate(Audience::Teacher, &state, &session, request, next).await
}

fn enter_code_page(state: &AppState, audience: Audience) -> Result<Response, AppError> {
    Ok(state
        .render(
            "enter_code.html",
            context! { audience => audience, action => audience.entry_path() },
        )?
        .into_response())
}

async fn submit_code(
    audience: Audience,
    state: &AppState,
    session: &Session,
    code: &str,
) -> Result<Response, AppError> {
    let version = match access::verify(&state.db, audience, code).await {
        Ok(version) => version,
        Err(AppError::InvalidCode) => {
            let page = state.render(
                "invalid_code.html",
                context! { audience => audience, action => audience.entry_path() },
            )?;
            return Ok((StatusCode::UNAUTHORIZED, page).into_response());
        }
        Err(e) => return Err(e),
    };

    let mut context = load_context(session).await?;
    context.admit(audience, version);
    session.insert(ACCESS_CONTEXT_KEY, context).await?;
    Ok(Redirect::to(audience.home_path()).into_response())
}

pub async fn volunteer_code_page(State(state): State<AppState>) -> Result<Response, AppError> {
    enter_code_page(&state, Audience::Volunteer)
}

pub async fn teacher_code_page(State(state): State<AppState>) -> Result<Response, AppError> {
    enter_code_page(&state, Audience::Teacher)
}

pub async fn volunteer_code_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CodeForm>,
) -> Result<Response, AppError> {
    submit_code(Audience::Volunteer, &state, &session, &form.code).await
}

pub async fn teacher_code_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CodeForm>,
) -> Result<Response, AppError> {
    submit_code(Audience::Teacher, &state, &session, &form.code).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::testing::{get, location, post_form, session_cookie, test_auth_layer, test_state};
    use crate::workflow::testing::test_db;
    use axum::{Router, middleware, routing};
    use tower::ServiceExt;

    fn teacher_app(state: AppState) -> Router {
        let db = state.db.clone();
        Router::new()
            .route("/teachers", routing::get(|| async { "rewards" }))
            .route_layer(middleware::from_fn_with_state(state.clone(), teacher_gate))
            .route(
                "/teachers/enter-code",
                routing::get(teacher_code_page).post(teacher_code_submit),
            )
            .with_state(state)
            .layer(test_auth_layer(db))
    }

    #[tokio::test]
    async fn test_gate_turns_away_sessions_admitted_under_a_rotated_code() {
        let db = test_db().await;
        access::issue(&db, Audience::Teacher, "apple").await.expect("issue");
        let app = teacher_app(test_state(db.clone()));

        let anonymous = app.clone().oneshot(get("/teachers", None)).await.expect("get");
        assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&anonymous), Some(Audience::Teacher.entry_path()));

        let admitted = app
            .clone()
            .oneshot(post_form("/teachers/enter-code", "code=apple", None))
            .await
            .expect("submit");
        assert_eq!(location(&admitted), Some(Audience::Teacher.home_path()));
        let cookie = session_cookie(&admitted).expect("session cookie");

        let inside = app
            .clone()
            .oneshot(get("/teachers", Some(&cookie)))
            .await
            .expect("get");
        assert_eq!(inside.status(), StatusCode::OK);

        access::issue(&db, Audience::Teacher, "banana").await.expect("rotate");
        let after_rotation = app
            .oneshot(get("/teachers", Some(&cookie)))
            .await
            .expect("get");
        assert_eq!(after_rotation.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&after_rotation), Some(Audience::Teacher.entry_path()));
    }

    #[tokio::test]
    async fn test_wrong_code_renders_invalid_page() {
        let db = test_db().await;
        access::issue(&db, Audience::Teacher, "apple").await.expect("issue");
        let app = teacher_app(test_state(db));

        let rejected = app
            .oneshot(post_form("/teachers/enter-code", "code=pear", None))
            .await
            .expect("submit");
        assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
    }
}
