use crate::{
    auth::{router as auth_router, user::Backend},
    config::Config,
    error::AppError,
    routes::{
        admin, gate, recipes,
        signups::{self, Surface},
        teachers, volunteers,
    },
    util::image_store::ImageStore,
    workflow::notify::{Letterhead, MailTransport},
};
use axum::{
    Extension, Router,
    extract::{DefaultBodyLimit, State},
    middleware,
    response::{Html, IntoResponse},
    routing::{get, get_service, post},
};
use axum_login::{
    AuthManagerLayerBuilder, login_required,
    tower_sessions::{
        Expiry, SessionManagerLayer,
        cookie::{SameSite, time},
    },
};
use chrono::NaiveDate;
use minijinja::{Environment, context};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tokio::{signal, task::AbortHandle};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;

pub const STATIC_DIR: &str = "static";

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub templates: Arc<Environment<'static>>,
    pub mailer: Arc<dyn MailTransport>,
    pub letterhead: Arc<Letterhead>,
    pub images: ImageStore,
}

impl AppState {
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<Html<String>, AppError> {
        let html = self.templates.get_template(name)?.render(ctx)?;
        Ok(Html(html))
    }
}

pub fn create_router(
    db: DatabaseConnection,
    mailer: Arc<dyn MailTransport>,
    letterhead: Letterhead,
    session_store: PostgresStore,
    config: &Config,
) -> Router {
    let state = AppState {
        db: db.clone(),
        templates: Arc::new(setup_templates()),
        mailer,
        letterhead: Arc::new(letterhead),
        images: ImageStore::new(STATIC_DIR),
    };

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(1)));

    // Auth service.
    //
    // This combines the session layer with our backend to establish the auth
    // service which will provide the auth session as a request extension.
    let backend = Backend::new(db);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    let volunteer_area = Router::new()
        .route("/volunteers", get(volunteers::home))
        .route("/volunteers/signups/all-time", get(volunteers::all_time))
        .nest(
            "/volunteers",
            signups::router().layer(Extension(Surface::Volunteer)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::volunteer_gate,
        ));

    let teacher_area = Router::new()
        .route("/teachers", get(teachers::home))
        .route(
            "/teachers/reward-signup",
            get(teachers::rewards).post(teachers::claim_reward),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::teacher_gate,
        ));

    let admin_area = Router::new()
        .route("/admin", get(admin::index))
        .route("/admin/volunteers", get(admin::volunteers))
        .route(
            "/admin/volunteers/add",
            get(admin::add_volunteer_page).post(admin::add_volunteer),
        )
        .route("/admin/volunteers/delete", post(admin::delete_volunteer))
        .route(
            "/admin/codes/{audience}",
            get(admin::code_page).post(admin::issue_code),
        )
        .route("/admin/push-to-teachers", post(admin::push_to_teachers))
        .route("/admin/deadlines", get(admin::deadline_list))
        .route(
            "/admin/deadlines/new",
            get(admin::new_deadline_page).post(admin::create_deadline),
        )
        .route(
            "/admin/deadlines/{id}",
            get(admin::edit_deadline_page).post(admin::edit_deadline),
        )
        .route("/admin/recipes", get(admin::recipes))
        .route(
            "/admin/recipes/{id}",
            get(admin::edit_recipe_page)
                .post(admin::edit_recipe)
                .layer(DefaultBodyLimit::max(recipes::UPLOAD_LIMIT)),
        )
        .route("/admin/rankings", get(admin::rankings))
        .route("/admin/send-emails", post(admin::send_emails))
        .nest("/admin", signups::router().layer(Extension(Surface::Admin)))
        .route_layer(login_required!(Backend, login_url = "/admin/login"));

    Router::new()
        .route("/", get(index))
        .route(
            "/volunteers/enter-code",
            get(gate::volunteer_code_page).post(gate::volunteer_code_submit),
        )
        .route(
            "/teachers/enter-code",
            get(gate::teacher_code_page).post(gate::teacher_code_submit),
        )
        .route("/recipes", get(recipes::list))
        .route("/recipes/{id}", get(recipes::view))
        .route(
            "/recipes/upload",
            get(recipes::upload_page)
                .post(recipes::upload)
                .layer(DefaultBodyLimit::max(recipes::UPLOAD_LIMIT)),
        )
        .merge(volunteer_area)
        .merge(teacher_area)
        .merge(admin_area)
        .merge(auth_router::router())
        .with_state(state)
        .nest_service("/static", get_service(ServeDir::new(STATIC_DIR)))
        .layer(auth_layer)
        .layer(TraceLayer::new_for_http())
}

/// `Thursday, April 10` for an ISO date, anything else passes through.
fn long_date(value: String) -> String {
    value
        .parse::<NaiveDate>()
        .map(Letterhead::format_dropoff)
        .unwrap_or(value)
}

fn setup_templates() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(minijinja::path_loader("templates"));
    env.add_filter("long_date", long_date);
    env
}

async fn index(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.render("index.html", context! {})
}

pub async fn shutdown_signal(deletion_task_abort_handle: AbortHandle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutting down");
    deletion_task_abort_handle.abort();
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_date_filter() {
        assert_eq!(long_date("2025-04-10".into()), "Thursday, April 10");
        assert_eq!(long_date("soon".into()), "soon");
    }

    #[test]
    fn test_every_page_template_parses() {
        let env = setup_templates();
        for name in [
            "index.html",
            "enter_code.html",
            "invalid_code.html",
            "volunteers.html",
            "signups.html",
            "signups_all_time.html",
            "booking_edit.html",
            "booking_new.html",
            "teachers.html",
            "teacher_rewards.html",
            "recipes.html",
            "recipe.html",
            "recipe_upload.html",
            "admin/login.html",
            "admin/wrong_password.html",
            "admin/index.html",
            "admin/volunteers.html",
            "admin/volunteer_add.html",
            "admin/code.html",
            "admin/deadlines.html",
            "admin/deadline_form.html",
            "admin/recipes.html",
            "admin/recipe_edit.html",
            "admin/rankings.html",
            "admin/dispatch.html",
        ] {
            env.get_template(name)
                .unwrap_or_else(|e| panic!("{name}: {e}"));
        }
    }
}
