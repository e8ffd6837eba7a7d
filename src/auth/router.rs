use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_login::tower_sessions::Session;
use minijinja::context;
use serde::Deserialize;
use tracing::{info, warn};

use super::user::{AuthSession, Credentials};
use crate::error::AppError;
use crate::router::AppState;

// This allows us to extract the "next" field from the query string. We use this
// to redirect after log in.
#[derive(Debug, Deserialize)]
pub struct NextUrl {
    next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    password: String,
    next: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/login",
            get(self::get::login).post(self::post::login),
        )
        .route("/admin/logout", get(self::get::logout))
}

/// Only same-site paths are honoured as a post-login destination.
fn local_path(next: Option<String>) -> String {
    next.filter(|url| url.starts_with('/') && !url.starts_with("//"))
        .unwrap_or_else(|| "/admin".to_string())
}

mod post {
    use super::*;

    pub async fn login(
        State(state): State<AppState>,
        mut auth_session: AuthSession,
        Form(LoginForm { password, next }): Form<LoginForm>,
    ) -> Result<Response, AppError> {
        if password.is_empty() {
            return Ok(Redirect::to("/admin/login").into_response());
        }

        let user = match auth_session.authenticate(Credentials { password }).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("Rejected admin password");
                let page = state.render("admin/wrong_password.html", context! {})?;
                return Ok((StatusCode::UNAUTHORIZED, page).into_response());
            }
            Err(e) => {
                tracing::error!("Admin authentication failed: {e:?}");
                return Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            }
        };

        if let Err(e) = auth_session.login(&user).await {
            tracing::error!("Admin login failed: {e:?}");
            return Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }

        info!("Admin logged in");
        Ok(Redirect::to(&local_path(next)).into_response())
    }
}

mod get {
    use super::*;

    pub async fn login(
        State(state): State<AppState>,
        Query(NextUrl { next }): Query<NextUrl>,
    ) -> Result<impl IntoResponse, AppError> {
        state.render("admin/login.html", context! { next => next })
    }

    /// Ends the admin login and drops the whole session with it, including
    /// any volunteer or teacher admission.
    pub async fn logout(
        mut auth_session: AuthSession,
        session: Session,
    ) -> Result<Response, AppError> {
        if let Err(e) = auth_session.logout().await {
            tracing::error!("Admin logout failed: {e:?}");
            return Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }
        session.flush().await?;
        Ok(Redirect::to("/").into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::testing::{get, location, post_form, session_cookie, test_auth_layer, test_state};
    use crate::routes::gate;
    use crate::workflow::access::{self, Audience};
    use crate::workflow::testing::test_db;
    use axum::{middleware, routing::post};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_logout_drops_volunteer_admission() {
        let db = test_db().await;
        access::issue(&db, Audience::Volunteer, "apple").await.expect("issue");
        let state = test_state(db.clone());
        let app = Router::new()
            .route("/volunteers", axum::routing::get(|| async { "home" }))
            .route_layer(middleware::from_fn_with_state(state.clone(), gate::volunteer_gate))
            .route("/volunteers/enter-code", post(gate::volunteer_code_submit))
            .merge(router())
            .with_state(state)
            .layer(test_auth_layer(db));

        let admitted = app
            .clone()
            .oneshot(post_form("/volunteers/enter-code", "code=apple", None))
            .await
            .expect("submit");
        let cookie = session_cookie(&admitted).expect("session cookie");
        let home = app
            .clone()
            .oneshot(get("/volunteers", Some(&cookie)))
            .await
            .expect("home");
        assert_eq!(home.status(), StatusCode::OK);

        let logged_out = app
            .clone()
            .oneshot(get("/admin/logout", Some(&cookie)))
            .await
            .expect("logout");
        assert_eq!(location(&logged_out), Some("/"));

        let home = app
            .oneshot(get("/volunteers", Some(&cookie)))
            .await
            .expect("home");
        assert_eq!(home.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&home), Some(Audience::Volunteer.entry_path()));
    }

    #[test]
    fn test_local_path_rejects_foreign_redirects() {
        assert_eq!(local_path(Some("/admin/recipes".into())), "/admin/recipes");
        assert_eq!(local_path(Some("https://evil.example".into())), "/admin");
        assert_eq!(local_path(Some("//evil.example".into())), "/admin");
        assert_eq!(local_path(None), "/admin");
    }
}
