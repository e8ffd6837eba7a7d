mod auth;
mod config;
mod database;
mod entities;
mod error;
mod router;
mod routes;
mod util;
mod workflow;

use std::sync::Arc;

use axum_login::tower_sessions::ExpiredDeletion;
use tokio::net::TcpListener;
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    auth::user::seed_admin,
    config::Config,
    database::setup_database,
    router::{create_router, shutdown_signal},
    workflow::notify::{Letterhead, SmtpMailer},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (db, pool) = setup_database(&config.database_url).await?;
    if let Some(password) = &config.admin_password {
        seed_admin(&db, password).await?;
    }

    let session_store = PostgresStore::new(pool);
    session_store.migrate().await?;

    let deletion_task = tokio::task::spawn(
        session_store
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(60)),
    );

    let mailer = SmtpMailer::new(&config.smtp_host, &config.email, &config.app_password)?;
    let letterhead = Letterhead::new(config.email.clone(), config.coordinator_name.clone())?;

    let app = create_router(db, Arc::new(mailer), letterhead, session_store, &config);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(deletion_task.abort_handle()))
        .await?;

    match deletion_task.await {
        Ok(result) => result?,
        Err(e) if e.is_cancelled() => {}
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
