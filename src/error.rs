use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::multipart::MultipartError;
use axum_login::tower_sessions::session;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::error;

use crate::workflow::notify::MailError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid access code")]
    InvalidCode,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DbErr),

    #[error(transparent)]
    Session(#[from] session::Error),

    #[error(transparent)]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Storage(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidCode => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) | AppError::Multipart(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {self:?}");
            return (status, "Something went wrong").into_response();
        }

        (status, self.to_string()).into_response()
    }
}
