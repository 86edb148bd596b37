use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum Error {
    // Auth Errors
    AuthFailNotConfigured,
    AuthFailNoHeader,
    AuthFailBadCredentials,

    // Write path
    BadRequest(String),
    Internal(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::AuthFailNotConfigured
            | Error::AuthFailNoHeader
            | Error::AuthFailBadCredentials => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"Taskboard\"")],
                "Unauthorized",
            )
                .into_response(),
            // The client contract reports every write failure the same way:
            // a 500 whose body carries the error message.
            Error::BadRequest(msg) | Error::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": msg })),
            )
                .into_response(),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal(format!("{err:#}"))
    }
}
