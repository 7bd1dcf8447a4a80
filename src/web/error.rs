use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::fmt;

use super::views;
use crate::clients::ClientError;

#[derive(Debug)]
pub enum WebError {
    /// The upstream catalog API failed or rejected the request.
    Upstream(ClientError),

    SessionError(tower_sessions::session::Error),

    /// The session could not be verified because the upstream was unreachable.
    Unavailable(String),

    BadRequest(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Upstream(e) => write!(f, "Upstream error: {e}"),
            WebError::SessionError(e) => write!(f, "Session error: {e}"),
            WebError::Unavailable(msg) => write!(f, "Upstream unavailable: {msg}"),
            WebError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<ClientError> for WebError {
    fn from(err: ClientError) -> Self {
        WebError::Upstream(err)
    }
}

impl From<tower_sessions::session::Error> for WebError {
    fn from(err: tower_sessions::session::Error) -> Self {
        WebError::SessionError(err)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebError::Upstream(ClientError::MissingCredential) => {
                return Redirect::to("/auth/login").into_response();
            }
            WebError::Upstream(ClientError::Status { status, .. })
                if *status == StatusCode::UNAUTHORIZED =>
            {
                // The token went stale upstream; start over at the login page.
                return Redirect::to("/auth/login").into_response();
            }
            WebError::Upstream(ClientError::Cancelled) => {
                tracing::warn!("Upstream request cancelled before completion");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "The catalog API took too long to respond".to_string(),
                )
            }
            WebError::Upstream(e) => {
                tracing::warn!("Catalog API error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "The catalog API is unavailable".to_string(),
                )
            }
            WebError::Unavailable(msg) => {
                tracing::warn!("Could not verify session: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "Could not verify your session against the catalog API".to_string(),
                )
            }
            WebError::SessionError(e) => {
                tracing::error!("Session error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            WebError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = format!(
            r#"<div class="state"><p>{}</p><p><a href="/dashboard">Back to dashboard</a></p></div>"#,
            views::esc(&message)
        );
        (status, Html(views::page("Something went wrong", None, &body))).into_response()
    }
}
