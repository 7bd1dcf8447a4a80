use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

pub mod auth;
pub mod dashboard;
mod error;
pub mod forms;
pub mod movies;
pub mod views;

pub use error::WebError;

use crate::clients::{self, AuthClient, CatalogClient};
use crate::config::Config;
use crate::fetch::CancelToken;
use crate::models::User;
use crate::session::{self, UserCache};

pub struct AppState {
    pub config: Config,

    pub auth: AuthClient,

    pub catalog: CatalogClient,

    pub user_cache: UserCache,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = clients::build_http_client(config.api.request_timeout_seconds)?;
        let base = config.api_base().to_string();

        Ok(Self {
            auth: AuthClient::new(client.clone(), base.clone()),
            catalog: CatalogClient::new(client, base),
            user_cache: UserCache::default(),
            config,
        })
    }

    /// Token handed to every upstream call made on behalf of one page view.
    /// It fires at the configured request deadline, so a late response is
    /// dropped instead of applied.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken::after(Duration::from_secs(self.config.api.request_timeout_seconds))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.config.server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            state.config.server.session_minutes,
        )));

    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route(
            "/auth/login",
            get(auth::login_form).post(auth::login_submit),
        )
        .route("/auth/logout", get(auth::logout))
        .route("/dashboard", get(dashboard::home))
        .route("/dashboard/movies", get(movies::list))
        .route(
            "/dashboard/movies/create",
            get(movies::create_form).post(movies::create_submit),
        )
        .route("/dashboard/movies/{id}", get(movies::detail))
        .route("/dashboard/movies/{id}/delete", post(movies::delete))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolve the signed-in operator or decide where the request goes instead:
/// anonymous sessions are redirected to the login page, failed lookups
/// surface as errors rather than masquerading as "not signed in".
pub(crate) async fn require_user(
    state: &AppState,
    session: &Session,
    cancel: &CancelToken,
) -> Result<Result<User, Redirect>, WebError> {
    let current = session::current_user(session, &state.auth, &state.user_cache, cancel).await;

    if let Some(error) = current.error {
        return Err(WebError::Unavailable(error));
    }

    match current.user {
        Some(user) => Ok(Ok(user)),
        None => Ok(Err(Redirect::to("/auth/login"))),
    }
}
