//! Landing page.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{AppState, WebError, require_user, views};

/// GET /dashboard
pub async fn home(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, WebError> {
    let cancel = state.cancel_token();
    let user = match require_user(&state, &session, &cancel).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let body = format!(
        r#"<p>Welcome {name}</p>
<p>Signed in as {email} ({role}).</p>
<p><a href="/dashboard/movies">Browse the movie catalog</a></p>"#,
        name = views::esc(&user.name),
        email = views::esc(&user.email),
        role = views::esc(&user.role),
    );

    Ok(Html(views::page("Dashboard", Some(&user), &body)).into_response())
}
