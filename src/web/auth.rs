//! Login and logout pages.

use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::{info, warn};

use super::{AppState, WebError, views};
use crate::clients::ClientError;
use crate::session;

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

fn login_page(email: &str, banner: Option<&str>) -> String {
    let banner_html = banner.map_or(String::new(), |msg| {
        format!(r#"<div class="banner-error">{}</div>"#, views::esc(msg))
    });

    let body = format!(
        r#"{banner_html}
<form method="post" action="/auth/login">
  {email_field}
  {password_field}
  <button type="submit">Sign in</button>
</form>"#,
        email_field = views::text_field("Email", "email", email, "email", None),
        password_field = views::text_field("Password", "password", "", "password", None),
    );

    views::page("Sign in", None, &body)
}

/// GET /auth/login
pub async fn login_form(session: Session) -> Result<Response, WebError> {
    // Already holding a token pair: nothing to sign in for.
    if session::access_token(&session).await?.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    Ok(Html(login_page("", None)).into_response())
}

/// POST /auth/login: exchange credentials upstream and stash the token pair
/// in the session.
pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(login_page(&form.email, Some("Email and password are required"))),
        )
            .into_response());
    }

    let cancel = state.cancel_token();
    match state
        .auth
        .sign_in(form.email.trim(), &form.password, &cancel)
        .await
    {
        Ok(tokens) => {
            session::store_tokens(&session, &tokens, &state.user_cache).await?;
            info!("Operator signed in");
            Ok(Redirect::to("/dashboard").into_response())
        }
        Err(ClientError::Status { status, .. })
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
        {
            Ok((
                StatusCode::UNAUTHORIZED,
                Html(login_page(&form.email, Some("Invalid email or password"))),
            )
                .into_response())
        }
        Err(e) => Err(WebError::Upstream(e)),
    }
}

/// GET /auth/logout: sign out upstream, then clear the token pair.
///
/// On upstream failure the pair is left exactly as it was and the failure is
/// shown instead of silently pretending the session ended.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, WebError> {
    let Some(token) = session::access_token(&session).await? else {
        return Ok(Redirect::to("/auth/login").into_response());
    };

    let cancel = state.cancel_token();
    match state.auth.sign_out(&token, &cancel).await {
        Ok(()) => {
            session::clear_tokens(&session, &state.user_cache).await?;
            info!("Operator signed out");
            Ok(Redirect::to("/auth/login").into_response())
        }
        Err(e) => {
            warn!("Sign-out failed, keeping session tokens: {e}");
            let body = r#"<div class="state">
  <p>Sign-out failed; your session is still active.</p>
  <p><a href="/auth/logout">Try again</a> or <a href="/dashboard">go back to the dashboard</a>.</p>
</div>"#;
            Ok((
                StatusCode::BAD_GATEWAY,
                Html(views::page("Sign out", None, body)),
            )
                .into_response())
        }
    }
}
