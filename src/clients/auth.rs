//! Client for the upstream authentication endpoints.

use serde::Serialize;
use tracing::debug;

use super::{ClientError, decode, exchange};
use crate::fetch::CancelToken;
use crate::models::{SessionTokens, User};

#[derive(Debug, Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

impl AuthClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// POST /auth/signin: exchange credentials for a token pair.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        cancel: &CancelToken,
    ) -> Result<SessionTokens, ClientError> {
        let url = format!("{}/auth/signin", self.base_url);
        let request = self
            .client
            .post(&url)
            .json(&SignInRequest { email, password });

        let body = exchange(cancel, request).await?;
        let tokens: SessionTokens = decode(&body)?;
        debug!("Signed in against {url}");
        Ok(tokens)
    }

    /// GET /auth/me: resolve the user the token belongs to.
    ///
    /// Callers are expected to short-circuit before calling this when no
    /// token is present; the session module enforces that.
    pub async fn current_user(
        &self,
        access_token: &str,
        cancel: &CancelToken,
    ) -> Result<User, ClientError> {
        let url = format!("{}/auth/me", self.base_url);
        let request = self.client.get(&url).bearer_auth(access_token);

        let body = exchange(cancel, request).await?;
        decode(&body)
    }

    /// DELETE /auth/signout: invalidate the session upstream.
    pub async fn sign_out(
        &self,
        access_token: &str,
        cancel: &CancelToken,
    ) -> Result<(), ClientError> {
        let url = format!("{}/auth/signout", self.base_url);
        let request = self.client.delete(&url).bearer_auth(access_token);

        exchange(cancel, request).await?;
        debug!("Signed out against {url}");
        Ok(())
    }
}
