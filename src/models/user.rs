use serde::{Deserialize, Serialize};

/// The signed-in operator, as reported by `GET /auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    /// Present in some deployments of the upstream API, absent in others.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Opaque credential pair returned by the upstream sign-in endpoint.
///
/// The refresh token is stored alongside the access token but is never used
/// to renew it; an expired access token simply sends the operator back to
/// the login page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserializes_without_status() {
        let user: User = serde_json::from_str(
            r#"{"id": 7, "name": "Ana", "email": "ana@example.com", "role": "admin"}"#,
        )
        .unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.role, "admin");
        assert!(user.status.is_none());
    }

    #[test]
    fn test_user_deserializes_with_status() {
        let user: User = serde_json::from_str(
            r#"{"id": 7, "name": "Ana", "email": "a@b.c", "role": "admin", "status": "active"}"#,
        )
        .unwrap();
        assert_eq!(user.status.as_deref(), Some("active"));
    }
}
