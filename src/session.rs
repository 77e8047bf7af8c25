use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Used when no user, token or configured user is available.
pub(crate) const LOCAL_USER: &str = "local";

/// Claims checked for a user id, in order.
const USER_ID_CLAIMS: &[&str] = &["userId", "sub", "id", "user_id"];

/// The authenticated identity, passed explicitly to whatever reads or writes
/// a user's subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UserContext {
    pub(crate) user_id: String,
}

impl UserContext {
    pub(crate) fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// Pick the user from, in order: an explicit id, a bearer token, the configured user.
    /// A token that carries no usable id is an error rather than a silent fallback.
    pub(crate) fn resolve(
        explicit: Option<&str>,
        token: Option<&str>,
        configured: Option<&str>,
    ) -> Result<Self> {
        if let Some(id) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
            return Ok(Self::new(id));
        }
        if let Some(token) = token.map(str::trim).filter(|s| !s.is_empty()) {
            let id = user_id_from_token(token).context("Token does not carry a user id")?;
            tracing::debug!(user = %id, "resolved user from token");
            return Ok(Self::new(id));
        }
        if let Some(id) = configured.map(str::trim).filter(|s| !s.is_empty()) {
            return Ok(Self::new(id));
        }
        Ok(Self::new(LOCAL_USER))
    }
}

/// Read the user id out of a JWT's payload segment. The signature is not verified:
/// the id only selects which locally stored subscriptions to show.
pub(crate) fn user_id_from_token(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| tracing::warn!(error = %e, "token payload is not base64url"))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| tracing::warn!(error = %e, "token payload is not JSON"))
        .ok()?;

    USER_ID_CLAIMS.iter().find_map(|claim| match claims.get(claim)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
