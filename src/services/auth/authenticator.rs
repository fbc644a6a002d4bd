//! Authentication seam between the HTTP layer and whatever verifies bearer tokens.
use async_trait::async_trait;
use thiserror::Error;

use crate::services::auth::{AccessJwtError, SecurityCtx};

/// Why an authenticator refused a token. Any variant ends as a 401.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unknown credentials")]
    UnknownCredentials,
    #[error("token rejected: {0}")]
    InvalidToken(#[from] AccessJwtError),
}

/// Turns a raw bearer token into a per-request security context.
///
/// The access middleware only talks to this trait, so the token verifier can be
/// replaced (tests, other identity providers) without touching handlers.
/// Implementations must be cheap to share (`Arc<dyn Authenticator>` in `AppState`).
#[async_trait]
pub trait Authenticator: Send + Sync {
    // Backend name (for logging).
    fn name(&self) -> &'static str;

    // Verify `token` and build the caller's context.
    //
    // Any `Err` means the request is rejected with 401 before reaching a handler.
    async fn authenticate(&self, token: &str) -> Result<SecurityCtx, AuthError>;
}
