/// Factory: build the request `Authenticator` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{AccessJwtError, Authenticator, JwtAuthenticator};

pub fn build_authenticator(config: &Config) -> Result<Arc<dyn Authenticator>, AccessJwtError> {
    let auth = JwtAuthenticator::new(
        &config.access_jwt_public_key_pem,
        &config.auth_issuer,
        &config.auth_audience,
        config.access_token_leeway_seconds,
    )?;

    tracing::debug!(?auth, "access token verifier ready");

    Ok(Arc::new(auth))
}
