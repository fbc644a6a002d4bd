use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::services::auth::{AuthError, Authenticator, SecurityCtx, VerifiedIdentity};

// Claims tried in order to resolve the principal name.
const NAME_CLAIMS: [&str; 3] = ["upn", "preferred_username", "sub"];
const GROUPS_CLAIM: &str = "groups";

// Errors returned by access-token verification.
#[derive(Debug, Error)]
pub enum AccessJwtError {
    #[error("invalid ed25519 public key pem: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("no principal name claim (upn, preferred_username, sub)")]
    MissingPrincipalName,
}

/// EdDSA (Ed25519) access-token verifier.
///
/// Signature, `exp`/`nbf`, `iss` and `aud` are checked by `jsonwebtoken`;
/// this type only maps the verified claims into a [`VerifiedIdentity`].
/// Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtAuthenticator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JwtAuthenticator")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtAuthenticator {
    pub fn new(
        access_public_key_pem: &str,
        issuer: &str,
        audience: &str,
        leeway_seconds: u64,
    ) -> Result<Self, AccessJwtError> {
        let decoding_key = DecodingKey::from_ed_pem(access_public_key_pem.as_bytes())
            .map_err(AccessJwtError::InvalidKey)?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.validate_nbf = true;
        validation.leeway = leeway_seconds;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Verify a JWT and build the identity it carries.
    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity, AccessJwtError> {
        let data = jsonwebtoken::decode::<Map<String, Value>>(
            token,
            &self.decoding_key,
            &self.validation,
        )?;

        identity_from_claims(data.claims)
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    fn name(&self) -> &'static str {
        "jwt"
    }

    async fn authenticate(&self, token: &str) -> Result<SecurityCtx, AuthError> {
        let identity = self.verify(token)?;
        Ok(SecurityCtx::from_identity(identity))
    }
}

fn identity_from_claims(claims: Map<String, Value>) -> Result<VerifiedIdentity, AccessJwtError> {
    let name = NAME_CLAIMS
        .iter()
        .find_map(|key| {
            claims
                .get(*key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .map(str::to_string)
        .ok_or(AccessJwtError::MissingPrincipalName)?;

    // groups は文字列配列のみ採用（それ以外の要素は無視）
    let groups: BTreeSet<String> = claims
        .get(GROUPS_CLAIM)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let expires_at = claims
        .get("exp")
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    let identity = VerifiedIdentity::new(name, groups, claims);

    Ok(match expires_at {
        Some(at) => identity.with_expiry(at),
        None => identity,
    })
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::test_keys::*;
    use super::*;

    fn authenticator() -> JwtAuthenticator {
        JwtAuthenticator::new(PUBLIC_KEY_PEM, ISSUER, AUDIENCE, 0).unwrap()
    }

    fn claims(extra: Value) -> Value {
        let mut base = json!({
            "iss": ISSUER,
            "aud": AUDIENCE,
            "sub": "4f2c3b1e",
            "exp": now() + 600,
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        base
    }

    #[test]
    fn valid_token_maps_name_groups_and_claims() {
        let token = sign(&claims(json!({
            "upn": "alice",
            "groups": ["ops", "dev", 7],
            "customClaim": "gold",
        })));

        let identity = authenticator().verify(&token).unwrap();

        assert_eq!(identity.name(), "alice");
        assert_eq!(
            identity.groups().iter().cloned().collect::<Vec<_>>(),
            vec!["dev".to_string(), "ops".to_string()]
        );
        assert_eq!(identity.claim("customClaim"), Some(&json!("gold")));
        assert!(identity.expires_at().is_some());
    }

    #[test]
    fn name_falls_back_to_preferred_username_then_sub() {
        let token = sign(&claims(json!({ "preferred_username": "bob" })));
        assert_eq!(authenticator().verify(&token).unwrap().name(), "bob");

        let token = sign(&claims(json!({ "upn": "  ", "preferred_username": "bob" })));
        assert_eq!(authenticator().verify(&token).unwrap().name(), "bob");

        let token = sign(&claims(json!({})));
        let identity = authenticator().verify(&token).unwrap();
        assert_eq!(identity.name(), "4f2c3b1e");
        assert!(identity.groups().is_empty());
    }

    #[test]
    fn empty_subject_without_other_names_is_rejected() {
        let token = sign(&claims(json!({ "sub": "" })));

        let err = authenticator().verify(&token).unwrap_err();
        assert!(matches!(err, AccessJwtError::MissingPrincipalName));
    }

    #[test]
    fn token_signed_with_another_key_is_rejected() {
        let token = sign_with(OTHER_PRIVATE_KEY_PEM, &claims(json!({ "upn": "alice" })));

        let err = authenticator().verify(&token).unwrap_err();
        assert!(matches!(err, AccessJwtError::Jwt(_)));
    }

    #[test]
    fn issuer_audience_and_expiry_are_enforced() {
        let wrong_iss = sign(&claims(json!({ "iss": "https://evil.test" })));
        let wrong_aud = sign(&claims(json!({ "aud": "someone-else" })));
        let expired = sign(&claims(json!({ "exp": now() - 3600 })));

        for token in [wrong_iss, wrong_aud, expired] {
            assert!(matches!(
                authenticator().verify(&token),
                Err(AccessJwtError::Jwt(_))
            ));
        }
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(authenticator().verify("not-a-jwt").is_err());
    }

    #[test]
    fn invalid_public_key_is_reported() {
        let err = JwtAuthenticator::new("not a pem", ISSUER, AUDIENCE, 0).unwrap_err();
        assert!(matches!(err, AccessJwtError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn authenticate_uses_groups_as_roles() {
        let token = sign(&claims(json!({ "upn": "alice", "groups": ["admin"] })));

        let ctx = authenticator().authenticate(&token).await.unwrap();

        assert_eq!(ctx.principal().name(), "alice");
        assert!(ctx.is_user_in_role("admin"));
        assert!(!ctx.is_user_in_role("user"));
    }

    #[tokio::test]
    async fn authenticate_reports_rejections_as_invalid_token() {
        let token = sign_with(OTHER_PRIVATE_KEY_PEM, &claims(json!({ "upn": "alice" })));

        let err = authenticator().authenticate(&token).await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::InvalidToken(AccessJwtError::Jwt(_))
        ));
    }
}
