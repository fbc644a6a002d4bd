/*
 * Responsibility
 * - GET /jwt/username, /jwt/groups, /jwt/customClaim
 * - 認証済みの SecurityCtx を読むだけ（状態を持たない、副作用なし）
 * - admin / user の role gate は routes 側の middleware で済んでいる前提
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::api::jwt::extractors::SecurityCtxExtractor;

pub const CUSTOM_CLAIM: &str = "customClaim";
pub const ADMIN_ROLE: &str = "admin";

pub async fn username(SecurityCtxExtractor(ctx): SecurityCtxExtractor) -> String {
    ctx.principal().name().to_string()
}

/// Empty 200 when the principal is not backed by a JWT.
pub async fn groups(SecurityCtxExtractor(ctx): SecurityCtxExtractor) -> Response {
    match ctx.principal().as_jwt() {
        Some(identity) => Json(identity.groups()).into_response(),
        None => absent(),
    }
}

/// Admin only, checked here on top of the route-level gate.
///
/// - string claim → text/plain
/// - other JSON → application/json
/// - absent / null → empty 200
pub async fn custom_claim(
    SecurityCtxExtractor(ctx): SecurityCtxExtractor,
) -> Result<Response, StatusCode> {
    if !ctx.is_user_in_role(ADMIN_ROLE) {
        tracing::debug!(
            principal = ctx.principal().name(),
            "custom claim denied: caller is not admin"
        );
        return Err(StatusCode::FORBIDDEN);
    }

    let claim = ctx
        .principal()
        .as_jwt()
        .and_then(|identity| identity.claim(CUSTOM_CLAIM));

    Ok(match claim {
        None | Some(Value::Null) => absent(),
        Some(Value::String(value)) => value.clone().into_response(),
        Some(other) => Json(other.clone()).into_response(),
    })
}

// Absent values (no groups set, no claim) are a 200 without an entity.
fn absent() -> Response {
    StatusCode::OK.into_response()
}
