//! Role guard: reject callers that hold none of the allowed roles.
//!
//! Must be layered *inside* `access::apply` so the SecurityCtx is already present.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::SecurityCtx;
use crate::state::AppState;

#[derive(Clone, Debug)]
struct AllowedRoles(Arc<[&'static str]>);

/// Only let requests through whose caller is in at least one of `roles`.
pub fn require_any_role(
    router: Router<AppState>,
    roles: &[&'static str],
) -> Router<AppState> {
    let allowed = AllowedRoles(Arc::from(roles));
    router.layer(middleware::from_fn_with_state(allowed, role_guard))
}

async fn role_guard(
    State(allowed): State<AllowedRoles>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // 認証 middleware が先に走っていなければ 401
    let ctx = req
        .extensions()
        .get::<SecurityCtx>()
        .ok_or(AppError::Unauthorized)?;

    if !ctx.has_any_role(&allowed.0) {
        tracing::debug!(
            principal = ctx.principal().name(),
            required = ?allowed.0,
            "caller holds none of the allowed roles"
        );
        return Err(AppError::Forbidden);
    }

    Ok(next.run(req).await)
}
