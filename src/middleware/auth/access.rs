//! access token 検証 → SecurityCtx を extensions に入れる
//!
//! - `Authorization: Bearer <token>` を取り出し、`AppState.auth` (Authenticator) に渡す
//! - 成功時は SecurityCtx を request extensions に格納し、handler は extractor で受け取る
//! - 失敗時は handler に到達させず 401

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// 認証を掛けるための middleware を適用する。
///
/// 例：
/// ```ignore
/// let jwt = api::jwt::routes(state.clone());
/// app = app.nest("/jwt", middleware::auth::access::apply(jwt, state.clone()));
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req).ok_or_else(|| {
        tracing::debug!("missing or malformed bearer token");
        AppError::Unauthorized
    })?;

    let ctx = match state.auth.authenticate(token).await {
        Ok(ctx) => ctx,
        Err(err) => {
            tracing::warn!(
                error = %err,
                authenticator = state.auth.name(),
                "access token verification failed"
            );
            return Err(AppError::Unauthorized);
        }
    };

    tracing::debug!(
        principal = ctx.principal().name(),
        expires_at = ?ctx.principal().as_jwt().and_then(|id| id.expires_at()),
        "request authenticated"
    );

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
