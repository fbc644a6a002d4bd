use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};

use crate::services::auth::SecurityCtx;

/// Handler で SecurityCtx を受け取るための extractor
/// middleware が SecurityCtx を request.extensions() に insert 済みである前提
/// 見つからない場合は 401 を返す（認証がかかってない・ミドルウェア未設定）
pub struct SecurityCtxExtractor(pub SecurityCtx);

impl<S> FromRequestParts<S> for SecurityCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityCtx>()
            .cloned()
            .map(SecurityCtxExtractor)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
