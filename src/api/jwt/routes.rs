/*
 * Responsibility
 * - /jwt 配下の URL 構造を定義
 * - 認証 (access) と role guard をここで合成する
 *   - layer は後から掛けたものが外側 → access が先に走り、次に role guard
 */
use axum::{Router, routing::get};

use crate::api::jwt::handlers::identity::{custom_claim, groups, username};
use crate::middleware::auth::{access, roles};
use crate::state::AppState;

/// Roles allowed to reach any `/jwt` route.
pub const ALLOWED_ROLES: &[&str] = &["admin", "user"];

pub fn routes(state: AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/username", get(username))
        .route("/groups", get(groups))
        .route("/customClaim", get(custom_claim));

    let router = roles::require_any_role(router, ALLOWED_ROLES);
    access::apply(router, state)
}
