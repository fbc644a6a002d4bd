/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (CORS / security headers / request-id / timeout など)
 * - axum::serve() で起動
 */
use std::{panic, process};

use anyhow::Result;
use axum::{Router, routing::get};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::services::auth::build_authenticator;
use crate::state::AppState;

const DEFAULT_LOG_FILTER: &str = "info,tower_http=info";

// `directive` comes from Config (RUST_LOG, .env included); otherwise a sensible default.
// Ex:
// RUST_LOG=info,jwt_identity=debug,tower_http=debug cargo run
fn log_filter(directive: Option<&str>) -> EnvFilter {
    directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn init_tracing(directive: Option<&str>) {
    tracing_subscriber::registry()
        .with(log_filter(directive))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get lost.
        tracing::error!(?info, "panic");

        // Development: crash the whole process. Production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    // Config loads .env first; tracing is configured from it.
    let config = Config::from_env()?;
    init_tracing(config.log_filter.as_deref());

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(config: &Config) -> Result<AppState> {
    let auth = build_authenticator(config)?;
    Ok(AppState::new(auth))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(api::health::health))
        .nest("/jwt", api::jwt::routes(state.clone()))
        .with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::services::auth::access_jwt::test_keys;

    fn test_config() -> Config {
        Config::from_lookup(|key| match key {
            "AUTH_ISSUER" => Some(test_keys::ISSUER.to_string()),
            "AUTH_AUDIENCE" => Some(test_keys::AUDIENCE.to_string()),
            "ACCESS_JWT_PUBLIC_KEY_PEM" => Some(test_keys::PUBLIC_KEY_PEM.to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn test_app() -> Router {
        let config = test_config();
        let state = build_state(&config).unwrap();
        build_router(state, &config)
    }

    #[test]
    fn log_filter_prefers_configured_directive() {
        let filter = log_filter(Some("warn,jwt_identity=debug")).to_string();
        assert!(filter.contains("jwt_identity=debug"), "{filter}");

        let fallback = log_filter(None).to_string();
        assert!(fallback.contains("tower_http=info"), "{fallback}");
    }

    #[test]
    fn rust_log_from_config_drives_the_filter() {
        let config = Config::from_lookup(|key| match key {
            "RUST_LOG" => Some("error,jwt_identity=trace".to_string()),
            "AUTH_ISSUER" => Some(test_keys::ISSUER.to_string()),
            "AUTH_AUDIENCE" => Some(test_keys::AUDIENCE.to_string()),
            "ACCESS_JWT_PUBLIC_KEY_PEM" => Some(test_keys::PUBLIC_KEY_PEM.to_string()),
            _ => None,
        })
        .unwrap();

        let filter = log_filter(config.log_filter.as_deref()).to_string();
        assert!(filter.contains("jwt_identity=trace"), "{filter}");
    }

    #[tokio::test]
    async fn health_is_public_and_carries_cross_cutting_headers() {
        let req = Request::builder()
            .uri("/health")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();

        let resp = test_app().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["x-request-id"], "req-42");
        assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[tokio::test]
    async fn jwt_routes_require_a_bearer_token() {
        let req = Request::builder()
            .uri("/jwt/username")
            .body(Body::empty())
            .unwrap();

        let resp = test_app().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn signed_admin_token_reads_custom_claim_through_full_stack() {
        let token = test_keys::sign(&serde_json::json!({
            "iss": test_keys::ISSUER,
            "aud": test_keys::AUDIENCE,
            "upn": "alice",
            "exp": test_keys::now() + 600,
            "groups": ["admin"],
            "customClaim": "gold",
        }));
        let req = Request::builder()
            .uri("/jwt/customClaim")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let resp = test_app().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"gold");
    }
}
