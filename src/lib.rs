/*
 * Responsibility
 * - crate の公開モジュール
 * - Authenticator / SecurityCtx / Principal を外部の認証実装からも組めるようにする
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
