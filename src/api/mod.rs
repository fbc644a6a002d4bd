/*
 * Responsibility
 * - HTTP API の入口 (routes の re-export)
 * - /health は認証なし、/jwt 配下は認証 + role guard 付き
 */
pub mod health;
pub mod jwt;
