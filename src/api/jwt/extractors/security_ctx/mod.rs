/*!
 * Security context extractor
 *
 * Responsibility:
 * - 認証済みリクエストのコンテキスト（SecurityCtx）を handler に明示的な引数として渡す
 * - 型定義は services::auth::identity 側
 */

mod core;

pub use self::core::SecurityCtxExtractor;
