pub mod security_ctx;

pub use security_ctx::SecurityCtxExtractor;
