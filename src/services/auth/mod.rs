pub mod access_jwt;
pub mod authenticator;
pub mod factory;
pub mod identity;

pub use access_jwt::{AccessJwtError, JwtAuthenticator};
pub use authenticator::{AuthError, Authenticator};
pub use factory::build_authenticator;
pub use identity::{Principal, SecurityCtx, VerifiedIdentity};
