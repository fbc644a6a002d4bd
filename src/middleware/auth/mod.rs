//! Authentication (who is calling) and role gating (may they call this route).
pub mod access;
pub mod roles;
