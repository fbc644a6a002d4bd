/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - Authenticator が検証して組み立て、middleware が request extensions に格納する
 *
 * Notes
 * - 署名検証や claim の妥当性チェックは Authenticator 側の責務
 * - ここは読み取り専用の型（契約）として固定する
 */
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// The caller's identity as established by a verified JWT.
///
/// - `name` は upn / preferred_username / sub から解決済みの値
/// - `groups` は BTreeSet なのでシリアライズ順が安定する
/// - `claims` は token の全 claim（生の JSON 値）
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    name: String,
    groups: BTreeSet<String>,
    claims: Map<String, Value>,
    expires_at: Option<DateTime<Utc>>,
}

impl VerifiedIdentity {
    pub fn new<I, S>(name: impl Into<String>, groups: I, claims: Map<String, Value>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            groups: groups.into_iter().map(Into::into).collect(),
            claims,
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

/// Who the authentication layer says the caller is.
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    Jwt(VerifiedIdentity),
    // Produced by authenticators that are not backed by a JWT.
    Other { name: String },
}

impl Principal {
    pub fn name(&self) -> &str {
        match self {
            Principal::Jwt(identity) => identity.name(),
            Principal::Other { name } => name,
        }
    }

    pub fn as_jwt(&self) -> Option<&VerifiedIdentity> {
        match self {
            Principal::Jwt(identity) => Some(identity),
            Principal::Other { .. } => None,
        }
    }
}

/// Per-request authorization context: the principal plus its role set.
#[derive(Debug, Clone)]
pub struct SecurityCtx {
    principal: Principal,
    roles: BTreeSet<String>,
}

impl SecurityCtx {
    pub fn new<I, S>(principal: Principal, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            principal,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// JWT callers get their `groups` as roles.
    pub fn from_identity(identity: VerifiedIdentity) -> Self {
        let roles = identity.groups().clone();
        Self::new(Principal::Jwt(identity), roles)
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn is_user_in_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.is_user_in_role(role))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn alice() -> VerifiedIdentity {
        let claims = json!({ "sub": "alice", "customClaim": "gold" })
            .as_object()
            .cloned()
            .unwrap();
        VerifiedIdentity::new("alice", ["ops", "dev"], claims)
    }

    #[test]
    fn roles_come_from_groups() {
        let ctx = SecurityCtx::from_identity(alice());

        assert!(ctx.is_user_in_role("dev"));
        assert!(ctx.is_user_in_role("ops"));
        assert!(!ctx.is_user_in_role("admin"));
        assert!(ctx.has_any_role(&["admin", "ops"]));
        assert!(!ctx.has_any_role(&["admin", "user"]));
    }

    #[test]
    fn principal_accessors() {
        let ctx = SecurityCtx::from_identity(alice());
        let identity = ctx.principal().as_jwt().unwrap();

        assert_eq!(ctx.principal().name(), "alice");
        assert_eq!(identity.claim("customClaim"), Some(&json!("gold")));
        assert_eq!(identity.claim("missing"), None);
        assert_eq!(
            identity.groups().iter().collect::<Vec<_>>(),
            vec!["dev", "ops"]
        );

        let other = Principal::Other {
            name: "svc".to_string(),
        };
        assert_eq!(other.name(), "svc");
        assert!(other.as_jwt().is_none());
    }
}
