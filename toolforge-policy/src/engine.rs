//! Policy engine trait and the role-to-tier implementation.

use std::collections::BTreeSet;

use thiserror::Error;
use toolforge_primitives::{AccessLevel, Identity, Tier, ToolDescriptor};
use tracing::debug;

use crate::decision::AccessDecision;
use crate::rules::{self, ADMIN_ROLE, PREMIUM_ROLE};

/// Errors surfaced while configuring a policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Role mapping configuration error.
    #[error("invalid role mapping: {0}")]
    InvalidRoleMapping(&'static str),
}

/// Result alias for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Trait implemented by access policies consulted on every dispatch.
pub trait AccessPolicy: Send + Sync {
    /// Derives the caller's tier.
    fn tier_of(&self, identity: Option<&Identity>) -> Tier;

    /// Returns the level a tool demands, given its descriptor if available.
    fn required_level_of(&self, descriptor: Option<&ToolDescriptor>) -> AccessLevel;

    /// Decides whether `tier` may invoke a tool requiring `required`.
    fn decide(&self, tier: Tier, required: AccessLevel) -> AccessDecision {
        if rules::allowed(tier, required) {
            AccessDecision::Allow
        } else {
            AccessDecision::Deny { tier, required }
        }
    }

    /// Evaluates a caller against a tool in one step.
    fn evaluate(
        &self,
        identity: Option<&Identity>,
        descriptor: Option<&ToolDescriptor>,
    ) -> AccessDecision {
        self.decide(self.tier_of(identity), self.required_level_of(descriptor))
    }
}

/// Role names that grant the elevated tiers.
///
/// Names are compared without regard to ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMapping {
    admin: BTreeSet<String>,
    premium: BTreeSet<String>,
}

impl RoleMapping {
    /// Creates a mapping from admin and premium role names.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidRoleMapping`] when either set is empty
    /// after blank names are dropped, or when a role grants both tiers.
    pub fn new<A, P, S>(admin: A, premium: P) -> PolicyResult<Self>
    where
        A: IntoIterator<Item = S>,
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let admin = normalize(admin);
        let premium = normalize(premium);

        if admin.is_empty() {
            return Err(PolicyError::InvalidRoleMapping("at least one admin role is required"));
        }
        if premium.is_empty() {
            return Err(PolicyError::InvalidRoleMapping("at least one premium role is required"));
        }
        if !admin.is_disjoint(&premium) {
            return Err(PolicyError::InvalidRoleMapping(
                "a role cannot grant both admin and premium",
            ));
        }

        Ok(Self { admin, premium })
    }

    /// Returns the admin role names.
    #[must_use]
    pub fn admin(&self) -> &BTreeSet<String> {
        &self.admin
    }

    /// Returns the premium role names.
    #[must_use]
    pub fn premium(&self) -> &BTreeSet<String> {
        &self.premium
    }

    fn grants(roles: &BTreeSet<String>, identity: &Identity) -> bool {
        roles.iter().any(|role| identity.has_role(role))
    }
}

impl Default for RoleMapping {
    fn default() -> Self {
        Self {
            admin: BTreeSet::from([ADMIN_ROLE.to_owned()]),
            premium: BTreeSet::from([PREMIUM_ROLE.to_owned()]),
        }
    }
}

fn normalize<I, S>(roles: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    roles
        .into_iter()
        .map(|role| role.as_ref().trim().to_ascii_lowercase())
        .filter(|role| !role.is_empty())
        .collect()
}

/// Policy deriving tiers from configurable role names.
///
/// The fallback level applies when a tool's descriptor is unavailable. It
/// defaults to [`AccessLevel::Normal`], which keeps such tools reachable by
/// every caller allowed normal tools; raising it is a deliberate revision.
#[derive(Debug, Clone, Default)]
pub struct TierPolicy {
    roles: RoleMapping,
    fallback_level: AccessLevel,
}

impl TierPolicy {
    /// Creates a policy with the supplied role mapping and fallback level.
    #[must_use]
    pub fn new(roles: RoleMapping, fallback_level: AccessLevel) -> Self {
        Self {
            roles,
            fallback_level,
        }
    }

    /// Returns the role mapping.
    #[must_use]
    pub fn roles(&self) -> &RoleMapping {
        &self.roles
    }

    /// Returns the level applied when a descriptor is unavailable.
    #[must_use]
    pub const fn fallback_level(&self) -> AccessLevel {
        self.fallback_level
    }
}

impl AccessPolicy for TierPolicy {
    fn tier_of(&self, identity: Option<&Identity>) -> Tier {
        let Some(identity) = identity else {
            return Tier::Anonymous;
        };
        if identity.roles().is_empty() {
            Tier::Anonymous
        } else if RoleMapping::grants(&self.roles.admin, identity) {
            Tier::Admin
        } else if RoleMapping::grants(&self.roles.premium, identity) {
            Tier::Premium
        } else {
            Tier::Normal
        }
    }

    fn required_level_of(&self, descriptor: Option<&ToolDescriptor>) -> AccessLevel {
        match descriptor {
            Some(descriptor) => descriptor.access_level(),
            None => {
                debug!(fallback = %self.fallback_level, "descriptor unavailable, using fallback level");
                self.fallback_level
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_rules() {
        let policy = TierPolicy::default();
        let identities = [
            None,
            Some(Identity::new("a")),
            Some(Identity::new("b").with_role("viewer")),
            Some(Identity::new("c").with_role("Premium")),
            Some(Identity::new("d").with_roles(["admin", "premium"])),
        ];

        for identity in &identities {
            assert_eq!(policy.tier_of(identity.as_ref()), rules::tier_of(identity.as_ref()));
        }
        assert_eq!(policy.required_level_of(None), AccessLevel::Normal);
    }

    #[test]
    fn custom_role_names() {
        let roles = RoleMapping::new(["ROLE_ADMIN"], ["role_vip", "subscriber"]).unwrap();
        let policy = TierPolicy::new(roles, AccessLevel::Normal);

        let admin = Identity::new("a").with_role("role_admin");
        let vip = Identity::new("b").with_role("Subscriber");
        let plain = Identity::new("c").with_role("admin");

        assert_eq!(policy.tier_of(Some(&admin)), Tier::Admin);
        assert_eq!(policy.tier_of(Some(&vip)), Tier::Premium);
        assert_eq!(policy.tier_of(Some(&plain)), Tier::Normal);
    }

    #[test]
    fn invalid_mappings_are_rejected() {
        assert!(RoleMapping::new(Vec::<&str>::new(), vec!["premium"]).is_err());
        assert!(RoleMapping::new(vec!["admin"], vec![" "]).is_err());
        assert!(matches!(
            RoleMapping::new(["admin"], ["ADMIN"]),
            Err(PolicyError::InvalidRoleMapping(_))
        ));
    }

    #[test]
    fn evaluate_denies_with_context() {
        let policy = TierPolicy::default();
        let descriptor = ToolDescriptor::builder("secrets")
            .access_level(AccessLevel::Admin)
            .build()
            .unwrap();

        let decision = policy.evaluate(None, Some(&descriptor));
        assert_eq!(
            decision,
            AccessDecision::Deny {
                tier: Tier::Anonymous,
                required: AccessLevel::Admin
            }
        );

        let admin = Identity::new("root").with_role("admin");
        assert!(policy.evaluate(Some(&admin), Some(&descriptor)).is_allow());
    }

    #[test]
    fn raised_fallback_applies_to_missing_descriptors() {
        let policy = TierPolicy::new(RoleMapping::default(), AccessLevel::Admin);
        let normal = Identity::new("u").with_role("user");

        assert!(policy.evaluate(Some(&normal), None).is_deny());
    }
}
