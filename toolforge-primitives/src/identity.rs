//! Authenticated caller identity.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Already-verified caller identity: a subject and its role strings.
///
/// Token parsing and verification happen upstream; the runtime only reads
/// the roles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    subject: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    roles: BTreeSet<String>,
}

impl Identity {
    /// Creates an identity with no roles.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            roles: BTreeSet::new(),
        }
    }

    /// Adds a role, ignoring empty or whitespace-only strings.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.add_role(role);
        self
    }

    /// Adds multiple roles.
    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for role in roles {
            self.add_role(role);
        }
        self
    }

    /// Adds a role in place, ignoring empty or whitespace-only strings.
    pub fn add_role(&mut self, role: impl Into<String>) {
        let role = role.into();
        if !role.trim().is_empty() {
            self.roles.insert(role);
        }
    }

    /// Returns the subject identifier.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the role set.
    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Returns `true` when a role matches `role`, ignoring ASCII case.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles
            .iter()
            .any(|held| held.trim().eq_ignore_ascii_case(role.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_roles_are_ignored() {
        let identity = Identity::new("alice").with_roles(["admin", " ", ""]);
        assert_eq!(identity.roles().len(), 1);
        assert_eq!(identity.subject(), "alice");
    }

    #[test]
    fn role_lookup_ignores_case() {
        let identity = Identity::new("bob").with_role("Premium");
        assert!(identity.has_role("premium"));
        assert!(!identity.has_role("admin"));
    }
}
