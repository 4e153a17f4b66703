//! Access decisions returned by policies.

use serde::{Deserialize, Serialize};
use toolforge_primitives::{AccessLevel, Tier};

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessDecision {
    /// Invocation may proceed.
    Allow,
    /// Invocation is rejected.
    Deny {
        /// Tier the caller was evaluated at.
        tier: Tier,
        /// Level the tool demands.
        required: AccessLevel,
    },
}

impl AccessDecision {
    /// Returns true when the decision allows the invocation.
    #[must_use]
    pub const fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns true when the decision denies the invocation.
    #[must_use]
    pub const fn is_deny(self) -> bool {
        matches!(self, Self::Deny { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_helpers_work() {
        assert!(AccessDecision::Allow.is_allow());
        let deny = AccessDecision::Deny {
            tier: Tier::Normal,
            required: AccessLevel::Admin,
        };
        assert!(deny.is_deny());
        assert!(!deny.is_allow());
    }

    #[test]
    fn deny_serializes_levels() {
        let deny = AccessDecision::Deny {
            tier: Tier::Anonymous,
            required: AccessLevel::Premium,
        };
        let json = serde_json::to_value(deny).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "kind": "deny", "tier": "anonymous", "required": "premium" })
        );
    }
}
