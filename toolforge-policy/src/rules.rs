//! The tier rules, as plain functions.

use toolforge_primitives::{AccessLevel, Identity, Tier, ToolDescriptor};

/// Role granting [`Tier::Admin`] under the default mapping.
pub const ADMIN_ROLE: &str = "admin";
/// Role granting [`Tier::Premium`] under the default mapping.
pub const PREMIUM_ROLE: &str = "premium";

/// Derives a caller's tier from its roles using the default role names.
///
/// No identity, or an identity without roles, is anonymous. Otherwise the
/// highest matching role among admin and premium wins, else normal.
#[must_use]
pub fn tier_of(identity: Option<&Identity>) -> Tier {
    match identity {
        None => Tier::Anonymous,
        Some(identity) if identity.roles().is_empty() => Tier::Anonymous,
        Some(identity) if identity.has_role(ADMIN_ROLE) => Tier::Admin,
        Some(identity) if identity.has_role(PREMIUM_ROLE) => Tier::Premium,
        Some(_) => Tier::Normal,
    }
}

/// Returns the level a descriptor demands.
///
/// A missing descriptor falls back to [`AccessLevel::Normal`], the least
/// restrictive level. This keeps tools with broken metadata reachable; it
/// is a deliberate, security-relevant choice. Invalid declared levels were
/// already coerced to normal when the descriptor was built.
#[must_use]
pub fn required_level_of(descriptor: Option<&ToolDescriptor>) -> AccessLevel {
    descriptor.map_or(AccessLevel::Normal, ToolDescriptor::access_level)
}

/// Decides whether `tier` may invoke a tool requiring `required`.
#[must_use]
pub const fn allowed(tier: Tier, required: AccessLevel) -> bool {
    match tier {
        Tier::Admin => true,
        Tier::Premium => matches!(required, AccessLevel::Normal | AccessLevel::Premium),
        Tier::Normal | Tier::Anonymous => matches!(required, AccessLevel::Normal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_derivation() {
        assert_eq!(tier_of(None), Tier::Anonymous);
        assert_eq!(tier_of(Some(&Identity::new("nobody"))), Tier::Anonymous);
        assert_eq!(
            tier_of(Some(&Identity::new("u").with_role("user"))),
            Tier::Normal
        );
        assert_eq!(
            tier_of(Some(&Identity::new("u").with_role("premium"))),
            Tier::Premium
        );
        assert_eq!(
            tier_of(Some(&Identity::new("u").with_roles(["premium", "ADMIN"]))),
            Tier::Admin
        );
    }

    #[test]
    fn access_grid_matches_rule() {
        use AccessLevel::{Admin, Normal, Premium};

        let expected = [
            (Tier::Anonymous, [true, false, false]),
            (Tier::Normal, [true, false, false]),
            (Tier::Premium, [true, true, false]),
            (Tier::Admin, [true, true, true]),
        ];

        for (tier, row) in expected {
            for (required, want) in [Normal, Premium, Admin].into_iter().zip(row) {
                assert_eq!(allowed(tier, required), want, "{tier} -> {required}");
            }
        }
    }

    #[test]
    fn widening_tier_never_revokes() {
        for required in AccessLevel::ALL {
            for pair in Tier::ALL.windows(2) {
                let (narrow, wide) = (pair[0], pair[1]);
                assert!(
                    !allowed(narrow, required) || allowed(wide, required),
                    "{wide} lost access to {required} granted to {narrow}"
                );
            }
        }
    }

    #[test]
    fn missing_descriptor_requires_normal() {
        assert_eq!(required_level_of(None), AccessLevel::Normal);

        let descriptor = ToolDescriptor::builder("admin-only")
            .access_level(AccessLevel::Admin)
            .build()
            .unwrap();
        assert_eq!(required_level_of(Some(&descriptor)), AccessLevel::Admin);
    }
}
