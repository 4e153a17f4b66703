//! Access policy evaluation for tool dispatch.
//!
//! Callers are mapped to a [`Tier`](toolforge_primitives::Tier) from their
//! roles; tools demand an [`AccessLevel`](toolforge_primitives::AccessLevel).
//! The rule is monotonic: widening a caller's tier never revokes access.

#![warn(missing_docs, clippy::pedantic)]

pub mod decision;
pub mod engine;
pub mod rules;

pub use decision::AccessDecision;
pub use engine::{AccessPolicy, PolicyError, PolicyResult, RoleMapping, TierPolicy};
pub use rules::{allowed, required_level_of, tier_of};
