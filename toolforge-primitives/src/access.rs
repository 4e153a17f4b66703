//! Required access levels and caller tiers.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Minimum tier a tool demands from its callers.
///
/// Declared levels outside the three valid values are coerced to
/// [`AccessLevel::Normal`], both when parsing and when deserializing a
/// descriptor. Missing levels behave the same way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Any caller may invoke the tool.
    #[default]
    Normal,
    /// Premium and admin callers only.
    Premium,
    /// Admin callers only.
    Admin,
}

impl AccessLevel {
    /// All valid levels, least restrictive first.
    pub const ALL: [Self; 3] = [Self::Normal, Self::Premium, Self::Admin];

    /// Parses a declared level, ignoring ASCII case and surrounding whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(raw))
    }

    /// Coerces an optional declared level into the valid enumeration.
    ///
    /// Missing and unrecognised values fall back to [`AccessLevel::Normal`].
    #[must_use]
    pub fn coerce(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or_default()
    }

    /// Returns the canonical lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Premium => "premium",
            Self::Admin => "admin",
        }
    }
}

impl Display for AccessLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AccessLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(Self::coerce(raw.as_ref().and_then(Value::as_str)))
    }
}

/// Authorization level of a caller, derived from its roles.
///
/// The ordering is total: `Anonymous < Normal < Premium < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// No identity, or an identity without roles.
    Anonymous,
    /// Authenticated caller without elevated roles.
    Normal,
    /// Caller holding a premium role.
    Premium,
    /// Caller holding an admin role.
    Admin,
}

impl Tier {
    /// All tiers, narrowest first.
    pub const ALL: [Self; 4] = [Self::Anonymous, Self::Normal, Self::Premium, Self::Admin];

    /// Returns the canonical lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Normal => "normal",
            Self::Premium => "premium",
            Self::Admin => "admin",
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
