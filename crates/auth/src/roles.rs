use core::str::FromStr;

use serde::{Deserialize, Serialize};

use captable_core::DomainError;

/// Role granted to a user account.
///
/// The system has exactly two roles: `admin` (full registry and ledger
/// control) and `shareholder` (read access to own records only). Authorization
/// decisions branch on this enum through the predicates in [`crate::policy`],
/// never through ad-hoc string comparisons.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Shareholder,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Shareholder => "shareholder",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "shareholder" => Ok(Role::Shareholder),
            other => Err(DomainError::validation(format!("unknown role: {other}"))),
        }
    }
}
