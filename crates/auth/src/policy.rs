//! Access policy: one reusable predicate per resource type.
//!
//! Every data access runs through one of these functions before the service
//! layer touches the store. The rules are pure (no IO, no panics) so they are
//! both auditable and unit-testable in isolation.
//!
//! The visibility model is two-sided: admins see and mutate everything;
//! shareholder principals see only records linked to their own user account.
//! A denial is always `Forbidden` — ownership checks never masquerade as
//! `NotFound`, so a shareholder probing a foreign id learns the record exists
//! but not its contents.

use captable_core::UserId;
use thiserror::Error;

use crate::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
}

/// Admin-only operations (registry writes, issuance, audit trail reads).
pub fn require_admin(principal: &Principal) -> Result<(), AccessError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(AccessError::Forbidden("admin role required"))
    }
}

/// A shareholder record is visible to any admin and to the user it links to.
pub fn can_view_shareholder(
    principal: &Principal,
    linked_user_id: UserId,
) -> Result<(), AccessError> {
    if principal.is_admin() || principal.user_id == linked_user_id {
        Ok(())
    } else {
        Err(AccessError::Forbidden("not your shareholder record"))
    }
}

/// An issuance is visible under the same rule as the shareholder it belongs
/// to; `owner_user_id` is the user linked to that shareholder.
pub fn can_view_issuance(principal: &Principal, owner_user_id: UserId) -> Result<(), AccessError> {
    if principal.is_admin() || principal.user_id == owner_user_id {
        Ok(())
    } else {
        Err(AccessError::Forbidden("not your issuance"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn admin() -> Principal {
        Principal::new(UserId::new(), Role::Admin)
    }

    fn shareholder() -> Principal {
        Principal::new(UserId::new(), Role::Shareholder)
    }

    #[test]
    fn admin_passes_every_predicate() {
        let p = admin();
        let other = UserId::new();
        assert!(require_admin(&p).is_ok());
        assert!(can_view_shareholder(&p, other).is_ok());
        assert!(can_view_issuance(&p, other).is_ok());
    }

    #[test]
    fn shareholder_sees_only_own_records() {
        let p = shareholder();
        assert!(require_admin(&p).is_err());
        assert!(can_view_shareholder(&p, p.user_id).is_ok());
        assert!(can_view_shareholder(&p, UserId::new()).is_err());
        assert!(can_view_issuance(&p, p.user_id).is_ok());
        assert!(can_view_issuance(&p, UserId::new()).is_err());
    }
}
