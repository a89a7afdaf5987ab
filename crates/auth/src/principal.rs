use captable_core::UserId;

use crate::Role;

/// The authenticated identity attached to a request.
///
/// Built by the HTTP layer from verified token claims; everything below the
/// routing layer receives this instead of raw tokens.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
