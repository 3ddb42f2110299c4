use crate::{
    error::AppError,
    models::{auth::AuthenticatedUser, user::UserRole},
};

/// Everything a route may need to check about the caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Read any player's schedule in the academy, not just one's own children.
    ViewAnyPlayer,
    /// See who answered what for a session.
    ViewAvailabilityBreakdown,
    /// Schedule sessions and see the coach overview.
    ManageSessions,
}

impl Capability {
    pub fn granted_to(self, role: UserRole) -> bool {
        match self {
            Capability::ViewAnyPlayer
            | Capability::ViewAvailabilityBreakdown
            | Capability::ManageSessions => matches!(role, UserRole::Admin | UserRole::Coach),
        }
    }
}

impl AuthenticatedUser {
    pub fn can(&self, capability: Capability) -> bool {
        capability.granted_to(self.role)
    }

    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Access denied. Coaches and admins only.".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser { user_id: 1, academy: "north".into(), role }
    }

    #[test]
    fn test_parents_hold_no_staff_capabilities() {
        let parent = user(UserRole::Parent);
        assert!(!parent.can(Capability::ViewAnyPlayer));
        assert!(!parent.can(Capability::ViewAvailabilityBreakdown));
        assert!(parent.require(Capability::ManageSessions).is_err());
    }

    #[test]
    fn test_staff_capabilities() {
        for role in [UserRole::Admin, UserRole::Coach] {
            let staff = user(role);
            assert!(staff.can(Capability::ViewAnyPlayer));
            assert!(staff.require(Capability::ManageSessions).is_ok());
        }
    }
}
