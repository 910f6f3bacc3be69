use tracing::debug;

use super::requester::Requester;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
    List,
}

/// Outcome of a privilege decision.
///
/// For writes, `Restricted` means the result is computed against current
/// state but never persisted. For listings it narrows user results to
/// customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    Full,
    Restricted,
}

impl Grant {
    #[must_use]
    pub const fn is_full(self) -> bool {
        matches!(self, Self::Full)
    }
}

/// Single decision point used by every category, product and user write.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrivilegeGate;

impl PrivilegeGate {
    #[must_use]
    pub fn decide(self, requester: &Requester, operation: Operation, resource: &str) -> Grant {
        if requester.is_privileged() {
            return Grant::Full;
        }

        if operation != Operation::List {
            debug!(resource, ?operation, "Simulating write for non-privileged requester");
        }
        Grant::Restricted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::RequesterClaims;
    use crate::domain::Role;

    fn requester(role: Role) -> Requester {
        Requester::authenticated(RequesterClaims {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role,
        })
    }

    #[test]
    fn test_super_admin_gets_full_grant() {
        let gate = PrivilegeGate;
        for op in [
            Operation::Create,
            Operation::Update,
            Operation::Delete,
            Operation::List,
        ] {
            assert_eq!(gate.decide(&requester(Role::SuperAdmin), op, "category"), Grant::Full);
        }
    }

    #[test]
    fn test_others_are_restricted() {
        let gate = PrivilegeGate;
        assert_eq!(
            gate.decide(&requester(Role::Customer), Operation::Create, "product"),
            Grant::Restricted
        );
        assert_eq!(
            gate.decide(&Requester::anonymous(), Operation::Delete, "user"),
            Grant::Restricted
        );
        assert!(!gate
            .decide(&Requester::anonymous(), Operation::List, "user")
            .is_full());
    }
}
