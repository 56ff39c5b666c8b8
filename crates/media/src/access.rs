//! Access decisions for object operations.
//!
//! | Scope | Read | Write | Delete |
//! |-------|------|-------|--------|
//! | `public` | anyone | any authenticated caller | owner |
//! | `user` | owner | owner | owner |
//!
//! Under `public`, writing only needs *some* signed-in caller: anyone may
//! drop content into another user's public namespace, but only the owner
//! may remove it.

use mediagate_authn::Identity;

use crate::resource::{AccessScope, ResourceIdentifier};

/// Operation requested on an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Fetch the object.
    Read,
    /// Create the object.
    Write,
    /// Remove the object.
    Delete,
}

/// Outcome of an access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessOutcome {
    /// The operation may proceed.
    Allowed,
    /// The operation is refused.
    Forbidden,
}

impl AccessOutcome {
    /// Returns `true` for [`AccessOutcome::Allowed`].
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Decides whether `identity` may perform `operation` on an object with the
/// given scope and owner.
#[must_use]
pub fn decide(
    identity: Option<&Identity>,
    scope: AccessScope,
    owner_id: &str,
    operation: Operation,
) -> AccessOutcome {
    let is_owner = identity.is_some_and(|id| id.subject_id() == owner_id);

    let allowed = match (scope, operation) {
        (AccessScope::Public, Operation::Read) => true,
        (AccessScope::Public, Operation::Write) => identity.is_some(),
        (AccessScope::OwnerOnly, Operation::Read | Operation::Write) | (_, Operation::Delete) => {
            is_owner
        },
    };

    if allowed { AccessOutcome::Allowed } else { AccessOutcome::Forbidden }
}

impl ResourceIdentifier {
    /// Decides whether `identity` may perform `operation` on this object.
    #[must_use]
    pub fn authorize(&self, identity: Option<&Identity>, operation: Operation) -> AccessOutcome {
        decide(identity, self.scope(), self.owner_id(), operation)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use rstest::rstest;

    use super::*;

    const OWNER: &str = "alice";

    fn caller(subject: Option<&str>) -> Option<Identity> {
        subject.map(Identity::for_subject)
    }

    #[rstest]
    // public
    #[case(AccessScope::Public, Operation::Read, None, true)]
    #[case(AccessScope::Public, Operation::Read, Some("bob"), true)]
    #[case(AccessScope::Public, Operation::Read, Some(OWNER), true)]
    #[case(AccessScope::Public, Operation::Write, None, false)]
    #[case(AccessScope::Public, Operation::Write, Some("bob"), true)]
    #[case(AccessScope::Public, Operation::Write, Some(OWNER), true)]
    #[case(AccessScope::Public, Operation::Delete, None, false)]
    #[case(AccessScope::Public, Operation::Delete, Some("bob"), false)]
    #[case(AccessScope::Public, Operation::Delete, Some(OWNER), true)]
    // owner only
    #[case(AccessScope::OwnerOnly, Operation::Read, None, false)]
    #[case(AccessScope::OwnerOnly, Operation::Read, Some("bob"), false)]
    #[case(AccessScope::OwnerOnly, Operation::Read, Some(OWNER), true)]
    #[case(AccessScope::OwnerOnly, Operation::Write, None, false)]
    #[case(AccessScope::OwnerOnly, Operation::Write, Some("bob"), false)]
    #[case(AccessScope::OwnerOnly, Operation::Write, Some(OWNER), true)]
    #[case(AccessScope::OwnerOnly, Operation::Delete, None, false)]
    #[case(AccessScope::OwnerOnly, Operation::Delete, Some("bob"), false)]
    #[case(AccessScope::OwnerOnly, Operation::Delete, Some(OWNER), true)]
    fn test_authorization_matrix(
        #[case] scope: AccessScope,
        #[case] operation: Operation,
        #[case] subject: Option<&str>,
        #[case] expected: bool,
    ) {
        let identity = caller(subject);
        let outcome = decide(identity.as_ref(), scope, OWNER, operation);
        assert_eq!(outcome.is_allowed(), expected, "{scope} {operation:?} by {subject:?}");
    }

    #[test]
    fn test_owner_match_is_exact() {
        let identity = Identity::for_subject("Alice");
        let outcome = decide(Some(&identity), AccessScope::OwnerOnly, OWNER, Operation::Read);
        assert_eq!(outcome, AccessOutcome::Forbidden);
    }

    #[test]
    fn test_authorize_uses_resource_scope_and_owner() {
        let resource = ResourceIdentifier::parse_path("/user/alice/secret.txt").unwrap();
        let bob = Identity::for_subject("bob");
        let alice = Identity::for_subject("alice");

        assert_eq!(resource.authorize(Some(&bob), Operation::Read), AccessOutcome::Forbidden);
        assert_eq!(resource.authorize(Some(&alice), Operation::Read), AccessOutcome::Allowed);
    }
}
