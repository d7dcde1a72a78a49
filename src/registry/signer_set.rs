//! A bounded, insertion-ordered set of principals.
//!
//! Both halves of the threshold approval machinery accumulate principals into
//! one of these: validators signing an attestation, guardians approving a
//! recovery. Insertion order is preserved for auditing, membership is unique,
//! and the set never grows past [`MAX_SIGNERS`].

use crate::{
    error::{Error, Result},
    registry::PrincipalId,
};
use serde_derive::{Serialize, Deserialize};

/// Hard capacity of every signer/approver set. The eleventh distinct signer
/// on a record is rejected with [`Error::CapacityExceeded`].
pub const MAX_SIGNERS: usize = 10;

/// The set itself. Wraps a vec so iteration yields members in the order they
/// signed; `push` enforces uniqueness and the capacity bound.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignerSet {
    members: Vec<PrincipalId>,
}

impl SignerSet {
    /// Create a set holding a single initial member.
    pub fn with_initial(member: PrincipalId) -> Self {
        Self { members: vec![member] }
    }

    /// Add a member. Fails `AlreadyExists` on a duplicate and
    /// `CapacityExceeded` when full; the set is unchanged in either case.
    pub fn push(&mut self, member: PrincipalId) -> Result<()> {
        if self.members.contains(&member) {
            Err(Error::AlreadyExists)?;
        }
        if self.members.len() >= MAX_SIGNERS {
            Err(Error::CapacityExceeded)?;
        }
        self.members.push(member);
        Ok(())
    }

    /// The logical size of the set. This *is* the signer/approver count;
    /// there is no separately-maintained counter to drift out of sync.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if the set holds no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Membership test.
    pub fn contains(&self, member: &PrincipalId) -> bool {
        self.members.contains(member)
    }

    /// Iterate members in signing order.
    pub fn iter(&self) -> std::slice::Iter<'_, PrincipalId> {
        self.members.iter()
    }
}
