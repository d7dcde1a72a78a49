//! Guardian-based social recovery: an owner appoints guardians, and if
//! control of the identity is lost, a threshold of those guardians can agree
//! on a replacement fingerprint.
//!
//! Per owner this is a small state machine:
//!
//! ```text
//! NoRequest -> Pending -> { Executed | Expired }
//! ```
//!
//! A request is created by the first eligible guardian with its own
//! per-request threshold, accumulates approvals for a fixed window of
//! [`RECOVERY_WINDOW`] blocks, and once enough guardians have approved it can
//! be executed exactly once. Expiry is a block-height comparison made at call
//! time; nothing is ever evicted. In fact no request record is *ever*
//! removed, even after execution or expiry, which means recovery is
//! single-use per owner under the current contract.

use crate::{
    error::{Error, Result},
    registry::{
        signer_set::SignerSet,
        MerkleRoot, PrincipalId,
    },
    util::BlockHeight,
};
use getset;
use serde_derive::{Serialize, Deserialize};
use std::collections::HashMap;

/// How long a recovery request accepts approvals, in blocks. Roughly ten
/// days at the ledger's block cadence.
pub const RECOVERY_WINDOW: u64 = 1440;

/// A principal an owner has appointed to help recover their identity.
/// Guardianship is per-owner, not global.
#[derive(Debug, Clone, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct Guardian {
    /// Whether this guardian may currently initiate/approve recoveries.
    active: bool,
    /// Block at which the guardian was (last) appointed.
    appointed_at: BlockHeight,
}

/// Where a recovery request sits in its lifecycle. Computed from the record
/// against a caller-supplied height, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryState {
    /// Accepting approvals.
    Pending,
    /// Executed; the owner's fingerprint has been replaced. Terminal.
    Executed,
    /// The approval window closed before execution. Terminal, though the
    /// record persists.
    Expired,
}

/// An accumulating approval record for replacing one owner's fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct RecoveryRequest {
    /// The replacement fingerprint, installed on execution.
    new_root: MerkleRoot,
    /// The guardians who have approved, in approval order. The initiator is
    /// always the first member.
    approvers: SignerSet,
    /// How many distinct approvals execution requires. Fixed per request.
    threshold: u32,
    /// First block at which the request no longer accepts approvals.
    expires_at: BlockHeight,
    /// Whether the request has been executed. Monotonic: once true, never
    /// reverted.
    executed: bool,
}

impl RecoveryRequest {
    /// Number of distinct approvals so far.
    pub fn approver_count(&self) -> usize {
        self.approvers().len()
    }

    /// Where this request sits at height `now`.
    pub fn state(&self, now: BlockHeight) -> RecoveryState {
        if self.executed {
            RecoveryState::Executed
        } else if now >= self.expires_at {
            RecoveryState::Expired
        } else {
            RecoveryState::Pending
        }
    }
}

/// Per-owner guardian registry plus each owner's (single) recovery request.
#[derive(Debug, Default, Clone, Serialize, Deserialize, getset::Getters, getset::MutGetters)]
#[getset(get = "pub", get_mut = "pub(crate)")]
pub struct RecoveryConsensus {
    guardians: HashMap<PrincipalId, HashMap<PrincipalId, Guardian>>,
    requests: HashMap<PrincipalId, RecoveryRequest>,
}

impl RecoveryConsensus {
    /// Create an empty consensus tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appoint (or re-appoint) a guardian for `owner`. Re-appointing an
    /// existing guardian overwrites the record, re-activating it.
    pub fn appoint(&mut self, owner: PrincipalId, guardian_id: PrincipalId, now: BlockHeight) -> &Guardian {
        let guardian = Guardian { active: true, appointed_at: now };
        self.guardians
            .entry(owner)
            .or_insert_with(HashMap::new)
            .entry(guardian_id)
            .and_modify(|g| *g = guardian.clone())
            .or_insert(guardian)
    }

    /// Deactivate a guardian. The record is retained; the guardian simply
    /// loses the ability to initiate or approve.
    pub fn revoke(&mut self, owner: &PrincipalId, guardian_id: &PrincipalId) -> Result<()> {
        let guardian = self
            .guardians
            .get_mut(owner)
            .and_then(|g| g.get_mut(guardian_id))
            .ok_or(Error::NotFound)?;
        guardian.set_active(false);
        Ok(())
    }

    /// True if `guardian_id` is an active guardian of `owner`.
    pub fn is_guardian(&self, owner: &PrincipalId, guardian_id: &PrincipalId) -> bool {
        self.guardians
            .get(owner)
            .and_then(|g| g.get(guardian_id))
            .map_or(false, |g| *g.active())
    }

    /// Look up a guardian record.
    pub fn guardian(&self, owner: &PrincipalId, guardian_id: &PrincipalId) -> Option<&Guardian> {
        self.guardians.get(owner).and_then(|g| g.get(guardian_id))
    }

    /// Look up an owner's recovery request, whatever state it is in.
    pub fn request(&self, owner: &PrincipalId) -> Option<&RecoveryRequest> {
        self.requests.get(owner)
    }

    /// Open a recovery request proposing `new_root` as `owner`'s replacement
    /// fingerprint. The initiator must be an active guardian and counts as
    /// the first approver.
    ///
    /// Fails `AlreadyExists` if *any* request record exists for the owner --
    /// pending, executed, or expired. A spent request permanently occupies
    /// the owner's slot.
    pub fn initiate(&mut self, owner: PrincipalId, new_root: MerkleRoot, threshold: u32, initiator: PrincipalId, now: BlockHeight) -> Result<&RecoveryRequest> {
        if !self.is_guardian(&owner, &initiator) {
            Err(Error::Unauthorized)?;
        }
        if self.requests.contains_key(&owner) {
            Err(Error::AlreadyExists)?;
        }
        if threshold == 0 {
            Err(Error::InvalidThreshold)?;
        }
        let request = RecoveryRequest {
            new_root,
            approvers: SignerSet::with_initial(initiator),
            threshold,
            expires_at: now.advanced(RECOVERY_WINDOW),
            executed: false,
        };
        Ok(self.requests.entry(owner).or_insert(request))
    }

    /// Add `approver`'s approval to `owner`'s pending request.
    ///
    /// Fails `AlreadyExecuted`/`Expired` once the request is terminal,
    /// `AlreadyExists` on a repeat approver, and `CapacityExceeded` past ten
    /// approvers. The request is untouched on every failure path.
    pub fn approve(&mut self, owner: &PrincipalId, approver: PrincipalId, now: BlockHeight) -> Result<&RecoveryRequest> {
        if !self.is_guardian(owner, &approver) {
            Err(Error::Unauthorized)?;
        }
        let request = self.requests.get_mut(owner).ok_or(Error::NotFound)?;
        match request.state(now) {
            RecoveryState::Executed => Err(Error::AlreadyExecuted)?,
            RecoveryState::Expired => Err(Error::Expired)?,
            RecoveryState::Pending => {}
        }
        request.approvers_mut().push(approver)?;
        Ok(request)
    }

    /// Check that `owner`'s request could execute at height `now` without
    /// mutating anything. Split from [`mark_executed`][Self::mark_executed]
    /// so the caller can sequence every check before its first write.
    pub fn ready_to_execute(&self, owner: &PrincipalId, now: BlockHeight) -> Result<&RecoveryRequest> {
        let request = self.requests.get(owner).ok_or(Error::NotFound)?;
        match request.state(now) {
            RecoveryState::Executed => Err(Error::AlreadyExecuted)?,
            RecoveryState::Expired => Err(Error::Expired)?,
            RecoveryState::Pending => {}
        }
        if request.approver_count() < *request.threshold() as usize {
            Err(Error::InsufficientApprovals)?;
        }
        Ok(request)
    }

    /// Flip `owner`'s request to executed. Terminal.
    pub(crate) fn mark_executed(&mut self, owner: &PrincipalId) -> Result<()> {
        let request = self.requests.get_mut(owner).ok_or(Error::NotFound)?;
        request.set_executed(true);
        Ok(())
    }
}
