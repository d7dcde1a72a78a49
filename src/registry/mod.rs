//! The registry module defines the data types and operations of the identity/
//! attestation registry.
//!
//! The heart of it is one mechanism worn two ways: an accumulating, bounded,
//! insertion-ordered set of principals whose size is compared against a
//! threshold. [Claim attestation][attestation] accumulates *validator*
//! signatures until a quorum verifies the claim; [social recovery][recovery]
//! accumulates *guardian* approvals until a per-request threshold lets the
//! owner's fingerprint be replaced. Everything else -- identity registration,
//! reputation, attribute proofs, cross-chain links -- is flat key-value
//! storage behind a single guard clause, kept in the
//! [identity store][identity].
//!
//! The [`Registry`] facade ties the pieces together and enforces who may call
//! what. Every mutating operation takes `&mut self` and runs all of its guard
//! checks before its first write, so each call is a single indivisible step:
//! a host that serializes calls (a ledger does; a multi-threaded host wraps
//! the registry in its own mutex) gets exactly the all-or-nothing semantics
//! the quorum counts rely on.

pub mod signer_set;
pub mod validator;
pub mod attestation;
pub mod recovery;
pub mod config;
pub mod identity;

pub use signer_set::*;
pub use validator::*;
pub use attestation::*;
pub use recovery::*;
pub use config::*;
pub use identity::*;

use crate::{
    error::{Error, Result},
    util::{ser::SerdeHuman, BlockHeight},
};
use getset;
use serde_derive::{Serialize, Deserialize};

object_id! {
    /// A principal: an owner, validator, guardian, or admin. The registry
    /// never interprets the bytes; principals are recorded identities, not
    /// verifiable cryptographic material.
    PrincipalId
}

object_id! {
    /// A unique identifier for claims.
    ClaimId
}

object_id! {
    /// An identity's fingerprint: a merkle root over its undisclosed
    /// attribute set. Opaque to the registry, never decoded.
    MerkleRoot
}

object_id! {
    /// An opaque attribute-proof hash, trusted by validator say-so.
    ProofHash
}

impl ProofHash {
    /// True if every byte is zero. The zero hash is the one structurally
    /// invalid proof value.
    pub fn is_zero(&self) -> bool {
        self.as_ref().iter().all(|b| *b == 0)
    }
}

/// The registry facade: owns every component, holds the admin principal, and
/// gates each operation on who is calling.
///
/// Gating comes in two flavors. Identity gates (`caller` must be the admin,
/// or the owner of the identity being managed) fail [`Error::OwnerOnly`];
/// role gates (`caller` must hold an active validator/guardian role) fail
/// [`Error::Unauthorized`]. Both are per-call capability checks, not locks.
#[derive(Debug, Clone, Serialize, Deserialize, getset::Getters, getset::MutGetters)]
#[getset(get = "pub", get_mut = "pub(crate)")]
pub struct Registry {
    /// The principal allowed to manage validator membership and the global
    /// quorum.
    admin: PrincipalId,
    /// Validator membership.
    validators: ValidatorRegistry,
    /// Accumulating claim attestations.
    attestations: ThresholdAttestationStore,
    /// Guardian relations and recovery requests.
    recovery: RecoveryConsensus,
    /// Registered identities and their flat per-identity storage.
    identities: IdentityStore,
    /// The global minimum-validator quorum.
    config: ThresholdConfig,
}

impl Registry {
    /// Create a registry administered by `admin`.
    pub fn new(admin: PrincipalId, config: ThresholdConfig) -> Self {
        Self {
            admin,
            validators: ValidatorRegistry::new(),
            attestations: ThresholdAttestationStore::new(),
            recovery: RecoveryConsensus::new(),
            identities: IdentityStore::new(),
            config,
        }
    }

    fn check_admin(&self, caller: &PrincipalId) -> Result<()> {
        if caller != &self.admin {
            Err(Error::OwnerOnly)?;
        }
        Ok(())
    }

    fn check_validator(&self, caller: &PrincipalId) -> Result<()> {
        if !self.validators.is_active(caller) {
            Err(Error::Unauthorized)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // validator membership / global quorum (admin-gated)
    // -------------------------------------------------------------------

    /// Register a validator. Admin only.
    pub fn register_validator(&mut self, caller: &PrincipalId, id: PrincipalId, now: BlockHeight) -> Result<&Validator> {
        self.check_admin(caller)?;
        self.validators.register(id, now)
    }

    /// Deactivate a validator. Admin only.
    pub fn deactivate_validator(&mut self, caller: &PrincipalId, id: &PrincipalId) -> Result<&Validator> {
        self.check_admin(caller)?;
        self.validators.deactivate(id)
    }

    /// Change the default attestation quorum. Admin only.
    pub fn set_min_validators(&mut self, caller: &PrincipalId, min_validators: u32, now: BlockHeight) -> Result<()> {
        self.check_admin(caller)?;
        self.config.set_min_validators(min_validators, now)
    }

    // -------------------------------------------------------------------
    // identities
    // -------------------------------------------------------------------

    /// Register `owner`'s identity, anchored by `merkle_root`.
    pub fn register_identity(&mut self, owner: PrincipalId, merkle_root: MerkleRoot, now: BlockHeight) -> Result<&IdentityRecord> {
        self.identities.register(owner, merkle_root, now)
    }

    /// Adjust an identity's reputation. Validators only.
    pub fn adjust_reputation(&mut self, caller: &PrincipalId, id: &PrincipalId, delta: i64) -> Result<i64> {
        self.check_validator(caller)?;
        self.identities.adjust_reputation(id, delta)
    }

    /// Store an attribute proof for one of `id`'s claims. Validators only.
    pub fn set_attribute_proof(&mut self, caller: &PrincipalId, id: &PrincipalId, claim_id: ClaimId, proof: ProofHash) -> Result<()> {
        self.check_validator(caller)?;
        self.identities.set_attribute_proof(id, claim_id, proof)
    }

    /// Record `owner`'s address on another chain. Owners link their own
    /// identity only.
    pub fn set_chain_link(&mut self, owner: &PrincipalId, chain: String, address: Vec<u8>) -> Result<()> {
        self.identities.set_chain_link(owner, chain, address)
    }

    // -------------------------------------------------------------------
    // claim attestation
    // -------------------------------------------------------------------

    /// Record `attester`'s signature on (`subject`, `claim_id`).
    ///
    /// The attester must be an active validator and the subject must have a
    /// registered identity. `quorum` overrides the global minimum-validator
    /// default for this call; `None` uses the default.
    pub fn attest(&mut self, attester: &PrincipalId, subject: &PrincipalId, claim_id: &ClaimId, claim_type: ClaimType, quorum: Option<u32>, now: BlockHeight) -> Result<&AttestationRecord> {
        self.check_validator(attester)?;
        if !self.identities.exists(subject) {
            Err(Error::NotFound)?;
        }
        let quorum = quorum.unwrap_or(*self.config.min_validators());
        self.attestations.attest(subject.clone(), claim_id.clone(), claim_type, attester.clone(), quorum, now)?;
        self.validators.record_attestation(attester)?;
        self.attestations.get(subject, claim_id).ok_or(Error::NotFound)
    }

    /// Look up the attestation record for a (subject, claim) pair.
    pub fn attestation(&self, subject: &PrincipalId, claim_id: &ClaimId) -> Option<&AttestationRecord> {
        self.attestations.get(subject, claim_id)
    }

    // -------------------------------------------------------------------
    // social recovery
    // -------------------------------------------------------------------

    /// Appoint a guardian for `owner`'s identity. Owners appoint for
    /// themselves only, and must have a registered identity.
    pub fn appoint_guardian(&mut self, caller: &PrincipalId, owner: &PrincipalId, guardian_id: PrincipalId, now: BlockHeight) -> Result<&Guardian> {
        if caller != owner {
            Err(Error::OwnerOnly)?;
        }
        if !self.identities.exists(owner) {
            Err(Error::NotFound)?;
        }
        Ok(self.recovery.appoint(owner.clone(), guardian_id, now))
    }

    /// Deactivate one of `owner`'s guardians. Owners revoke their own only.
    pub fn revoke_guardian(&mut self, caller: &PrincipalId, owner: &PrincipalId, guardian_id: &PrincipalId) -> Result<()> {
        if caller != owner {
            Err(Error::OwnerOnly)?;
        }
        self.recovery.revoke(owner, guardian_id)
    }

    /// Open a recovery request for `owner`, proposing `new_root` as the
    /// replacement fingerprint. Initiator must be one of `owner`'s active
    /// guardians and counts as the first approver.
    pub fn initiate_recovery(&mut self, initiator: &PrincipalId, owner: &PrincipalId, new_root: MerkleRoot, threshold: u32, now: BlockHeight) -> Result<&RecoveryRequest> {
        self.recovery.initiate(owner.clone(), new_root, threshold, initiator.clone(), now)
    }

    /// Approve `owner`'s pending recovery request.
    pub fn approve_recovery(&mut self, approver: &PrincipalId, owner: &PrincipalId, now: BlockHeight) -> Result<&RecoveryRequest> {
        self.recovery.approve(owner, approver.clone(), now)
    }

    /// Execute `owner`'s recovery: install the proposed fingerprint and
    /// close the request. Both effects land in this one call, after every
    /// check has passed -- or neither lands at all.
    pub fn execute_recovery(&mut self, owner: &PrincipalId, now: BlockHeight) -> Result<&RecoveryRequest> {
        let new_root = self.recovery.ready_to_execute(owner, now)?.new_root().clone();
        self.identities.set_merkle_root(owner, new_root, now)?;
        self.recovery.mark_executed(owner)?;
        self.recovery.request(owner).ok_or(Error::NotFound)
    }

    /// Look up `owner`'s recovery request, whatever state it is in.
    pub fn recovery_request(&self, owner: &PrincipalId) -> Option<&RecoveryRequest> {
        self.recovery.request(owner)
    }
}

impl SerdeHuman for Registry {}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (Registry, PrincipalId) {
        let admin = PrincipalId::random();
        let config = ThresholdConfig::new(3, BlockHeight::new(0)).unwrap();
        (Registry::new(admin.clone(), config), admin)
    }

    fn registry_with_validators(n: usize) -> (Registry, PrincipalId, Vec<PrincipalId>) {
        let (mut registry, admin) = registry();
        let validators: Vec<PrincipalId> = (0..n).map(|_| PrincipalId::random()).collect();
        for val in &validators {
            registry.register_validator(&admin, val.clone(), BlockHeight::new(0)).unwrap();
        }
        (registry, admin, validators)
    }

    #[test]
    fn admin_gates() {
        let (mut registry, admin) = registry();
        let rando = PrincipalId::random();
        let val = PrincipalId::random();

        let res = registry.register_validator(&rando, val.clone(), BlockHeight::new(1));
        assert_eq!(res.err(), Some(Error::OwnerOnly));
        let res = registry.set_min_validators(&rando, 5, BlockHeight::new(1));
        assert_eq!(res.err(), Some(Error::OwnerOnly));

        registry.register_validator(&admin, val.clone(), BlockHeight::new(1)).unwrap();
        let res = registry.deactivate_validator(&rando, &val);
        assert_eq!(res.err(), Some(Error::OwnerOnly));
        registry.deactivate_validator(&admin, &val).unwrap();

        registry.set_min_validators(&admin, 5, BlockHeight::new(2)).unwrap();
        assert_eq!(registry.config().min_validators(), &5);
    }

    #[test]
    fn attest_gates() {
        let (mut registry, admin, validators) = registry_with_validators(2);
        let subject = PrincipalId::random();
        let claim = ClaimId::random();

        // subject has no identity yet
        let res = registry.attest(&validators[0], &subject, &claim, "email".into(), None, BlockHeight::new(1));
        assert_eq!(res.err(), Some(Error::NotFound));

        registry.register_identity(subject.clone(), MerkleRoot::random(), BlockHeight::new(1)).unwrap();

        // non-validators cannot attest
        let res = registry.attest(&PrincipalId::random(), &subject, &claim, "email".into(), None, BlockHeight::new(2));
        assert_eq!(res.err(), Some(Error::Unauthorized));

        // neither can deactivated ones
        registry.deactivate_validator(&admin, &validators[1]).unwrap();
        let res = registry.attest(&validators[1], &subject, &claim, "email".into(), None, BlockHeight::new(2));
        assert_eq!(res.err(), Some(Error::Unauthorized));

        registry.attest(&validators[0], &subject, &claim, "email".into(), None, BlockHeight::new(2)).unwrap();
        assert_eq!(registry.validators().get(&validators[0]).unwrap().attestation_count(), &1);
    }

    // quorum=3; V1, V2, V3 attest claim C for user U; verified goes
    // false, false, true
    #[test]
    fn scenario_sequential_attestation_to_quorum() {
        let (mut registry, _admin, validators) = registry_with_validators(3);
        let subject = PrincipalId::random();
        let claim = ClaimId::random();
        registry.register_identity(subject.clone(), MerkleRoot::random(), BlockHeight::new(1)).unwrap();

        let mut flips = Vec::new();
        for val in &validators {
            let record = registry.attest(val, &subject, &claim, "kyc".into(), None, BlockHeight::new(2)).unwrap();
            flips.push(*record.verified());
        }
        assert_eq!(flips, vec![false, false, true]);
    }

    // O appoints G1..G3; G1 initiates with threshold 2; G2 approves;
    // execution installs the new root; re-initiation fails forever
    #[test]
    fn scenario_guardian_recovery() {
        let (mut registry, _admin) = registry();
        let owner = PrincipalId::random();
        let old_root = MerkleRoot::random();
        registry.register_identity(owner.clone(), old_root.clone(), BlockHeight::new(1)).unwrap();

        let guardians: Vec<PrincipalId> = (0..3).map(|_| PrincipalId::random()).collect();
        for guardian in &guardians {
            registry.appoint_guardian(&owner, &owner, guardian.clone(), BlockHeight::new(2)).unwrap();
        }

        let new_root = MerkleRoot::random();
        let request = registry
            .initiate_recovery(&guardians[0], &owner, new_root.clone(), 2, BlockHeight::new(10))
            .unwrap();
        assert_eq!(request.approver_count(), 1);
        assert_eq!(request.expires_at(), &BlockHeight::new(10 + RECOVERY_WINDOW));

        // not yet at threshold
        let res = registry.execute_recovery(&owner, BlockHeight::new(11));
        assert_eq!(res.err(), Some(Error::InsufficientApprovals));
        assert_eq!(registry.identities().get(&owner).unwrap().merkle_root(), &old_root);

        registry.approve_recovery(&guardians[1], &owner, BlockHeight::new(12)).unwrap();
        let request = registry.execute_recovery(&owner, BlockHeight::new(13)).unwrap();
        assert!(*request.executed());
        assert_eq!(request.state(BlockHeight::new(13)), RecoveryState::Executed);
        assert_eq!(registry.identities().get(&owner).unwrap().merkle_root(), &new_root);

        // executing twice is terminal, fingerprint untouched
        let res = registry.execute_recovery(&owner, BlockHeight::new(14));
        assert_eq!(res.err(), Some(Error::AlreadyExecuted));
        assert_eq!(registry.identities().get(&owner).unwrap().merkle_root(), &new_root);

        // the spent request blocks any further recovery for this owner
        let res = registry.initiate_recovery(&guardians[2], &owner, MerkleRoot::random(), 2, BlockHeight::new(15));
        assert_eq!(res.err(), Some(Error::AlreadyExists));
    }

    // threshold 0 fails InvalidThreshold and creates nothing
    #[test]
    fn scenario_zero_threshold() {
        let (mut registry, _admin) = registry();
        let owner = PrincipalId::random();
        registry.register_identity(owner.clone(), MerkleRoot::random(), BlockHeight::new(1)).unwrap();
        let guardian = PrincipalId::random();
        registry.appoint_guardian(&owner, &owner, guardian.clone(), BlockHeight::new(2)).unwrap();

        let res = registry.initiate_recovery(&guardian, &owner, MerkleRoot::random(), 0, BlockHeight::new(3));
        assert_eq!(res.err(), Some(Error::InvalidThreshold));
        assert!(registry.recovery_request(&owner).is_none());
    }

    #[test]
    fn guardian_gates() {
        let (mut registry, _admin) = registry();
        let owner = PrincipalId::random();
        let guardian = PrincipalId::random();

        // no identity: nothing to guard
        let res = registry.appoint_guardian(&owner, &owner, guardian.clone(), BlockHeight::new(1));
        assert_eq!(res.err(), Some(Error::NotFound));

        registry.register_identity(owner.clone(), MerkleRoot::random(), BlockHeight::new(1)).unwrap();

        // only the owner appoints or revokes
        let rando = PrincipalId::random();
        let res = registry.appoint_guardian(&rando, &owner, guardian.clone(), BlockHeight::new(2));
        assert_eq!(res.err(), Some(Error::OwnerOnly));
        registry.appoint_guardian(&owner, &owner, guardian.clone(), BlockHeight::new(2)).unwrap();
        let res = registry.revoke_guardian(&rando, &owner, &guardian);
        assert_eq!(res.err(), Some(Error::OwnerOnly));

        // a revoked guardian can no longer initiate
        registry.revoke_guardian(&owner, &owner, &guardian).unwrap();
        let res = registry.initiate_recovery(&guardian, &owner, MerkleRoot::random(), 1, BlockHeight::new(3));
        assert_eq!(res.err(), Some(Error::Unauthorized));
    }

    #[test]
    fn flat_store_gates() {
        let (mut registry, _admin, validators) = registry_with_validators(1);
        let owner = PrincipalId::random();
        registry.register_identity(owner.clone(), MerkleRoot::random(), BlockHeight::new(1)).unwrap();

        let rando = PrincipalId::random();
        let res = registry.adjust_reputation(&rando, &owner, 5);
        assert_eq!(res.err(), Some(Error::Unauthorized));
        assert_eq!(registry.adjust_reputation(&validators[0], &owner, 5).unwrap(), 5);

        let claim = ClaimId::random();
        let res = registry.set_attribute_proof(&rando, &owner, claim.clone(), ProofHash::random());
        assert_eq!(res.err(), Some(Error::Unauthorized));
        registry.set_attribute_proof(&validators[0], &owner, claim.clone(), ProofHash::random()).unwrap();
        assert!(registry.identities().attribute_proof(&owner, &claim).is_some());

        registry.set_chain_link(&owner, "westbridge".into(), vec![7; 20]).unwrap();
        assert_eq!(registry.identities().chain_link(&owner, "westbridge"), Some(&vec![7; 20]));
    }

    #[test]
    fn explicit_quorum_overrides_default() {
        let (mut registry, _admin, validators) = registry_with_validators(1);
        let subject = PrincipalId::random();
        let claim = ClaimId::random();
        registry.register_identity(subject.clone(), MerkleRoot::random(), BlockHeight::new(1)).unwrap();

        // global default is 3, but a per-call quorum of 1 verifies at once
        let record = registry.attest(&validators[0], &subject, &claim, "email".into(), Some(1), BlockHeight::new(2)).unwrap();
        assert!(*record.verified());
    }

    #[test]
    fn registry_serializes_human() {
        let (mut registry, _admin, validators) = registry_with_validators(1);
        let subject = PrincipalId::random();
        registry.register_identity(subject.clone(), MerkleRoot::random(), BlockHeight::new(1)).unwrap();
        registry.attest(&validators[0], &subject, &ClaimId::random(), "email".into(), Some(1), BlockHeight::new(2)).unwrap();

        let yaml = registry.serialize_human().unwrap();
        let restored = Registry::deserialize_human(yaml.as_bytes()).unwrap();
        assert_eq!(restored.admin(), registry.admin());
        assert!(restored.identities().exists(&subject));
    }
}
