//! Threshold claim attestation: validators accumulate signatures on a claim
//! until a quorum verifies it.
//!
//! An attestation record is created the first time any validator signs a
//! (subject, claim) pair and is never deleted afterward. Each subsequent
//! signature appends to the record's signer set; the moment the set reaches
//! the quorum in effect *for that call*, the record flips to verified and
//! stays verified forever. Raising the global quorum later does not
//! retroactively un-verify anything.
//!
//! Note the signer set is a true set: the same validator signing twice gets
//! `AlreadyExists` rather than inflating the count.

use crate::{
    error::{Error, Result},
    registry::{
        signer_set::SignerSet,
        ClaimId, PrincipalId,
    },
    util::BlockHeight,
};
use getset;
use serde_derive::{Serialize, Deserialize};
use std::collections::HashMap;

/// What a claim asserts about its subject (an email, a domain, a KYC grade,
/// whatever the surrounding system wants). The registry treats it as an
/// opaque label, fixed at record creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimType(String);

impl ClaimType {
    /// Create a claim type label.
    pub fn new<T: Into<String>>(ty: T) -> Self {
        Self(ty.into())
    }
}

impl From<&str> for ClaimType {
    fn from(ty: &str) -> Self {
        Self(ty.into())
    }
}

/// An accumulating approval record for one (subject, claim) pair.
#[derive(Debug, Clone, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct AttestationRecord {
    /// What kind of claim this is. Immutable after creation; later
    /// attestations on the same record cannot change it.
    claim_type: ClaimType,
    /// The validators who have signed, in signing order.
    signers: SignerSet,
    /// Block at which the first signature arrived.
    created_at: BlockHeight,
    /// Whether the record has crossed its quorum. Monotonic: once true,
    /// never reverted.
    verified: bool,
}

impl AttestationRecord {
    /// Number of distinct signatures on this record.
    pub fn signer_count(&self) -> usize {
        self.signers().len()
    }
}

/// All attestation records, keyed by (subject, claim).
#[derive(Debug, Default, Clone, Serialize, Deserialize, getset::Getters, getset::MutGetters)]
#[getset(get = "pub", get_mut = "pub(crate)")]
pub struct ThresholdAttestationStore {
    records: HashMap<(PrincipalId, ClaimId), AttestationRecord>,
}

impl ThresholdAttestationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `attester`'s signature on (`subject`, `claim_id`), creating the
    /// record if this is the first signature. `quorum` is the verification
    /// threshold in effect for this call; the caller is expected to have
    /// already checked that `attester` is an active validator and that
    /// `subject` has a registered identity.
    ///
    /// Fails `AlreadyExists` if this attester already signed, and
    /// `CapacityExceeded` past ten signers; the record is untouched either
    /// way.
    pub fn attest(&mut self, subject: PrincipalId, claim_id: ClaimId, claim_type: ClaimType, attester: PrincipalId, quorum: u32, now: BlockHeight) -> Result<&AttestationRecord> {
        if quorum == 0 {
            Err(Error::InvalidThreshold)?;
        }
        let key = (subject, claim_id);
        let record = self.records.entry(key).or_insert_with(|| AttestationRecord {
            claim_type,
            signers: SignerSet::default(),
            created_at: now,
            verified: false,
        });
        record.signers_mut().push(attester)?;
        // verification is computed at append time only, and never reverted
        if !*record.verified() {
            let verified = record.signers().len() >= quorum as usize;
            record.set_verified(verified);
        }
        Ok(record)
    }

    /// Look up the record for a (subject, claim) pair.
    pub fn get(&self, subject: &PrincipalId, claim_id: &ClaimId) -> Option<&AttestationRecord> {
        self.records.get(&(subject.clone(), claim_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::signer_set::MAX_SIGNERS;

    fn attest_n(store: &mut ThresholdAttestationStore, subject: &PrincipalId, claim: &ClaimId, quorum: u32, n: usize) -> Vec<bool> {
        (0..n)
            .map(|i| {
                let record = store
                    .attest(subject.clone(), claim.clone(), "email".into(), PrincipalId::random(), quorum, BlockHeight::new(i as u64))
                    .unwrap();
                *record.verified()
            })
            .collect()
    }

    #[test]
    fn verifies_exactly_at_quorum() {
        let mut store = ThresholdAttestationStore::new();
        let subject = PrincipalId::random();
        let claim = ClaimId::random();
        let verified = attest_n(&mut store, &subject, &claim, 3, 5);
        assert_eq!(verified, vec![false, false, true, true, true]);
        assert_eq!(store.get(&subject, &claim).unwrap().signer_count(), 5);
    }

    #[test]
    fn quorum_of_one_verifies_on_creation() {
        let mut store = ThresholdAttestationStore::new();
        let subject = PrincipalId::random();
        let claim = ClaimId::random();
        let record = store
            .attest(subject.clone(), claim.clone(), "domain".into(), PrincipalId::random(), 1, BlockHeight::new(7))
            .unwrap();
        assert!(*record.verified());
        assert_eq!(record.created_at(), &BlockHeight::new(7));
    }

    #[test]
    fn raising_quorum_never_unverifies() {
        let mut store = ThresholdAttestationStore::new();
        let subject = PrincipalId::random();
        let claim = ClaimId::random();
        attest_n(&mut store, &subject, &claim, 2, 2);
        assert!(*store.get(&subject, &claim).unwrap().verified());

        // a later attestation under a stricter quorum leaves it verified
        let record = store
            .attest(subject.clone(), claim.clone(), "email".into(), PrincipalId::random(), 9, BlockHeight::new(50))
            .unwrap();
        assert!(*record.verified());
    }

    #[test]
    fn repeat_attester_rejected() {
        let mut store = ThresholdAttestationStore::new();
        let subject = PrincipalId::random();
        let claim = ClaimId::random();
        let attester = PrincipalId::random();
        store.attest(subject.clone(), claim.clone(), "email".into(), attester.clone(), 2, BlockHeight::new(1)).unwrap();

        // true-set semantics: a duplicate signature cannot inflate the count
        let res = store.attest(subject.clone(), claim.clone(), "email".into(), attester.clone(), 2, BlockHeight::new(2));
        assert_eq!(res.err(), Some(Error::AlreadyExists));
        let record = store.get(&subject, &claim).unwrap();
        assert_eq!(record.signer_count(), 1);
        assert!(!*record.verified());
    }

    #[test]
    fn eleventh_signer_rejected_record_unchanged() {
        let mut store = ThresholdAttestationStore::new();
        let subject = PrincipalId::random();
        let claim = ClaimId::random();
        attest_n(&mut store, &subject, &claim, 99, MAX_SIGNERS);

        let res = store.attest(subject.clone(), claim.clone(), "email".into(), PrincipalId::random(), 99, BlockHeight::new(11));
        assert_eq!(res.err(), Some(Error::CapacityExceeded));
        let record = store.get(&subject, &claim).unwrap();
        assert_eq!(record.signer_count(), MAX_SIGNERS);
        assert!(!*record.verified());
    }

    #[test]
    fn claim_type_fixed_at_creation() {
        let mut store = ThresholdAttestationStore::new();
        let subject = PrincipalId::random();
        let claim = ClaimId::random();
        store.attest(subject.clone(), claim.clone(), "email".into(), PrincipalId::random(), 3, BlockHeight::new(1)).unwrap();

        // a second attester naming a different type does not rewrite it
        store.attest(subject.clone(), claim.clone(), "domain".into(), PrincipalId::random(), 3, BlockHeight::new(2)).unwrap();
        assert_eq!(store.get(&subject, &claim).unwrap().claim_type(), &ClaimType::new("email"));
    }

    #[test]
    fn zero_quorum_rejected() {
        let mut store = ThresholdAttestationStore::new();
        let subject = PrincipalId::random();
        let claim = ClaimId::random();
        let res = store.attest(subject.clone(), claim.clone(), "email".into(), PrincipalId::random(), 0, BlockHeight::new(1));
        assert_eq!(res.err(), Some(Error::InvalidThreshold));
        assert!(store.get(&subject, &claim).is_none());
    }
}
