//! The identity store: flat key-value records for registered identities.
//!
//! This is the external collaborator the threshold core leans on. Every
//! operation here is a narrow get/set with a single guard clause -- no
//! accumulating state, no time windows. An identity is anchored by an opaque
//! merkle root over undisclosed attributes; the store never decodes it.

use crate::{
    error::{Error, Result},
    registry::{ClaimId, MerkleRoot, PrincipalId, ProofHash},
    util::BlockHeight,
};
use getset;
use serde_derive::{Serialize, Deserialize};
use std::collections::HashMap;

/// One registered identity.
#[derive(Debug, Clone, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct IdentityRecord {
    /// The identity's fingerprint: a merkle root over its (undisclosed)
    /// attribute set. Replaced only by a successful recovery or an explicit
    /// root update.
    merkle_root: MerkleRoot,
    /// Whether the identity is live.
    active: bool,
    /// Running reputation score. Saturates rather than wrapping.
    reputation: i64,
    /// Block at which the identity was registered.
    registered_at: BlockHeight,
    /// Block at which the merkle root last changed.
    root_updated_at: BlockHeight,
    /// Attribute proofs by claim, opaque hashes trusted by validator say-so.
    proofs: HashMap<ClaimId, ProofHash>,
    /// Addresses this identity has linked on other chains, keyed by chain
    /// name.
    chain_links: HashMap<String, Vec<u8>>,
}

/// The store itself, keyed by owner principal.
#[derive(Debug, Default, Clone, Serialize, Deserialize, getset::Getters, getset::MutGetters)]
#[getset(get = "pub", get_mut = "pub(crate)")]
pub struct IdentityStore {
    identities: HashMap<PrincipalId, IdentityRecord>,
}

impl IdentityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity under `id`, anchored by `merkle_root`. Fails
    /// `AlreadyExists` if the principal already has one.
    pub fn register(&mut self, id: PrincipalId, merkle_root: MerkleRoot, now: BlockHeight) -> Result<&IdentityRecord> {
        if self.identities.contains_key(&id) {
            Err(Error::AlreadyExists)?;
        }
        let record = IdentityRecord {
            merkle_root,
            active: true,
            reputation: 0,
            registered_at: now,
            root_updated_at: now,
            proofs: HashMap::new(),
            chain_links: HashMap::new(),
        };
        Ok(self.identities.entry(id).or_insert(record))
    }

    /// True if `id` has a registered identity.
    pub fn exists(&self, id: &PrincipalId) -> bool {
        self.identities.contains_key(id)
    }

    /// True if `id` has a registered, active identity. False for unknown
    /// principals.
    pub fn is_active(&self, id: &PrincipalId) -> bool {
        self.identities.get(id).map_or(false, |rec| *rec.active())
    }

    /// Look up an identity record.
    pub fn get(&self, id: &PrincipalId) -> Option<&IdentityRecord> {
        self.identities.get(id)
    }

    /// Replace the identity's fingerprint. This is the write-back a
    /// successful recovery performs.
    pub fn set_merkle_root(&mut self, id: &PrincipalId, root: MerkleRoot, now: BlockHeight) -> Result<()> {
        let record = self.identities.get_mut(id).ok_or(Error::NotFound)?;
        record.set_merkle_root(root);
        record.set_root_updated_at(now);
        Ok(())
    }

    /// Nudge an identity's reputation by `delta`, saturating at the i64
    /// bounds. Returns the new score.
    pub fn adjust_reputation(&mut self, id: &PrincipalId, delta: i64) -> Result<i64> {
        let record = self.identities.get_mut(id).ok_or(Error::NotFound)?;
        let score = record.reputation().saturating_add(delta);
        record.set_reputation(score);
        Ok(score)
    }

    /// Store an attribute proof for a claim. The hash is opaque; the only
    /// structural check is that it isn't the zero hash.
    pub fn set_attribute_proof(&mut self, id: &PrincipalId, claim_id: ClaimId, proof: ProofHash) -> Result<()> {
        if proof.is_zero() {
            Err(Error::InvalidProof)?;
        }
        let record = self.identities.get_mut(id).ok_or(Error::NotFound)?;
        record.proofs_mut().insert(claim_id, proof);
        Ok(())
    }

    /// Look up an attribute proof.
    pub fn attribute_proof(&self, id: &PrincipalId, claim_id: &ClaimId) -> Option<&ProofHash> {
        self.identities.get(id).and_then(|rec| rec.proofs().get(claim_id))
    }

    /// Record this identity's address on another chain.
    pub fn set_chain_link(&mut self, id: &PrincipalId, chain: String, address: Vec<u8>) -> Result<()> {
        let record = self.identities.get_mut(id).ok_or(Error::NotFound)?;
        record.chain_links_mut().insert(chain, address);
        Ok(())
    }

    /// Look up a cross-chain link.
    pub fn chain_link(&self, id: &PrincipalId, chain: &str) -> Option<&Vec<u8>> {
        self.identities.get(id).and_then(|rec| rec.chain_links().get(chain))
    }
}
