//! The validator registry tracks which principals are trusted to attest to
//! identity claims.
//!
//! Membership is admin-controlled (the gate itself lives on the
//! [`Registry`][crate::registry::Registry] facade). Validators are never
//! deleted: a removed validator is deactivated and its record retained for
//! audit, so its attestation history stays explicable.

use crate::{
    error::{Error, Result},
    registry::PrincipalId,
    util::BlockHeight,
};
use getset;
use serde_derive::{Serialize, Deserialize};
use std::collections::HashMap;

/// A principal trusted to attest to claims. Only `active` ever changes after
/// creation; `attestation_count` ticks up with each successful attestation.
#[derive(Debug, Clone, Serialize, Deserialize, getset::Getters, getset::MutGetters, getset::Setters)]
#[getset(get = "pub", get_mut = "pub(crate)", set = "pub(crate)")]
pub struct Validator {
    /// Whether this validator may currently attest.
    active: bool,
    /// How many attestations this validator has successfully recorded.
    attestation_count: u64,
    /// The block at which the validator was registered.
    registered_at: BlockHeight,
}

impl Validator {
    fn new(registered_at: BlockHeight) -> Self {
        Self {
            active: true,
            attestation_count: 0,
            registered_at,
        }
    }
}

/// The set of all validators, keyed by principal.
#[derive(Debug, Default, Clone, Serialize, Deserialize, getset::Getters, getset::MutGetters)]
#[getset(get = "pub", get_mut = "pub(crate)")]
pub struct ValidatorRegistry {
    validators: HashMap<PrincipalId, Validator>,
}

impl ValidatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new validator, active from the start. Fails `AlreadyExists`
    /// if the principal is already registered (even deactivated -- there is
    /// no re-activation path).
    pub fn register(&mut self, id: PrincipalId, now: BlockHeight) -> Result<&Validator> {
        if self.validators.contains_key(&id) {
            Err(Error::AlreadyExists)?;
        }
        Ok(self.validators.entry(id).or_insert(Validator::new(now)))
    }

    /// Deactivate a validator. The record is retained; it simply stops
    /// counting toward any future attestation.
    pub fn deactivate(&mut self, id: &PrincipalId) -> Result<&Validator> {
        let validator = self.validators.get_mut(id).ok_or(Error::NotFound)?;
        validator.set_active(false);
        Ok(validator)
    }

    /// True if the principal is a registered, active validator. False for
    /// unknown principals.
    pub fn is_active(&self, id: &PrincipalId) -> bool {
        self.validators.get(id).map_or(false, |v| *v.active())
    }

    /// Look up a validator record.
    pub fn get(&self, id: &PrincipalId) -> Option<&Validator> {
        self.validators.get(id)
    }

    /// Bump a validator's attestation tally after it successfully signs.
    pub(crate) fn record_attestation(&mut self, id: &PrincipalId) -> Result<()> {
        let validator = self.validators.get_mut(id).ok_or(Error::NotFound)?;
        let count = validator.attestation_count().saturating_add(1);
        validator.set_attestation_count(count);
        Ok(())
    }
}
