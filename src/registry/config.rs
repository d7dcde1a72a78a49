//! The global threshold configuration: the minimum-validator quorum used as
//! the default for claim attestation.
//!
//! This is an explicit value object handed to whoever needs it, not ambient
//! global state; tests can spin up as many configs with as many quorum values
//! as they like without sharing fixtures.

use crate::{
    error::{Error, Result},
    util::BlockHeight,
};
use getset;
use serde_derive::{Serialize, Deserialize};

/// Process-wide quorum settings. Admin-mutable through the
/// [`Registry`][crate::registry::Registry] facade.
#[derive(Debug, Clone, Serialize, Deserialize, getset::Getters, getset::MutGetters)]
#[getset(get = "pub", get_mut = "pub(crate)")]
pub struct ThresholdConfig {
    /// Minimum number of distinct validator signatures for a claim to
    /// auto-verify, unless a caller passes an explicit quorum.
    min_validators: u32,
    /// Block at which the quorum was last changed.
    updated_at: BlockHeight,
}

impl ThresholdConfig {
    /// Create a config. A zero quorum is never meaningful.
    pub fn new(min_validators: u32, now: BlockHeight) -> Result<Self> {
        if min_validators == 0 {
            Err(Error::InvalidThreshold)?;
        }
        Ok(Self { min_validators, updated_at: now })
    }

    /// Change the minimum-validator quorum. Raising it never retroactively
    /// un-verifies records that crossed the old quorum; verification is
    /// computed at append time only.
    pub fn set_min_validators(&mut self, min_validators: u32, now: BlockHeight) -> Result<()> {
        if min_validators == 0 {
            Err(Error::InvalidThreshold)?;
        }
        self.min_validators = min_validators;
        self.updated_at = now;
        Ok(())
    }
}
