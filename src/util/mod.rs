//! Utilities shared across the registry: opaque id types, the logical clock,
//! and serialization helpers.

use serde_derive::{Serialize, Deserialize};
use std::ops::Deref;

pub mod ser;

/// Generates an opaque 32-byte identifier type. Ids are never decoded or
/// interpreted by the registry; they only need equality, hashing, and a
/// human-readable (base64) string form.
macro_rules! object_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde_derive::Serialize, serde_derive::Deserialize)]
        pub struct $name(#[serde(with = "crate::util::ser::fixed_bytes")] [u8; 32]);

        impl $name {
            /// Create an id from raw bytes.
            pub fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        #[cfg(test)]
        #[allow(dead_code)]
        impl $name {
            pub(crate) fn blank() -> Self {
                Self([0u8; 32])
            }

            pub(crate) fn random() -> Self {
                use rand::RngCore;
                let mut bytes = [0u8; 32];
                rand::rngs::OsRng.fill_bytes(&mut bytes);
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl std::convert::TryFrom<&$name> for String {
            type Error = crate::error::Error;
            fn try_from(id: &$name) -> std::result::Result<String, Self::Error> {
                Ok(crate::util::ser::base64_encode(&id.0))
            }
        }

        impl std::convert::TryFrom<&str> for $name {
            type Error = crate::error::Error;
            fn try_from(id_str: &str) -> std::result::Result<Self, Self::Error> {
                let bytes = crate::util::ser::base64_decode(id_str.as_bytes())?;
                let inner: [u8; 32] = std::convert::TryInto::try_into(bytes.as_slice())
                    .map_err(|_| crate::error::Error::InvalidLength)?;
                Ok(Self(inner))
            }
        }
    }
}

/// A logical clock value: the hosting ledger's block height.
///
/// All time-windowed state in the registry (recovery expiry, mainly) compares
/// against a height the caller passes in at call time. There are no wall
/// clocks and no background timers; an expired record is never evicted, it
/// just becomes permanently rejectable.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockHeight(u64);

impl BlockHeight {
    /// Create a height from a raw block number.
    pub fn new(height: u64) -> Self {
        Self(height)
    }

    /// The height `blocks` blocks after this one.
    pub fn advanced(&self, blocks: u64) -> Self {
        Self(self.0.saturating_add(blocks))
    }
}

impl Deref for BlockHeight {
    type Target = u64;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u64> for BlockHeight {
    fn from(height: u64) -> Self {
        Self(height)
    }
}
