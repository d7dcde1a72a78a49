//! The main error enum for the project lives here, and documents the various
//! conditions that can arise while interacting with the system.

use thiserror::Error;

/// This is our error enum. It contains an entry for any part of the system in
/// which an expectation is not met or a problem occurs.
///
/// Every registry operation either returns the new/updated record or exactly
/// one of these; a failed operation never leaves a partial mutation behind.
#[derive(Error, Debug)]
pub enum Error {
    /// A record with the given key already exists, or a principal is already
    /// a member of a signer/approver set.
    #[error("the given record or set member already exists")]
    AlreadyExists,

    /// A recovery request has already been executed and is terminal.
    #[error("recovery request already executed")]
    AlreadyExecuted,

    /// A bounded signer/approver set is full.
    #[error("signer set is at capacity")]
    CapacityExceeded,

    /// An error while decoding base64 data (usually an id string).
    #[error("base64 decode error")]
    DeserializeBase64(#[from] base64::DecodeError),

    /// A recovery request's window has closed. The record persists, but it is
    /// permanently rejectable.
    #[error("recovery request expired")]
    Expired,

    /// A byte slice of the wrong length was given for a fixed-size id, root,
    /// or proof hash.
    #[error("incorrect length for fixed-size value")]
    InvalidLength,

    /// An attribute proof failed its (purely structural) validity check.
    #[error("attribute proof is invalid")]
    InvalidProof,

    /// A quorum/threshold of zero was given.
    #[error("threshold must be greater than zero")]
    InvalidThreshold,

    /// A recovery request has not accumulated enough approvals to execute.
    #[error("not enough approvals to execute recovery")]
    InsufficientApprovals,

    /// The record being operated on wasn't found.
    #[error("record not found")]
    NotFound,

    /// The caller is not the admin/owner this operation is gated on.
    #[error("operation restricted to the owner")]
    OwnerOnly,

    /// An error while engaging in yaml serialization.
    #[error("yaml serialization error")]
    SerializeYaml(#[from] serde_yaml::Error),

    /// The caller does not hold the role (active validator, active guardian)
    /// this operation requires.
    #[error("caller is not authorized for this operation")]
    Unauthorized,
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        // cannot derive: the wrapped serialization errors are not Eq-able
        format!("{:?}", self) == format!("{:?}", other)
    }
}

/// Wraps `std::result::Result` around our `Error` enum
pub type Result<T> = std::result::Result<T, Error>;
