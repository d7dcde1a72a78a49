//! Welcome to the Anchor core, a ledger-resident identity and attestation
//! registry.
//!
//! An identity here is anchored by an opaque fingerprint: a merkle root over
//! a set of attributes its owner never has to disclose. A fixed, admin-
//! managed set of trusted validators attests to claims about identities, and
//! an owner-appointed set of guardians can recover an identity whose keys
//! are lost.
//!
//! Both of those features ride the same mechanism, and that mechanism is the
//! point of this crate: a threshold multi-party approval record. Approvers
//! accumulate one by one into a bounded, insertion-ordered set, and the
//! moment the set reaches the threshold in effect for that call the record
//! flips -- a claim becomes verified, or a recovery becomes executable and
//! the identity is atomically rekeyed. Flipped records never flip back.
//!
//! A few things this crate deliberately does not do:
//!
//! 1. No cryptographic verification. "Signatures" are recorded principal
//!    identities; whoever hosts the registry decides what a call proves
//!    about its caller.
//! 1. No proof checking. Attribute proofs are opaque hashes a validator
//!    chose to vouch for.
//! 1. No consensus or broadcast. Every operation is a single synchronous
//!    step against state the hosting ledger already serializes; a non-ledger
//!    host reproduces that by wrapping the [`Registry`][registry::Registry]
//!    in a mutex.

pub mod error;
#[macro_use]
pub mod util;
pub mod registry;
