//! Error types for the hash engine and scanner

use thiserror::Error;

/// Precondition and resource failures.
///
/// Running out of nonces is not an error; see [`crate::ScanOutcome::Exhausted`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("hashing blob is {len} bytes, need at least {required}")]
    BlobTooShort { len: usize, required: usize },

    #[error("nonce offset {offset} does not fit in a {len} byte blob")]
    NonceOffsetOutOfBounds { offset: usize, len: usize },

    #[error("nonce range {start}..{end} is reversed or exceeds the 32-bit nonce space")]
    InvalidRange { start: u64, end: u64 },

    #[error("failed to allocate a {bytes} byte scratchpad")]
    ScratchpadAlloc { bytes: usize },

    #[error("scratchpad sized for {have} cannot be used for {want}")]
    VariantMismatch {
        have: crate::Variant,
        want: crate::Variant,
    },

    #[error("unknown variant name")]
    UnknownVariant,
}
