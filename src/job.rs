//! Mining jobs
//!
//! A job is a hex hashing blob, a target and the slice of nonce space to
//! search. Pools send the target either as 4 hex bytes (the compact target,
//! little-endian) or as 8 hex bytes (a 64-bit little-endian bound whose high
//! word is the compact target).

use std::ops::Range;

use thiserror::Error;

use crate::algorithm::{check_blob, check_range, read_nonce, Target, NONCE_OFFSET, NONCE_SPACE};

#[derive(Error, Debug, PartialEq)]
pub enum JobError {
    #[error("blob is not valid hex: {0}")]
    BlobHex(#[from] hex::FromHexError),

    #[error("target {0:?} is not 8 or 16 hex digits or 0x-prefixed hex")]
    Target(String),

    #[error("difficulty must be at least 1")]
    ZeroDifficulty,

    #[error(transparent)]
    Shape(#[from] crate::algorithm::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub blob: Vec<u8>,
    pub target: Target,
    pub nonce_offset: usize,
    pub range: Range<u64>,
}

impl Job {
    /// Job over the whole nonce space with the default nonce offset.
    pub fn new(blob: Vec<u8>, target: Target) -> Result<Self, JobError> {
        Self::with_layout(blob, target, NONCE_OFFSET, 0..NONCE_SPACE)
    }

    pub fn with_layout(
        blob: Vec<u8>,
        target: Target,
        nonce_offset: usize,
        range: Range<u64>,
    ) -> Result<Self, JobError> {
        check_blob(&blob, nonce_offset)?;
        check_range(&range)?;
        Ok(Self {
            blob,
            target,
            nonce_offset,
            range,
        })
    }

    /// Nonce currently written in the blob
    pub fn blob_nonce(&self) -> u32 {
        // Offset was validated on construction
        read_nonce(&self.blob, self.nonce_offset).unwrap_or(0)
    }
}

pub fn parse_blob(hex_blob: &str) -> Result<Vec<u8>, JobError> {
    Ok(hex::decode(hex_blob.trim())?)
}

/// Parse a pool target.
///
/// Accepts 8 hex digits (little-endian u32), 16 hex digits (little-endian
/// u64, high word taken) or `0x`-prefixed big-endian hex. Bare decimal is
/// rejected: `12345678` would be indistinguishable from pool hex.
pub fn parse_target(text: &str) -> Result<Target, JobError> {
    let text = text.trim();
    let bad = || JobError::Target(text.to_string());

    if let Some(digits) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u32::from_str_radix(digits, 16)
            .map(Target::from_compact)
            .map_err(|_| bad());
    }

    let bytes = hex::decode(text).map_err(|_| bad())?;
    match bytes.len() {
        4 => {
            let compact: [u8; 4] = bytes.try_into().map_err(|_| bad())?;
            Ok(Target::from_compact(u32::from_le_bytes(compact)))
        }
        8 => {
            let wide: [u8; 8] = bytes.try_into().map_err(|_| bad())?;
            Ok(Target::from_compact((u64::from_le_bytes(wide) >> 32) as u32))
        }
        _ => Err(bad()),
    }
}

pub fn target_from_difficulty(difficulty: u64) -> Result<Target, JobError> {
    if difficulty == 0 {
        return Err(JobError::ZeroDifficulty);
    }
    Ok(Target::from_difficulty(difficulty))
}
