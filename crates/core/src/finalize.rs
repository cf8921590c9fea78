//! Final hash selection
//!
//! After the scratchpad is folded back into the sponge, the two low bits of
//! the first state byte pick one of four unrelated 256-bit hash functions.
//! Hardware has to carry all four to compute the digest.

use digest::Digest;
use digest::consts::U32;
use groestl::Groestl256;
use jh::Jh256;
use skein::Skein512;

use crate::params::{HASH_SIZE, STATE_SIZE};

/// One of the four finalization hash functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finalizer {
    Blake256,
    Groestl256,
    Jh256,
    Skein256,
}

impl Finalizer {
    /// All finalizers in selector order
    pub const ALL: [Finalizer; 4] = [
        Finalizer::Blake256,
        Finalizer::Groestl256,
        Finalizer::Jh256,
        Finalizer::Skein256,
    ];

    /// Pick the finalizer for a post-mixing sponge state.
    #[inline]
    pub fn select(state: &[u8; STATE_SIZE]) -> Self {
        Self::ALL[(state[0] & 3) as usize]
    }

    /// Hash `data` with this finalizer.
    pub fn digest(self, data: &[u8]) -> [u8; HASH_SIZE] {
        match self {
            Finalizer::Blake256 => blake256(data),
            Finalizer::Groestl256 => Groestl256::digest(data).into(),
            Finalizer::Jh256 => Jh256::digest(data).into(),
            Finalizer::Skein256 => Skein512::<U32>::digest(data).into(),
        }
    }
}

/// `blake-hash` implements the older `digest` 0.9 traits
fn blake256(data: &[u8]) -> [u8; HASH_SIZE] {
    use blake_hash::digest::Digest as _;

    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&blake_hash::Blake256::digest(data));
    out
}

/// Produce the digest for a post-mixing sponge state.
pub fn finalize(state: &[u8; STATE_SIZE]) -> [u8; HASH_SIZE] {
    Finalizer::select(state).digest(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_uses_low_two_bits() {
        let mut state = [0u8; STATE_SIZE];
        for (byte, expected) in [
            (0x00u8, Finalizer::Blake256),
            (0x01, Finalizer::Groestl256),
            (0x02, Finalizer::Jh256),
            (0x03, Finalizer::Skein256),
            (0xFC, Finalizer::Blake256),
            (0x7F, Finalizer::Skein256),
        ] {
            state[0] = byte;
            assert_eq!(Finalizer::select(&state), expected, "{:#04x}", byte);
        }
    }

    #[test]
    fn test_finalizers_are_distinct_functions() {
        let data = [0x42u8; STATE_SIZE];
        let digests: Vec<_> = Finalizer::ALL.iter().map(|f| f.digest(&data)).collect();
        for i in 0..digests.len() {
            for j in i + 1..digests.len() {
                assert_ne!(digests[i], digests[j]);
            }
        }
    }

    #[test]
    fn test_blake256_empty() {
        assert_eq!(
            hex::encode(Finalizer::Blake256.digest(b"")),
            "716f6e863f744b9ac22c97ec7b76ea5f5908bc5b2f67c61510bfc4751384ea7a"
        );
    }

    #[test]
    fn test_blake256_single_zero_byte() {
        // One-block example from the BLAKE submission
        assert_eq!(
            hex::encode(Finalizer::Blake256.digest(&[0u8])),
            "0ce8d4ef4dd7cd8d62dfded9d4edb0a774ae6a41929a74da23109e8f11139c87"
        );
    }

    #[test]
    fn test_blake256_two_blocks() {
        // 576-bit example from the BLAKE submission
        assert_eq!(
            hex::encode(Finalizer::Blake256.digest(&[0u8; 72])),
            "d419bad32d504fb7d44d460c42c5593fe544fa4c135dec31e21bd9abdcc22d41"
        );
    }

    #[test]
    fn test_groestl256_empty() {
        assert_eq!(
            hex::encode(Finalizer::Groestl256.digest(b"")),
            "1a52d11d550039be16107f9c58db9ebcc417f16f736adb2502567119f0083467"
        );
    }

    #[test]
    fn test_finalize_dispatches_on_state() {
        let mut state = [0x11u8; STATE_SIZE];
        state[0] = 0x02;
        assert_eq!(finalize(&state), Finalizer::Jh256.digest(&state));
        state[0] = 0x03;
        assert_eq!(finalize(&state), Finalizer::Skein256.digest(&state));
    }
}
