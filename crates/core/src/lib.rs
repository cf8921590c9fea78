//! # CryptoNight Core Algorithm
//!
//! The CryptoNight memory-hard proof-of-work hash, its reduced-memory
//! CryptoLight variant, and the nonce scanner that drives mining.
//!
//! ## Features
//!
//! - **Memory-Hard**: 2 MB (or 1 MB) scratchpad walked at data-dependent addresses
//! - **Hardware AES**: AES-NI / ARMv8 crypto round, bit-identical to the software round
//! - **Finalizer Diversity**: BLAKE-256, Groestl-256, JH-256 or Skein-512-256,
//!   picked by the final sponge state
//! - **Parallel Scanning**: disjoint nonce slices on rayon (feature `parallel`)
//!
//! ## Algorithm Parameters
//!
//! | | scratchpad | iterations |
//! |---|---|---|
//! | CryptoNight | 2 MB | 524,288 |
//! | CryptoLight | 1 MB | 262,144 |
//!
//! ## Input Format
//!
//! Any byte string can be hashed. The scanner expects a hashing blob with a
//! 32-bit little-endian nonce, by default at byte 39 of a 76-byte blob:
//!
//! ```text
//! blob = major/minor version || timestamp || prev id || nonce || tree root || tx count
//!                                                       ^^^^^
//!                                                       bytes 39..43
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cryptonight_core::{AesPath, CryptoNight, ScanControl, Scanner, Target, Variant};
//!
//! // Reusable hasher (avoids re-allocating the scratchpad)
//! let mut hasher = CryptoNight::new(Variant::Light, AesPath::detect()).unwrap();
//! let digest = hasher.hash(b"This is a test");
//! assert_eq!(digest.len(), 32);
//!
//! // Scan a few nonces against an easy target
//! let mut blob = [0u8; 76];
//! let mut scanner = Scanner::new(hasher);
//! let control = ScanControl::new();
//! let outcome = scanner
//!     .scan(&mut blob, Target::from_difficulty(2), 0..64, &control)
//!     .unwrap();
//! assert_eq!(control.hashes(), outcome.hashes());
//! ```
//!
//! ## no_std Support
//!
//! Without the default features the crate builds on `core` + `alloc`:
//!
//! ```toml
//! [dependencies]
//! cryptonight-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod aes;
mod cryptonight;
mod error;
mod finalize;
mod keccak;
mod mix;
mod params;
mod scan;
mod scratchpad;
mod target;

#[cfg(feature = "std")]
mod ffi;

pub use aes::{AesPath, has_hardware_aes};
pub use cryptonight::{
    CryptoNight, cryptolight_hash, cryptonight_hash, hash_variant_with_scratchpad,
    hash_with_scratchpad,
};
pub use error::Error;
pub use finalize::Finalizer;
pub use keccak::KeccakState;
pub use params::*;
pub use scan::{
    ScanControl, ScanOutcome, Scanner, check_blob, check_range, read_nonce, write_nonce,
};
#[cfg(feature = "parallel")]
pub use scan::{ParallelScan, RacePolicy, scan_parallel};
pub use scratchpad::Scratchpad;
#[cfg(feature = "std")]
pub use scratchpad::{PooledScratchpad, ScratchpadPool};
pub use target::{Target, cmp_le256};

#[cfg(test)]
mod tests;
