//! CryptoNight hasher
//!
//! One hash runs four phases over a single scratchpad:
//! - Sponge: Keccak absorbs the input into a 200-byte state
//! - Explode: AES expands state bytes 64..192 into the scratchpad
//! - Mix: the data-dependent AES / multiply-add loop
//! - Implode + finalize: fold the scratchpad back into the state, permute,
//!   and hash the state with the selected finalizer

use crate::aes::{AesPath, AesRound, Block, HardAes, SoftAes, expand_key};
use crate::error::Error;
use crate::finalize::finalize;
use crate::keccak::KeccakState;
use crate::mix::{mix, xor};
use crate::params::*;
use crate::scratchpad::Scratchpad;

/// Reusable CryptoNight / CryptoLight hasher.
///
/// Owns one scratchpad, so reusing it across hashes avoids a 1-2 MB
/// allocation per call. One instance must not be shared between threads
/// while hashing; give each worker its own.
pub struct CryptoNight {
    aes: AesPath,
    scratchpad: Scratchpad,
}

impl CryptoNight {
    /// Create a hasher for `variant`, running the given AES path.
    ///
    /// [`AesPath::Hardware`] falls back to software when the host lacks
    /// AES instructions.
    pub fn new(variant: Variant, aes: AesPath) -> Result<Self, Error> {
        Ok(Self {
            aes: AesPath::select(aes == AesPath::Hardware),
            scratchpad: Scratchpad::new(variant)?,
        })
    }

    /// Hasher using the fastest AES path available.
    pub fn detect(variant: Variant) -> Result<Self, Error> {
        Self::new(variant, AesPath::detect())
    }

    pub fn variant(&self) -> Variant {
        self.scratchpad.variant()
    }

    /// AES path actually in use after host detection
    pub fn aes_path(&self) -> AesPath {
        self.aes
    }

    /// Compute the 32-byte digest of `input`.
    pub fn hash(&mut self, input: &[u8]) -> [u8; HASH_SIZE] {
        hash_with_scratchpad(self.aes, &mut self.scratchpad, input)
    }
}

/// Hash `input` using a caller-owned (for example pooled) scratchpad.
///
/// The variant is the one the scratchpad was allocated for. The buffer is
/// fully rewritten before it is read, so whatever it held is irrelevant.
pub fn hash_with_scratchpad(
    aes: AesPath,
    scratchpad: &mut Scratchpad,
    input: &[u8],
) -> [u8; HASH_SIZE] {
    match aes {
        AesPath::Hardware => match HardAes::detect() {
            Some(hard) => compute(hard, scratchpad, input),
            None => compute(SoftAes, scratchpad, input),
        },
        AesPath::Software => compute(SoftAes, scratchpad, input),
    }
}

/// Like [`hash_with_scratchpad`], but checks the buffer was sized for `variant`.
pub fn hash_variant_with_scratchpad(
    variant: Variant,
    aes: AesPath,
    scratchpad: &mut Scratchpad,
    input: &[u8],
) -> Result<[u8; HASH_SIZE], Error> {
    if scratchpad.variant() != variant {
        return Err(Error::VariantMismatch {
            have: scratchpad.variant(),
            want: variant,
        });
    }
    Ok(hash_with_scratchpad(aes, scratchpad, input))
}

/// One-shot CryptoNight hash.
///
/// `hardware_aes` requests the accelerated AES round; the digest is the same
/// either way. Allocates a fresh 2 MB scratchpad; prefer [`CryptoNight`] for
/// repeated hashing.
pub fn cryptonight_hash(input: &[u8], hardware_aes: bool) -> Result<[u8; HASH_SIZE], Error> {
    one_shot(Variant::Full, input, hardware_aes)
}

/// One-shot CryptoLight hash (1 MB scratchpad, half the iterations).
pub fn cryptolight_hash(input: &[u8], hardware_aes: bool) -> Result<[u8; HASH_SIZE], Error> {
    one_shot(Variant::Light, input, hardware_aes)
}

fn one_shot(variant: Variant, input: &[u8], hardware_aes: bool) -> Result<[u8; HASH_SIZE], Error> {
    let mut hasher = CryptoNight::new(variant, AesPath::select(hardware_aes))?;
    Ok(hasher.hash(input))
}

fn compute<R: AesRound>(aes: R, scratchpad: &mut Scratchpad, input: &[u8]) -> [u8; HASH_SIZE] {
    let variant = scratchpad.variant();

    // Phase 1: sponge
    let mut state = KeccakState::absorb(input);
    let seed = state.to_bytes();

    // Phase 2: explode state[64..192] into the scratchpad under keys from state[0..32]
    let explode_keys = expand_key(&key_material(&seed[0..32]));
    scratchpad.explode(load_text(&seed), &explode_keys, aes);

    // Phase 3: mixing loop
    let a = xor(&block_at(&seed, 0), &block_at(&seed, 32));
    let b = xor(&block_at(&seed, 16), &block_at(&seed, 48));
    mix(aes, scratchpad, a, b, variant.iterations());

    // Phase 4: implode under keys from state[32..64] and fold back into the sponge
    let implode_keys = expand_key(&key_material(&seed[32..64]));
    let text = scratchpad.implode(load_text(&seed), &implode_keys, aes);

    let mut folded = [0u8; INIT_SIZE];
    for (dst, block) in folded.chunks_exact_mut(AES_BLOCK_SIZE).zip(text.iter()) {
        dst.copy_from_slice(block);
    }
    state.reabsorb(64, &folded);

    finalize(&state.to_bytes())
}

#[inline(always)]
fn block_at(state: &[u8; STATE_SIZE], offset: usize) -> Block {
    let mut block = [0u8; AES_BLOCK_SIZE];
    block.copy_from_slice(&state[offset..offset + AES_BLOCK_SIZE]);
    block
}

#[inline(always)]
fn key_material(bytes: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    key.copy_from_slice(bytes);
    key
}

/// The 128 bytes of state carried through explode and implode
#[inline(always)]
fn load_text(state: &[u8; STATE_SIZE]) -> [Block; INIT_BLOCKS] {
    let mut text = [[0u8; AES_BLOCK_SIZE]; INIT_BLOCKS];
    for (i, block) in text.iter_mut().enumerate() {
        *block = block_at(state, 64 + i * AES_BLOCK_SIZE);
    }
    text
}
