//! Keccak-f[1600] sponge
//!
//! CryptoNight uses the original Keccak submission (padding byte `0x01`,
//! not the SHA-3 `0x06`) with a 136-byte rate, and keeps the whole 200-byte
//! state as output rather than squeezing a digest.

use crate::params::STATE_SIZE;

/// Sponge rate in bytes (1600 - 2 * 256 bits of capacity)
const RATE: usize = 136;

/// Lanes in the permutation state
const LANES: usize = STATE_SIZE / 8;

/// 1600-bit sponge state
#[derive(Clone)]
pub struct KeccakState {
    lanes: [u64; LANES],
}

impl KeccakState {
    /// Absorb `input` into a fresh state and return it.
    pub fn absorb(input: &[u8]) -> Self {
        let mut state = Self { lanes: [0u64; LANES] };

        let mut blocks = input.chunks_exact(RATE);
        for block in &mut blocks {
            state.xor_block(block);
            state.permute();
        }

        // Final (possibly empty) block with Keccak padding
        let rest = blocks.remainder();
        let mut last = [0u8; RATE];
        last[..rest.len()].copy_from_slice(rest);
        last[rest.len()] = 0x01;
        last[RATE - 1] |= 0x80;
        state.xor_block(&last);
        state.permute();

        state
    }

    /// Rebuild a state from its byte representation.
    pub fn from_bytes(bytes: &[u8; STATE_SIZE]) -> Self {
        let mut lanes = [0u64; LANES];
        for (lane, chunk) in lanes.iter_mut().zip(bytes.chunks_exact(8)) {
            *lane = u64::from_le_bytes(chunk.try_into().expect("8-byte chunk"));
        }
        Self { lanes }
    }

    /// Serialize the state, lanes little-endian.
    pub fn to_bytes(&self) -> [u8; STATE_SIZE] {
        let mut out = [0u8; STATE_SIZE];
        for (chunk, lane) in out.chunks_exact_mut(8).zip(self.lanes.iter()) {
            chunk.copy_from_slice(&lane.to_le_bytes());
        }
        out
    }

    /// Copy `out.len()` bytes starting at `offset` out of the state.
    pub fn extract(&self, offset: usize, out: &mut [u8]) {
        let bytes = self.to_bytes();
        out.copy_from_slice(&bytes[offset..offset + out.len()]);
    }

    /// Overwrite the bytes at `offset` with `material` and run the permutation.
    ///
    /// This is how scratchpad-derived bytes are folded back into the state
    /// before finalization.
    pub fn reabsorb(&mut self, offset: usize, material: &[u8]) {
        let mut bytes = self.to_bytes();
        bytes[offset..offset + material.len()].copy_from_slice(material);
        *self = Self::from_bytes(&bytes);
        self.permute();
    }

    /// Apply Keccak-f[1600] (24 rounds).
    #[inline(always)]
    pub fn permute(&mut self) {
        keccak::f1600(&mut self.lanes);
    }

    #[inline(always)]
    fn xor_block(&mut self, block: &[u8]) {
        for (lane, chunk) in self.lanes.iter_mut().zip(block.chunks_exact(8)) {
            *lane ^= u64::from_le_bytes(chunk.try_into().expect("8-byte chunk"));
        }
    }
}
