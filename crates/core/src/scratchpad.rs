//! Scratchpad memory
//!
//! The scratchpad is the large working buffer that makes the hash
//! memory-hard. Every access goes through a register-to-offset fold that
//! masks with `size - 16`, so any 64-bit value lands on a 16-byte aligned
//! block inside the buffer.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::aes::{AesRound, Block, RoundKeys};
use crate::error::Error;
use crate::params::{AES_BLOCK_SIZE, INIT_BLOCKS, INIT_SIZE, Variant};

/// Working memory for one hash invocation at a time.
pub struct Scratchpad {
    variant: Variant,
    mask: usize,
    memory: Vec<u8>,
}

impl Scratchpad {
    /// Allocate a zeroed scratchpad sized for `variant`.
    ///
    /// Fails with [`Error::ScratchpadAlloc`] instead of aborting when the
    /// allocator cannot satisfy the request.
    pub fn new(variant: Variant) -> Result<Self, Error> {
        let bytes = variant.memory();
        let mut memory = Vec::new();
        memory
            .try_reserve_exact(bytes)
            .map_err(|_| Error::ScratchpadAlloc { bytes })?;
        memory.resize(bytes, 0);

        Ok(Self {
            variant,
            mask: variant.address_mask(),
            memory,
        })
    }

    /// Variant this buffer is sized for
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Always false; a scratchpad is never empty
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Fold a working register into a block offset within the buffer.
    #[inline(always)]
    pub fn offset_of(&self, register: u64) -> usize {
        (register as usize) & self.mask
    }

    #[inline(always)]
    pub(crate) fn read_block(&self, register: u64) -> Block {
        let offset = self.offset_of(register);
        let mut block = [0u8; AES_BLOCK_SIZE];
        block.copy_from_slice(&self.memory[offset..offset + AES_BLOCK_SIZE]);
        block
    }

    #[inline(always)]
    pub(crate) fn write_block(&mut self, register: u64, block: &Block) {
        let offset = self.offset_of(register);
        self.memory[offset..offset + AES_BLOCK_SIZE].copy_from_slice(block);
    }

    /// Fill the whole buffer from the sponge-derived text.
    ///
    /// Each 128-byte chunk is the text after another ten AES rounds per
    /// block, so every byte of a previous invocation is overwritten.
    pub(crate) fn explode<R: AesRound>(
        &mut self,
        mut text: [Block; INIT_BLOCKS],
        keys: &RoundKeys,
        aes: R,
    ) {
        for chunk in self.memory.chunks_exact_mut(INIT_SIZE) {
            aes.pseudo_rounds(&mut text, keys);
            for (dst, block) in chunk.chunks_exact_mut(AES_BLOCK_SIZE).zip(text.iter()) {
                dst.copy_from_slice(block);
            }
        }
    }

    /// Fold the whole buffer back into 128 bytes of text.
    pub(crate) fn implode<R: AesRound>(
        &self,
        mut text: [Block; INIT_BLOCKS],
        keys: &RoundKeys,
        aes: R,
    ) -> [Block; INIT_BLOCKS] {
        for chunk in self.memory.chunks_exact(INIT_SIZE) {
            for (block, src) in text.iter_mut().zip(chunk.chunks_exact(AES_BLOCK_SIZE)) {
                for (b, s) in block.iter_mut().zip(src.iter()) {
                    *b ^= s;
                }
            }
            aes.pseudo_rounds(&mut text, keys);
        }
        text
    }

    #[cfg(test)]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.memory
    }
}

#[cfg(feature = "std")]
pub use pool::{PooledScratchpad, ScratchpadPool};

#[cfg(feature = "std")]
mod pool {
    use std::ops::{Deref, DerefMut};
    use std::sync::{Mutex, PoisonError};

    use super::Scratchpad;
    use crate::error::Error;
    use crate::params::Variant;

    /// Default number of idle buffers kept around
    const DEFAULT_MAX_IDLE: usize = 16;

    /// Check-out/check-in pool of scratchpads for one variant.
    ///
    /// A buffer is owned by exactly one guard while checked out; concurrent
    /// hashes never see the same memory.
    pub struct ScratchpadPool {
        variant: Variant,
        max_idle: usize,
        idle: Mutex<Vec<Scratchpad>>,
    }

    impl ScratchpadPool {
        pub fn new(variant: Variant) -> Self {
            Self::with_max_idle(variant, DEFAULT_MAX_IDLE)
        }

        /// Pool that keeps at most `max_idle` buffers once they are returned.
        pub fn with_max_idle(variant: Variant, max_idle: usize) -> Self {
            Self {
                variant,
                max_idle,
                idle: Mutex::new(Vec::new()),
            }
        }

        pub fn variant(&self) -> Variant {
            self.variant
        }

        /// Check out a buffer, allocating when none is idle.
        pub fn acquire(&self) -> Result<PooledScratchpad<'_>, Error> {
            let reused = self
                .idle
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop();

            let scratchpad = match reused {
                Some(scratchpad) => scratchpad,
                None => {
                    log::debug!("allocating {} scratchpad", self.variant);
                    Scratchpad::new(self.variant)?
                }
            };

            Ok(PooledScratchpad {
                pool: self,
                scratchpad: Some(scratchpad),
            })
        }

        /// Number of buffers waiting to be checked out
        pub fn idle(&self) -> usize {
            self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
        }

        fn release(&self, scratchpad: Scratchpad) {
            let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
            if idle.len() < self.max_idle {
                idle.push(scratchpad);
            }
        }
    }

    /// Exclusive handle to a pooled scratchpad; returns it on drop.
    pub struct PooledScratchpad<'a> {
        pool: &'a ScratchpadPool,
        scratchpad: Option<Scratchpad>,
    }

    impl Deref for PooledScratchpad<'_> {
        type Target = Scratchpad;

        fn deref(&self) -> &Scratchpad {
            self.scratchpad.as_ref().expect("scratchpad present until drop")
        }
    }

    impl DerefMut for PooledScratchpad<'_> {
        fn deref_mut(&mut self) -> &mut Scratchpad {
            self.scratchpad.as_mut().expect("scratchpad present until drop")
        }
    }

    impl Drop for PooledScratchpad<'_> {
        fn drop(&mut self) {
            if let Some(scratchpad) = self.scratchpad.take() {
                self.pool.release(scratchpad);
            }
        }
    }
}
