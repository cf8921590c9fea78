//! Nonce search
//!
//! A scan walks the 32-bit nonce field of a hashing blob upward through a
//! half-open range, hashing each candidate, and stops at the first digest
//! that meets the target. Cancellation is cooperative: the shared
//! [`ScanControl`] is checked between hashes, never during one.

use core::ops::Range;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::cryptonight::CryptoNight;
use crate::error::Error;
use crate::params::{HASH_SIZE, NONCE_OFFSET, NONCE_SIZE, NONCE_SPACE};
use crate::target::Target;

/// Terminal state of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A nonce met the target; the blob holds it on return.
    Found {
        nonce: u32,
        hash: [u8; HASH_SIZE],
        hashes: u64,
    },
    /// The range (or the part left after cancellation) held no qualifying nonce.
    Exhausted { hashes: u64 },
}

impl ScanOutcome {
    /// Hashes computed by this scan
    pub fn hashes(&self) -> u64 {
        match *self {
            ScanOutcome::Found { hashes, .. } | ScanOutcome::Exhausted { hashes } => hashes,
        }
    }

    pub fn nonce(&self) -> Option<u32> {
        match *self {
            ScanOutcome::Found { nonce, .. } => Some(nonce),
            ScanOutcome::Exhausted { .. } => None,
        }
    }
}

/// Shared progress and cancellation state for one or more scans.
///
/// The hash counter keeps running across scans until [`ScanControl::reset`].
#[derive(Debug)]
pub struct ScanControl {
    hashes: AtomicU64,
    upper: AtomicU64,
    stop: AtomicBool,
}

impl ScanControl {
    pub fn new() -> Self {
        Self {
            hashes: AtomicU64::new(0),
            upper: AtomicU64::new(NONCE_SPACE),
            stop: AtomicBool::new(false),
        }
    }

    /// Total hashes computed by every scan using this control
    pub fn hashes(&self) -> u64 {
        self.hashes.load(Ordering::Relaxed)
    }

    /// Lower the exclusive upper nonce bound. Never raises it.
    pub fn limit_upper(&self, bound: u64) {
        self.upper.fetch_min(bound, Ordering::SeqCst);
    }

    /// Current exclusive upper nonce bound
    pub fn upper(&self) -> u64 {
        self.upper.load(Ordering::Relaxed)
    }

    /// Ask every scan to stop before its next hash.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Clear the counter, bound and stop flag for a new job.
    pub fn reset(&self) {
        self.hashes.store(0, Ordering::Relaxed);
        self.upper.store(NONCE_SPACE, Ordering::SeqCst);
        self.stop.store(false, Ordering::SeqCst);
    }

    #[inline(always)]
    fn record_hash(&self) {
        self.hashes.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for ScanControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that `blob` can hold a nonce at `offset`.
pub fn check_blob(blob: &[u8], offset: usize) -> Result<(), Error> {
    if offset >= blob.len() {
        return Err(Error::NonceOffsetOutOfBounds {
            offset,
            len: blob.len(),
        });
    }
    let required = offset + NONCE_SIZE;
    if blob.len() < required {
        return Err(Error::BlobTooShort {
            len: blob.len(),
            required,
        });
    }
    Ok(())
}

/// Check that `range` is a valid slice of the 32-bit nonce space.
pub fn check_range(range: &Range<u64>) -> Result<(), Error> {
    if range.start > range.end || range.end > NONCE_SPACE {
        return Err(Error::InvalidRange {
            start: range.start,
            end: range.end,
        });
    }
    Ok(())
}

/// Read the nonce currently stored in `blob`.
pub fn read_nonce(blob: &[u8], offset: usize) -> Result<u32, Error> {
    check_blob(blob, offset)?;
    let mut bytes = [0u8; NONCE_SIZE];
    bytes.copy_from_slice(&blob[offset..offset + NONCE_SIZE]);
    Ok(u32::from_le_bytes(bytes))
}

/// Store `nonce` little-endian into `blob`.
pub fn write_nonce(blob: &mut [u8], offset: usize, nonce: u32) -> Result<(), Error> {
    check_blob(blob, offset)?;
    blob[offset..offset + NONCE_SIZE].copy_from_slice(&nonce.to_le_bytes());
    Ok(())
}

/// Single-threaded nonce scanner.
///
/// Owns its hasher (and with it its scratchpad), so independent scanners
/// can run on different threads over disjoint ranges.
pub struct Scanner {
    hasher: CryptoNight,
    nonce_offset: usize,
}

impl Scanner {
    pub fn new(hasher: CryptoNight) -> Self {
        Self {
            hasher,
            nonce_offset: NONCE_OFFSET,
        }
    }

    /// Use a nonce position other than the standard byte 39.
    pub fn with_nonce_offset(mut self, offset: usize) -> Self {
        self.nonce_offset = offset;
        self
    }

    pub fn nonce_offset(&self) -> usize {
        self.nonce_offset
    }

    pub fn hasher(&self) -> &CryptoNight {
        &self.hasher
    }

    /// Scan `range` (exclusive end) for a nonce whose digest meets `target`.
    ///
    /// The effective end is `min(range.end, control.upper())`, re-read before
    /// every hash so a caller can shrink it mid-scan.
    pub fn scan(
        &mut self,
        blob: &mut [u8],
        target: Target,
        range: Range<u64>,
        control: &ScanControl,
    ) -> Result<ScanOutcome, Error> {
        check_blob(blob, self.nonce_offset)?;
        check_range(&range)?;

        log::debug!(
            "{} scan {}..{} target {:#010x}",
            self.hasher.variant(),
            range.start,
            range.end,
            target.compact()
        );

        let offset = self.nonce_offset;
        let mut hashes = 0u64;
        let mut nonce = range.start;

        while nonce < range.end.min(control.upper()) && !control.is_stopped() {
            // range.end <= 2^32, so the nonce fits
            blob[offset..offset + NONCE_SIZE].copy_from_slice(&(nonce as u32).to_le_bytes());

            let hash = self.hasher.hash(blob);
            hashes += 1;
            control.record_hash();

            if target.is_met_by(&hash) {
                log::info!("found nonce {:#010x} after {} hashes", nonce, hashes);
                return Ok(ScanOutcome::Found {
                    nonce: nonce as u32,
                    hash,
                    hashes,
                });
            }

            nonce += 1;
        }

        log::debug!("scan exhausted after {} hashes", hashes);
        Ok(ScanOutcome::Exhausted { hashes })
    }
}

#[cfg(feature = "parallel")]
pub use parallel::{ParallelScan, RacePolicy, scan_parallel};

#[cfg(feature = "parallel")]
mod parallel {
    use std::ops::Range;

    use rayon::prelude::*;

    use super::{ScanControl, ScanOutcome, Scanner, check_blob, check_range, write_nonce};
    use crate::aes::AesPath;
    use crate::cryptonight::CryptoNight;
    use crate::error::Error;
    use crate::params::{NONCE_OFFSET, Variant};
    use crate::target::Target;

    /// How to settle several workers finding nonces.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum RacePolicy {
        /// Stop all workers as soon as one finds a nonce.
        #[default]
        FirstFound,
        /// Keep scanning below the best nonce so far; report the lowest.
        Lowest,
    }

    /// Settings for a multi-worker scan.
    #[derive(Debug, Clone, Copy)]
    pub struct ParallelScan {
        pub variant: Variant,
        pub aes: AesPath,
        pub nonce_offset: usize,
        pub workers: usize,
        pub policy: RacePolicy,
    }

    impl ParallelScan {
        pub fn new(variant: Variant, workers: usize) -> Self {
            Self {
                variant,
                aes: AesPath::detect(),
                nonce_offset: NONCE_OFFSET,
                workers,
                policy: RacePolicy::default(),
            }
        }
    }

    /// Split `range` into at most `workers` contiguous non-empty slices.
    pub(crate) fn split_range(range: &Range<u64>, workers: usize) -> Vec<Range<u64>> {
        let workers = workers.max(1) as u64;
        let span = range.end.saturating_sub(range.start);
        let step = span.div_ceil(workers).max(1);

        (0..workers)
            .map(|w| {
                let start = (range.start + w * step).min(range.end);
                start..(start + step).min(range.end)
            })
            .filter(|slice| !slice.is_empty())
            .collect()
    }

    /// Scan `range` with one scanner per slice on the rayon pool.
    ///
    /// Each worker hashes its own copy of `blob` with its own scratchpad.
    /// When a nonce is found it is written into `blob`.
    pub fn scan_parallel(
        params: &ParallelScan,
        blob: &mut [u8],
        target: Target,
        range: Range<u64>,
        control: &ScanControl,
    ) -> Result<ScanOutcome, Error> {
        check_blob(blob, params.nonce_offset)?;
        check_range(&range)?;

        let slices = split_range(&range, params.workers);
        log::debug!(
            "parallel {} scan over {} slices, policy {:?}",
            params.variant,
            slices.len(),
            params.policy
        );

        let template: &[u8] = blob;
        let results: Vec<Result<ScanOutcome, Error>> = slices
            .into_par_iter()
            .map(|slice| {
                let hasher = CryptoNight::new(params.variant, params.aes)?;
                let mut scanner = Scanner::new(hasher).with_nonce_offset(params.nonce_offset);
                let mut local = template.to_vec();

                let outcome = scanner.scan(&mut local, target, slice, control)?;
                if let ScanOutcome::Found { nonce, .. } = outcome {
                    match params.policy {
                        RacePolicy::FirstFound => control.stop(),
                        RacePolicy::Lowest => control.limit_upper(nonce as u64),
                    }
                }
                Ok(outcome)
            })
            .collect();

        let mut hashes = 0u64;
        let mut best: Option<ScanOutcome> = None;
        for result in results {
            let outcome = result?;
            hashes += outcome.hashes();
            if let Some(nonce) = outcome.nonce() {
                if best.and_then(|b| b.nonce()).is_none_or(|b| nonce < b) {
                    best = Some(outcome);
                }
            }
        }

        match best {
            Some(ScanOutcome::Found { nonce, hash, .. }) => {
                write_nonce(blob, params.nonce_offset, nonce)?;
                Ok(ScanOutcome::Found {
                    nonce,
                    hash,
                    hashes,
                })
            }
            _ => Ok(ScanOutcome::Exhausted { hashes }),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_split_covers_range_disjointly() {
            for (range, workers) in [(0..10u64, 3usize), (5..6, 4), (0..1 << 32, 7), (7..7, 2)] {
                let slices = split_range(&range, workers);
                assert!(slices.len() <= workers);
                let mut next = range.start;
                for slice in &slices {
                    assert_eq!(slice.start, next);
                    assert!(slice.end > slice.start);
                    next = slice.end;
                }
                if !range.is_empty() {
                    assert_eq!(next, range.end);
                } else {
                    assert!(slices.is_empty());
                }
            }
        }
    }
}
