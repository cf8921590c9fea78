//! Difficulty targets
//!
//! Pools hand out a 32-bit compact target. It is the top word of a 256-bit
//! bound: a digest qualifies when its last four bytes, read little-endian,
//! are strictly below the compact value. Equivalently the whole digest read
//! as a little-endian 256-bit integer is at most `compact * 2^224 - 1`.

use core::cmp::Ordering;

use crate::params::HASH_SIZE;

/// Compact 32-bit difficulty target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Target(u32);

impl Target {
    /// The easiest target; almost every digest qualifies.
    pub const MAX: Target = Target(u32::MAX);

    /// A target nothing can satisfy.
    pub const UNSATISFIABLE: Target = Target(0);

    pub const fn from_compact(compact: u32) -> Self {
        Target(compact)
    }

    pub const fn compact(self) -> u32 {
        self.0
    }

    /// Target for a pool share difficulty (`u32::MAX / difficulty`).
    ///
    /// Difficulty 0 and 1 both map to [`Target::MAX`].
    pub fn from_difficulty(difficulty: u64) -> Self {
        if difficulty <= 1 {
            return Target::MAX;
        }
        Target((u32::MAX as u64 / difficulty) as u32)
    }

    /// Share difficulty represented by this target, `None` when unsatisfiable.
    pub fn difficulty(self) -> Option<u64> {
        (self.0 != 0).then(|| u32::MAX as u64 / self.0 as u64)
    }

    /// The inclusive 256-bit little-endian bound, `None` for target 0.
    pub fn expand(self) -> Option<[u8; HASH_SIZE]> {
        let top = self.0.checked_sub(1)?;
        let mut bound = [0xFFu8; HASH_SIZE];
        bound[HASH_SIZE - 4..].copy_from_slice(&top.to_le_bytes());
        Some(bound)
    }

    /// Whether `hash` satisfies this target.
    #[inline(always)]
    pub fn is_met_by(self, hash: &[u8; HASH_SIZE]) -> bool {
        let top = u32::from_le_bytes([hash[28], hash[29], hash[30], hash[31]]);
        top < self.0
    }
}

impl From<u32> for Target {
    fn from(compact: u32) -> Self {
        Target(compact)
    }
}

/// Compare two digests as little-endian 256-bit integers.
pub fn cmp_le256(a: &[u8; HASH_SIZE], b: &[u8; HASH_SIZE]) -> Ordering {
    a.iter().rev().cmp(b.iter().rev())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest_with_top(top: u32, fill: u8) -> [u8; HASH_SIZE] {
        let mut hash = [fill; HASH_SIZE];
        hash[28..].copy_from_slice(&top.to_le_bytes());
        hash
    }

    #[test]
    fn test_strict_comparison_on_top_word() {
        let target = Target::from_compact(0x1000);
        assert!(target.is_met_by(&digest_with_top(0x0FFF, 0xFF)));
        assert!(!target.is_met_by(&digest_with_top(0x1000, 0x00)));
        assert!(!target.is_met_by(&digest_with_top(0x1001, 0x00)));
    }

    #[test]
    fn test_zero_target_is_unsatisfiable() {
        assert_eq!(Target::UNSATISFIABLE.expand(), None);
        assert_eq!(Target::UNSATISFIABLE.difficulty(), None);
        assert!(!Target::UNSATISFIABLE.is_met_by(&[0u8; HASH_SIZE]));
    }

    #[test]
    fn test_expanded_bound_agrees_with_fast_check() {
        let target = Target::from_compact(0x00AB_CDEF);
        let bound = target.expand().unwrap();
        for hash in [
            digest_with_top(0x00AB_CDEE, 0xFF),
            digest_with_top(0x00AB_CDEF, 0x00),
            digest_with_top(0, 0x77),
            digest_with_top(u32::MAX, 0),
            bound,
        ] {
            let by_bound = cmp_le256(&hash, &bound) != Ordering::Greater;
            assert_eq!(by_bound, target.is_met_by(&hash), "{:02x?}", hash);
        }
    }

    #[test]
    fn test_expansion_is_monotonic() {
        let compacts = [1u32, 2, 0xFF, 0x1_0000, 0x7FFF_FFFF, u32::MAX];
        for pair in compacts.windows(2) {
            let lower = Target::from_compact(pair[0]).expand().unwrap();
            let higher = Target::from_compact(pair[1]).expand().unwrap();
            assert_eq!(cmp_le256(&lower, &higher), Ordering::Less);
        }
    }

    #[test]
    fn test_difficulty_conversion() {
        assert_eq!(Target::from_difficulty(0), Target::MAX);
        assert_eq!(Target::from_difficulty(1), Target::MAX);
        assert_eq!(Target::from_difficulty(5000).compact(), 858_993);
        assert_eq!(Target::from_compact(858_993).difficulty(), Some(5000));
        assert_eq!(Target::from_difficulty(u64::MAX), Target::UNSATISFIABLE);
    }

    #[test]
    fn test_cmp_le256_orders_by_last_byte_first() {
        let mut a = [0u8; HASH_SIZE];
        let mut b = [0xFFu8; HASH_SIZE];
        a[31] = 1;
        b[31] = 0;
        assert_eq!(cmp_le256(&a, &b), Ordering::Greater);
    }
}
