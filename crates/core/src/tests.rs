//! Tests for the CryptoNight hash family and scanner

use crate::{
    AesPath, CryptoNight, ScanControl, ScanOutcome, Scanner, Scratchpad, ScratchpadPool, Target,
    Variant, cryptolight_hash, cryptonight_hash, has_hardware_aes, hash_with_scratchpad,
};

/// Reference CryptoNight (v0) digests
const CRYPTONIGHT_VECTORS: &[(&[u8], &str)] = &[
    (
        b"",
        "eb14e8a833fac6fe9a43b57b336789c46ffe93f2868452240720607b14387e11",
    ),
    (
        b"This is a test",
        "a084f01d1437a09c6985401b60d43554ae105802c5f5d8a9b3253649c0be6605",
    ),
    (
        b"de omnibus dubitandum",
        "2f8e3df40bd11f9ac90c743ca8e32bb391da4fb98612aa3b6cdc639ee00b31f5",
    ),
    (
        b"abundans cautela non nocet",
        "722fa8ccd594d40e4a41f3822734304c8d5eff7e1b528408e2229da38ba553c4",
    ),
    (
        b"caveat emptor",
        "bbec2cacf69866a8e740380fe7b818fc78f8571221742d729d9d02d7f8989b87",
    ),
    (
        b"ex nihilo nihil fit",
        "b1257de4efc5ce28c6b40ceb1c6c8f812a64634eb3e81c5220bee9b2b76a6f05",
    ),
];

/// 76-byte hashing blob used by the common miner self-tests
const BLOB_VECTOR: &str = "0305a0dbd6bf05cf16e503f3a66f78007cbf34144332ecbfc22ed95c8700383b\
                           309ace1923a0964b00000008ba939a62724c0d7581fce5761e9d8a0e6a1c3f92\
                           4fdd8493d1115649c05eb601";

/// CryptoNight (v0) digest of [`BLOB_VECTOR`]
const BLOB_CRYPTONIGHT: &str = "1a3ffbee909b420d91f7be6e5fb56db71b3110d886011e877ee5786afd080100";

/// CryptoLight (v0) digest of [`BLOB_VECTOR`]
const BLOB_CRYPTOLIGHT: &str = "3695b4b53bb00358b0ad38dc160feb9e004eece09b83a72ef6ba9864d3510c88";

fn bit_distance(a: &[u8; 32], b: &[u8; 32]) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

#[test]
fn test_known_vectors_software() {
    let mut hasher = CryptoNight::new(Variant::Full, AesPath::Software).unwrap();
    for (input, expected) in CRYPTONIGHT_VECTORS {
        assert_eq!(
            hex::encode(hasher.hash(input)),
            *expected,
            "input {:?}",
            String::from_utf8_lossy(input)
        );
    }
}

#[test]
fn test_known_vectors_hardware() {
    let mut hasher = CryptoNight::new(Variant::Full, AesPath::Hardware).unwrap();
    assert_eq!(hasher.aes_path() == AesPath::Hardware, has_hardware_aes());
    for (input, expected) in CRYPTONIGHT_VECTORS.iter().take(2) {
        assert_eq!(hex::encode(hasher.hash(input)), *expected);
    }
}

#[test]
fn test_blob_vectors_both_variants() {
    let blob = hex::decode(BLOB_VECTOR).unwrap();
    assert_eq!(blob.len(), crate::BLOB_LEN);

    for aes in [AesPath::Software, AesPath::Hardware] {
        let mut full = CryptoNight::new(Variant::Full, aes).unwrap();
        let mut light = CryptoNight::new(Variant::Light, aes).unwrap();
        assert_eq!(hex::encode(full.hash(&blob)), BLOB_CRYPTONIGHT, "{:?}", aes);
        assert_eq!(hex::encode(light.hash(&blob)), BLOB_CRYPTOLIGHT, "{:?}", aes);
    }
}

#[test]
fn test_cryptolight_one_shot_vector() {
    let blob = hex::decode(BLOB_VECTOR).unwrap();
    assert_eq!(
        hex::encode(cryptolight_hash(&blob, false).unwrap()),
        BLOB_CRYPTOLIGHT
    );
}

#[test]
fn test_one_shot_matches_hasher() {
    let input = b"This is a test";
    let one_shot = cryptonight_hash(input, true).unwrap();
    assert_eq!(hex::encode(one_shot), CRYPTONIGHT_VECTORS[1].1);
    assert_eq!(cryptonight_hash(input, false).unwrap(), one_shot);
}

#[test]
fn test_light_paths_bit_identical() {
    let inputs: [&[u8]; 3] = [b"", b"This is a test", &[0xA7; 76]];
    let mut soft = CryptoNight::new(Variant::Light, AesPath::Software).unwrap();
    let mut hard = CryptoNight::new(Variant::Light, AesPath::Hardware).unwrap();
    for input in inputs {
        assert_eq!(soft.hash(input), hard.hash(input));
        assert_eq!(soft.hash(input), cryptolight_hash(input, true).unwrap());
    }
}

#[test]
fn test_deterministic_across_calls() {
    let mut hasher = CryptoNight::detect(Variant::Light).unwrap();
    let first = hasher.hash(b"determinism");
    for _ in 0..3 {
        assert_eq!(hasher.hash(b"determinism"), first);
    }
}

#[test]
fn test_variant_isolation() {
    let mut full = CryptoNight::detect(Variant::Full).unwrap();
    let mut light = CryptoNight::detect(Variant::Light).unwrap();
    let inputs: [&[u8]; 4] = [b"", b"a", b"This is a test", &[0u8; 76]];
    for input in inputs {
        assert_ne!(full.hash(input), light.hash(input), "{:?}", input);
    }
}

#[test]
fn test_avalanche_effect() {
    let mut hasher = CryptoNight::detect(Variant::Light).unwrap();
    let base = [0x5Cu8; 76];
    let reference = hasher.hash(&base);

    // Flip bits spread across the blob, including inside the nonce field
    let mut total = 0u32;
    let positions = [0usize, 7, 39, 42, 60, 75];
    for &byte in &positions {
        let mut flipped = base;
        flipped[byte] ^= 0x10;
        let distance = bit_distance(&reference, &hasher.hash(&flipped));
        assert!(
            (80..=176).contains(&distance),
            "flipping byte {} changed {} bits",
            byte,
            distance
        );
        total += distance;
    }

    // Averaged over the flips, close to half of 256 bits
    let mean = total / positions.len() as u32;
    assert!((104..=152).contains(&mean), "mean distance {}", mean);
}

#[test]
fn test_pooled_scratchpad_reuse_is_safe() {
    let pool = ScratchpadPool::new(Variant::Light);
    let aes = AesPath::detect();

    let (first, second) = {
        let mut pad = pool.acquire().unwrap();
        let first = hash_with_scratchpad(aes, &mut pad, b"first input");
        let second = hash_with_scratchpad(aes, &mut pad, b"second input");
        (first, second)
    };

    let mut fresh1 = Scratchpad::new(Variant::Light).unwrap();
    let mut fresh2 = Scratchpad::new(Variant::Light).unwrap();
    assert_eq!(first, hash_with_scratchpad(aes, &mut fresh1, b"first input"));
    assert_eq!(second, hash_with_scratchpad(aes, &mut fresh2, b"second input"));

    // A buffer checked back in carries nothing into the next checkout
    let mut again = pool.acquire().unwrap();
    assert_eq!(pool.idle(), 0);
    assert_eq!(first, hash_with_scratchpad(aes, &mut again, b"first input"));
}

#[test]
fn test_variant_mismatch_is_rejected() {
    let mut pad = Scratchpad::new(Variant::Light).unwrap();
    let err =
        crate::hash_variant_with_scratchpad(Variant::Full, AesPath::Software, &mut pad, b"x")
            .unwrap_err();
    assert_eq!(
        err,
        crate::Error::VariantMismatch {
            have: Variant::Light,
            want: Variant::Full
        }
    );
}

#[test]
fn test_scan_exhaustion_counts_every_nonce() {
    let mut scanner = Scanner::new(CryptoNight::detect(Variant::Light).unwrap());
    let mut blob = [0u8; 76];
    let control = ScanControl::new();

    let outcome = scanner
        .scan(&mut blob, Target::UNSATISFIABLE, 100..106, &control)
        .unwrap();
    assert_eq!(outcome, ScanOutcome::Exhausted { hashes: 6 });
    assert_eq!(control.hashes(), 6);
}

#[test]
fn test_scan_never_skips_lower_qualifying_nonce() {
    let mut hasher = CryptoNight::detect(Variant::Light).unwrap();
    let mut blob = [0x21u8; 76];
    let range = 0u64..12;

    // Hash every nonce directly and pick a target that the median passes
    let mut tops = Vec::new();
    for nonce in range.clone() {
        crate::write_nonce(&mut blob, crate::NONCE_OFFSET, nonce as u32).unwrap();
        let hash = hasher.hash(&blob);
        tops.push(u32::from_le_bytes([hash[28], hash[29], hash[30], hash[31]]));
    }
    let mut sorted = tops.clone();
    sorted.sort_unstable();
    let target = Target::from_compact(sorted[sorted.len() / 2] + 1);
    let expected = tops.iter().position(|&top| top < target.compact()).unwrap() as u32;

    let mut scanner = Scanner::new(hasher);
    let control = ScanControl::new();
    let outcome = scanner.scan(&mut blob, target, range, &control).unwrap();
    assert_eq!(outcome.nonce(), Some(expected));
    assert_eq!(outcome.hashes(), expected as u64 + 1);
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_scan_lowest_policy() {
    use crate::{ParallelScan, RacePolicy, scan_parallel};

    let mut hasher = CryptoNight::detect(Variant::Light).unwrap();
    let mut blob = [0x42u8; 76];
    let range = 0u64..16;

    let mut tops = Vec::new();
    for nonce in range.clone() {
        crate::write_nonce(&mut blob, crate::NONCE_OFFSET, nonce as u32).unwrap();
        let hash = hasher.hash(&blob);
        tops.push(u32::from_le_bytes([hash[28], hash[29], hash[30], hash[31]]));
    }
    let mut sorted = tops.clone();
    sorted.sort_unstable();
    let target = Target::from_compact(sorted[3] + 1);
    let lowest = tops.iter().position(|&top| top < target.compact()).unwrap() as u32;

    let mut params = ParallelScan::new(Variant::Light, 4);
    params.policy = RacePolicy::Lowest;
    let control = ScanControl::new();
    let outcome = scan_parallel(&params, &mut blob, target, range, &control).unwrap();

    assert_eq!(outcome.nonce(), Some(lowest));
    assert_eq!(crate::read_nonce(&blob, crate::NONCE_OFFSET).unwrap(), lowest);
    assert_eq!(control.hashes(), outcome.hashes());
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_scan_exhaustion() {
    use crate::{ParallelScan, scan_parallel};

    let params = ParallelScan::new(Variant::Light, 3);
    let mut blob = [0u8; 76];
    let control = ScanControl::new();
    let outcome =
        scan_parallel(&params, &mut blob, Target::UNSATISFIABLE, 10..20, &control).unwrap();
    assert_eq!(outcome, ScanOutcome::Exhausted { hashes: 10 });
}

#[test]
#[ignore] // Run with: cargo test timing_breakdown -- --ignored --nocapture
fn timing_breakdown() {
    use std::time::Instant;

    for variant in [Variant::Full, Variant::Light] {
        for aes in [AesPath::Software, AesPath::Hardware] {
            let mut hasher = CryptoNight::new(variant, aes).unwrap();
            let iterations = 5;

            let _ = hasher.hash(b"warmup");
            let start = Instant::now();
            for i in 0..iterations {
                let _ = hasher.hash(&[i as u8; 76]);
            }
            let per_hash = start.elapsed() / iterations;

            println!(
                "{} / {:?}: {:?} per hash ({:.1} H/s)",
                variant,
                hasher.aes_path(),
                per_hash,
                1.0 / per_hash.as_secs_f64()
            );
        }
    }
}
