//! C ABI for miners written against the classic `cryptonight_hash.h`

use core::ffi::c_int;
use core::slice;

use crate::aes::{AesPath, has_hardware_aes};
use crate::cryptonight::CryptoNight;
use crate::params::{BLOB_LEN, HASH_SIZE, NONCE_OFFSET, Variant};
use crate::scan::{ScanControl, ScanOutcome, Scanner, read_nonce};
use crate::target::Target;

/// Hash `length` bytes at `input` into the 32-byte buffer at `output`.
/// Leaves `output` untouched on null pointers or allocation failure.
#[unsafe(no_mangle)]
pub extern "C" fn cryptonight_hash(
    output: *mut u8,
    input: *const u8,
    length: u32,
    aes_ni_supported: c_int,
) {
    hash_into(Variant::Full, output, input, length, aes_ni_supported);
}

/// CryptoLight counterpart of [`cryptonight_hash`].
#[unsafe(no_mangle)]
pub extern "C" fn cryptolight_hash(
    output: *mut u8,
    input: *const u8,
    length: u32,
    aes_ni_supported: c_int,
) {
    hash_into(Variant::Light, output, input, length, aes_ni_supported);
}

/// Scan a 76-byte blob from its current nonce up to and including
/// `max_nonce`. Returns 1 with the winning nonce left in the blob, or 0.
#[unsafe(no_mangle)]
pub extern "C" fn scanhash_cryptonight(
    pdata: *mut u8,
    target: u32,
    max_nonce: u32,
    hashes_done: *mut u64,
) -> c_int {
    scan_blob(Variant::Full, pdata, target, max_nonce, hashes_done)
}

/// CryptoLight counterpart of [`scanhash_cryptonight`].
#[unsafe(no_mangle)]
pub extern "C" fn scanhash_cryptolight(
    pdata: *mut u8,
    target: u32,
    max_nonce: u32,
    hashes_done: *mut u64,
) -> c_int {
    scan_blob(Variant::Light, pdata, target, max_nonce, hashes_done)
}

/// Whether the hardware AES path is usable on this CPU
#[unsafe(no_mangle)]
pub extern "C" fn has_aes_ni() -> bool {
    has_hardware_aes()
}

fn hash_into(variant: Variant, output: *mut u8, input: *const u8, length: u32, aes: c_int) {
    if output.is_null() || input.is_null() {
        return;
    }

    let Ok(mut hasher) = CryptoNight::new(variant, AesPath::select(aes != 0)) else {
        return;
    };

    unsafe {
        let input_slice = slice::from_raw_parts(input, length as usize);
        let result = hasher.hash(input_slice);

        let output_slice = slice::from_raw_parts_mut(output, HASH_SIZE);
        output_slice.copy_from_slice(&result);
    }
}

fn scan_blob(
    variant: Variant,
    pdata: *mut u8,
    target: u32,
    max_nonce: u32,
    hashes_done: *mut u64,
) -> c_int {
    if pdata.is_null() || hashes_done.is_null() {
        return 0;
    }

    let blob = unsafe { slice::from_raw_parts_mut(pdata, BLOB_LEN) };
    let mut done = 0u64;

    let found = (|| {
        let start = read_nonce(blob, NONCE_OFFSET).ok()?;
        let hasher = CryptoNight::detect(variant).ok()?;
        let mut scanner = Scanner::new(hasher);
        let control = ScanControl::new();
        let outcome = scanner
            .scan(
                blob,
                Target::from_compact(target),
                start as u64..max_nonce as u64 + 1,
                &control,
            )
            .ok()?;
        done = outcome.hashes();
        match outcome {
            ScanOutcome::Found { .. } => Some(()),
            ScanOutcome::Exhausted { .. } => None,
        }
    })()
    .is_some();

    unsafe {
        *hashes_done = done;
    }
    found as c_int
}
