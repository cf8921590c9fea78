//! The memory-hard mixing loop
//!
//! Two 128-bit registers, `a` and `b`, walk the scratchpad. Each iteration
//! does an AES read-modify-write at an address taken from `a`, then a
//! multiply-add read-modify-write at an address taken from the AES output.
//! Every address depends on the previous iteration, so the loop cannot be
//! split or reordered.

use crate::aes::{AesRound, Block};
use crate::scratchpad::Scratchpad;

#[inline(always)]
fn lo(block: &Block) -> u64 {
    u64::from_le_bytes([
        block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
    ])
}

#[inline(always)]
fn hi(block: &Block) -> u64 {
    u64::from_le_bytes([
        block[8], block[9], block[10], block[11], block[12], block[13], block[14], block[15],
    ])
}

#[inline(always)]
fn join(lo: u64, hi: u64) -> Block {
    let mut block = [0u8; 16];
    block[..8].copy_from_slice(&lo.to_le_bytes());
    block[8..].copy_from_slice(&hi.to_le_bytes());
    block
}

#[inline(always)]
pub(crate) fn xor(x: &Block, y: &Block) -> Block {
    let mut out = *x;
    for (o, b) in out.iter_mut().zip(y.iter()) {
        *o ^= b;
    }
    out
}

/// Run `iterations` steps of the mixing loop over a filled scratchpad.
///
/// Returns the final `(a, b)` registers.
pub(crate) fn mix<R: AesRound>(
    aes: R,
    scratchpad: &mut Scratchpad,
    mut a: Block,
    mut b: Block,
    iterations: usize,
) -> (Block, Block) {
    for _ in 0..iterations {
        // AES step: encrypt the block under `a`, store it XOR `b`
        let addr = lo(&a);
        let c = aes.aesenc(&scratchpad.read_block(addr), &a);
        scratchpad.write_block(addr, &xor(&b, &c));

        // Multiply-add step at the address picked by the AES output
        let addr = lo(&c);
        let d = scratchpad.read_block(addr);
        let product = (lo(&c) as u128) * (lo(&d) as u128);
        let sum = join(
            lo(&a).wrapping_add((product >> 64) as u64),
            hi(&a).wrapping_add(product as u64),
        );
        scratchpad.write_block(addr, &sum);

        a = xor(&sum, &d);
        b = c;
    }

    (a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aes::{HardAes, SoftAes, expand_key};
    use crate::params::{INIT_BLOCKS, Variant};

    fn filled(variant: Variant) -> Scratchpad {
        let mut pad = Scratchpad::new(variant).unwrap();
        let mut text = [[0u8; 16]; INIT_BLOCKS];
        for (i, block) in text.iter_mut().enumerate() {
            block.fill(0x10 + i as u8);
        }
        pad.explode(text, &expand_key(&[3u8; 32]), SoftAes);
        pad
    }

    #[test]
    fn test_register_helpers() {
        let block = join(0x0123_4567_89AB_CDEF, 0xFEDC_BA98_7654_3210);
        assert_eq!(lo(&block), 0x0123_4567_89AB_CDEF);
        assert_eq!(hi(&block), 0xFEDC_BA98_7654_3210);
        assert_eq!(block[0], 0xEF);
        assert_eq!(xor(&block, &block), [0u8; 16]);
    }

    #[test]
    fn test_mix_is_deterministic() {
        let a = [0x11u8; 16];
        let b = [0x22u8; 16];

        let mut pad1 = filled(Variant::Light);
        let mut pad2 = filled(Variant::Light);
        let r1 = mix(SoftAes, &mut pad1, a, b, 4096);
        let r2 = mix(SoftAes, &mut pad2, a, b, 4096);

        assert_eq!(r1, r2);
        assert_eq!(pad1.as_bytes(), pad2.as_bytes());
    }

    #[test]
    fn test_mix_depends_on_registers() {
        let mut pad1 = filled(Variant::Light);
        let mut pad2 = filled(Variant::Light);
        let r1 = mix(SoftAes, &mut pad1, [0x11; 16], [0x22; 16], 1024);
        let r2 = mix(SoftAes, &mut pad2, [0x11; 16], [0x23; 16], 1024);
        assert_ne!(r1, r2);
    }

    #[test]
    fn test_mix_hardware_matches_software() {
        let Some(hard) = HardAes::detect() else {
            return;
        };
        let mut soft_pad = filled(Variant::Light);
        let mut hard_pad = filled(Variant::Light);
        let soft = mix(SoftAes, &mut soft_pad, [0x5A; 16], [0xA5; 16], 8192);
        let hard = mix(hard, &mut hard_pad, [0x5A; 16], [0xA5; 16], 8192);
        assert_eq!(soft, hard);
        assert_eq!(soft_pad.as_bytes(), hard_pad.as_bytes());
    }
}
