//! AES round function, key schedule and hardware dispatch
//!
//! CryptoNight only ever needs the single AESENC round (SubBytes, ShiftRows,
//! MixColumns, AddRoundKey) and the AES-256 key expansion. The round exists
//! twice: a portable software version and a hardware version (x86_64 AES-NI,
//! aarch64 crypto extensions). Both produce identical output.

use crate::params::{AES_BLOCK_SIZE, AES_ROUNDS, INIT_BLOCKS};

/// One 128-bit AES block
pub type Block = [u8; AES_BLOCK_SIZE];

/// Expanded key material for the explode/implode phases
pub type RoundKeys = [Block; AES_ROUNDS];

#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
cpufeatures::new!(aes_intrinsics, "aes");

/// Whether the hardware AES round is usable on this host.
///
/// Advisory only: digests never depend on the answer.
pub fn has_hardware_aes() -> bool {
    #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
    {
        aes_intrinsics::get()
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        false
    }
}

/// Which AESENC implementation a hasher runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AesPath {
    /// Portable S-box round
    Software,
    /// CPU AES instructions
    Hardware,
}

impl AesPath {
    /// Resolve a caller preference against what the host supports.
    ///
    /// Asking for hardware on a host without it silently yields
    /// [`AesPath::Software`].
    pub fn select(prefer_hardware: bool) -> Self {
        if prefer_hardware && has_hardware_aes() {
            AesPath::Hardware
        } else {
            if prefer_hardware {
                log::trace!("hardware AES requested but unavailable, using software round");
            }
            AesPath::Software
        }
    }

    /// Best path available on this host
    pub fn detect() -> Self {
        Self::select(true)
    }
}

/// A single AESENC round implementation.
pub(crate) trait AesRound: Copy {
    fn aesenc(self, state: &Block, key: &Block) -> Block;

    /// Ten AESENC rounds over every block of an explode/implode chunk.
    #[inline(always)]
    fn pseudo_rounds(self, text: &mut [Block; INIT_BLOCKS], keys: &RoundKeys) {
        for block in text.iter_mut() {
            for key in keys {
                *block = self.aesenc(block, key);
            }
        }
    }
}

/// Portable software round
#[derive(Debug, Clone, Copy)]
pub(crate) struct SoftAes;

impl AesRound for SoftAes {
    #[inline(always)]
    fn aesenc(self, state: &Block, key: &Block) -> Block {
        aesenc_soft(state, key)
    }
}

/// Hardware round. Only obtainable through [`HardAes::detect`], so holding
/// one proves the instructions exist.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HardAes(());

impl HardAes {
    pub(crate) fn detect() -> Option<Self> {
        has_hardware_aes().then_some(HardAes(()))
    }
}

impl AesRound for HardAes {
    #[inline(always)]
    fn aesenc(self, state: &Block, key: &Block) -> Block {
        #[cfg(target_arch = "x86_64")]
        {
            // SAFETY: a HardAes token exists only after runtime detection succeeded
            unsafe { aesenc_x86(state, key) }
        }

        #[cfg(target_arch = "aarch64")]
        {
            // SAFETY: a HardAes token exists only after runtime detection succeeded
            unsafe { aesenc_arm(state, key) }
        }

        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            aesenc_soft(state, key)
        }
    }
}

/// x86_64 AES-NI round
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "aes")]
#[inline]
unsafe fn aesenc_x86(state: &Block, key: &Block) -> Block {
    use core::arch::x86_64::{__m128i, _mm_aesenc_si128, _mm_loadu_si128, _mm_storeu_si128};

    unsafe {
        let s = _mm_loadu_si128(state.as_ptr() as *const __m128i);
        let k = _mm_loadu_si128(key.as_ptr() as *const __m128i);
        let r = _mm_aesenc_si128(s, k);

        let mut result = [0u8; AES_BLOCK_SIZE];
        _mm_storeu_si128(result.as_mut_ptr() as *mut __m128i, r);
        result
    }
}

/// ARM crypto extension round
#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "aes")]
#[inline]
unsafe fn aesenc_arm(state: &Block, key: &Block) -> Block {
    use core::arch::aarch64::{vaeseq_u8, vaesmcq_u8, vdupq_n_u8, veorq_u8, vld1q_u8, vst1q_u8};

    unsafe {
        let s = vld1q_u8(state.as_ptr());
        let k = vld1q_u8(key.as_ptr());

        // AESE XORs its key before SubBytes, AESENC after MixColumns: run
        // AESE with a zero key, then MixColumns, then XOR the real key.
        let r = veorq_u8(vaesmcq_u8(vaeseq_u8(s, vdupq_n_u8(0))), k);

        let mut result = [0u8; AES_BLOCK_SIZE];
        vst1q_u8(result.as_mut_ptr(), r);
        result
    }
}

/// Single AESENC round: SubBytes + ShiftRows + MixColumns + AddRoundKey
#[inline(always)]
pub fn aesenc_soft(state: &Block, round_key: &Block) -> Block {
    // SubBytes
    let mut s = [0u8; AES_BLOCK_SIZE];
    for (out, byte) in s.iter_mut().zip(state.iter()) {
        *out = SBOX[*byte as usize];
    }

    // ShiftRows on the column-major 4x4 matrix
    let t = s;
    s[1] = t[5];
    s[5] = t[9];
    s[9] = t[13];
    s[13] = t[1];

    s[2] = t[10];
    s[6] = t[14];
    s[10] = t[2];
    s[14] = t[6];

    s[3] = t[15];
    s[7] = t[3];
    s[11] = t[7];
    s[15] = t[11];

    // MixColumns
    let mut out = [0u8; AES_BLOCK_SIZE];
    for col in 0..4 {
        let i = col * 4;
        let (a0, a1, a2, a3) = (s[i], s[i + 1], s[i + 2], s[i + 3]);

        out[i] = gf_mul2(a0) ^ gf_mul3(a1) ^ a2 ^ a3;
        out[i + 1] = a0 ^ gf_mul2(a1) ^ gf_mul3(a2) ^ a3;
        out[i + 2] = a0 ^ a1 ^ gf_mul2(a2) ^ gf_mul3(a3);
        out[i + 3] = gf_mul3(a0) ^ a1 ^ a2 ^ gf_mul2(a3);
    }

    // AddRoundKey
    for (byte, k) in out.iter_mut().zip(round_key.iter()) {
        *byte ^= k;
    }

    out
}

/// AES-256 key expansion, truncated to the first ten round keys.
pub fn expand_key(key: &[u8; 32]) -> RoundKeys {
    const RCON: [u8; 4] = [0x01, 0x02, 0x04, 0x08];
    const WORDS: usize = AES_ROUNDS * 4;

    let mut w = [[0u8; 4]; WORDS];
    for (i, word) in w.iter_mut().take(8).enumerate() {
        word.copy_from_slice(&key[i * 4..i * 4 + 4]);
    }

    for i in 8..WORDS {
        let mut t = w[i - 1];
        if i % 8 == 0 {
            // RotWord + SubWord + Rcon
            t = [
                SBOX[t[1] as usize] ^ RCON[i / 8 - 1],
                SBOX[t[2] as usize],
                SBOX[t[3] as usize],
                SBOX[t[0] as usize],
            ];
        } else if i % 8 == 4 {
            t = t.map(|b| SBOX[b as usize]);
        }
        for b in 0..4 {
            w[i][b] = w[i - 8][b] ^ t[b];
        }
    }

    let mut keys = [[0u8; AES_BLOCK_SIZE]; AES_ROUNDS];
    for (k, round_key) in keys.iter_mut().enumerate() {
        for (j, word) in w[k * 4..k * 4 + 4].iter().enumerate() {
            round_key[j * 4..j * 4 + 4].copy_from_slice(word);
        }
    }
    keys
}

/// Multiply by 2 in GF(2^8) with reduction polynomial x^8 + x^4 + x^3 + x + 1
#[inline(always)]
fn gf_mul2(x: u8) -> u8 {
    let hi = x >> 7;
    (x << 1) ^ (hi * 0x1b)
}

/// Multiply by 3 in GF(2^8): 3*x = 2*x + x
#[inline(always)]
fn gf_mul3(x: u8) -> u8 {
    gf_mul2(x) ^ x
}

/// AES S-box
const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];
