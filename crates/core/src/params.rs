//! CryptoNight / CryptoLight algorithm parameters

/// Keccak-f[1600] state size in bytes
pub const STATE_SIZE: usize = 200;

/// AES block size
pub const AES_BLOCK_SIZE: usize = 16;

/// Number of AES round keys used by the explode/implode phases
pub const AES_ROUNDS: usize = 10;

/// Bytes of sponge state fed through the scratchpad (8 AES blocks)
pub const INIT_SIZE: usize = 128;

/// Blocks per explode/implode chunk
pub const INIT_BLOCKS: usize = INIT_SIZE / AES_BLOCK_SIZE;

/// Digest size
pub const HASH_SIZE: usize = 32;

/// Default hashing blob length handed out by pools
pub const BLOB_LEN: usize = 76;

/// Offset of the 32-bit little-endian nonce inside the hashing blob
pub const NONCE_OFFSET: usize = 39;

/// Nonce width in bytes
pub const NONCE_SIZE: usize = 4;

/// Exclusive upper end of the nonce space
pub const NONCE_SPACE: u64 = 1 << 32;

/// Scratchpad size for the full variant (2 MB)
pub const CRYPTONIGHT_MEMORY: usize = 1 << 21;

/// Mixing iterations for the full variant
pub const CRYPTONIGHT_ITERATIONS: usize = 1 << 19;

/// Scratchpad size for the light variant (1 MB)
pub const CRYPTOLIGHT_MEMORY: usize = 1 << 20;

/// Mixing iterations for the light variant
pub const CRYPTOLIGHT_ITERATIONS: usize = 1 << 18;

/// Which member of the hash family to compute.
///
/// Both variants share every phase of the algorithm and differ only in
/// scratchpad size and the number of mixing iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    /// CryptoNight: 2 MB scratchpad, 524 288 iterations
    #[default]
    Full,
    /// CryptoLight: 1 MB scratchpad, 262 144 iterations
    Light,
}

impl Variant {
    /// Scratchpad size in bytes (always a power of two)
    pub const fn memory(self) -> usize {
        match self {
            Variant::Full => CRYPTONIGHT_MEMORY,
            Variant::Light => CRYPTOLIGHT_MEMORY,
        }
    }

    /// Number of mixing loop iterations
    pub const fn iterations(self) -> usize {
        match self {
            Variant::Full => CRYPTONIGHT_ITERATIONS,
            Variant::Light => CRYPTOLIGHT_ITERATIONS,
        }
    }

    /// Mask folding a 64-bit register into a 16-byte aligned scratchpad offset
    pub const fn address_mask(self) -> usize {
        self.memory() - AES_BLOCK_SIZE
    }

    /// Short lowercase name, as used on the command line
    pub const fn name(self) -> &'static str {
        match self {
            Variant::Full => "cryptonight",
            Variant::Light => "cryptolight",
        }
    }
}

impl core::fmt::Display for Variant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for Variant {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cryptonight" | "cn" | "full" => Ok(Variant::Full),
            "cryptolight" | "cn-lite" | "light" => Ok(Variant::Light),
            _ => Err(crate::Error::UnknownVariant),
        }
    }
}
