//! CryptoNight CPU miner
//!
//! Front end for the CryptoNight / CryptoLight proof-of-work hash: job and
//! target parsing, a JSON config file, and a multi-threaded job runner.
//!
//! # Example
//!
//! ```rust,no_run
//! use cryptonight::{mine, parse_blob, parse_target, Job, MinerConfig, ScanControl};
//!
//! let blob = parse_blob(&"00".repeat(76)).unwrap();
//! let mut job = Job::new(blob, parse_target("b88d0600").unwrap()).unwrap();
//!
//! let control = ScanControl::new();
//! let report = mine(&mut job, &MinerConfig::default(), &control, None, |p| {
//!     println!("{:.2} H/s", p.hashrate());
//! })
//! .unwrap();
//!
//! if let Some(nonce) = report.outcome.nonce() {
//!     println!("found nonce {nonce}");
//! }
//! ```

// Re-export the core algorithm
pub use cryptonight_core as algorithm;

pub mod config;
pub mod job;
pub mod miner;

// Convenience re-exports
pub use algorithm::{ScanControl, ScanOutcome, Target, Variant};
pub use config::{ConfigError, MinerConfig, Overrides};
pub use job::{parse_blob, parse_target, target_from_difficulty, Job, JobError};
pub use miner::{mine, MineReport, MinerError, Progress};
