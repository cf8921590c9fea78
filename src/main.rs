//! CryptoNight CPU miner CLI
//!
//! # Commands
//!
//! - `hash` - Hash a string or hex input
//! - `mine` - Search a job's nonce range for a share
//! - `benchmark` - Measure hashrate on both AES paths
//! - `cpu-info` - Report hardware AES support
//! - `config` - Write or print the config file

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cryptonight::algorithm::{
    has_hardware_aes, write_nonce, AesPath, CryptoNight, BLOB_LEN, NONCE_OFFSET, NONCE_SPACE,
};
use cryptonight::config::{default_config_path, Algorithm, Race};
use cryptonight::{
    mine, parse_blob, parse_target, target_from_difficulty, Job, MinerConfig, Overrides,
    ScanControl, ScanOutcome,
};

#[derive(Parser)]
#[command(name = "cryptonight")]
#[command(version)]
#[command(about = "CryptoNight / CryptoLight proof-of-work miner and benchmark")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Custom config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

/// Algorithm and AES choice; unset flags fall back to the config file
#[derive(Args, Clone, Copy)]
struct HashArgs {
    /// Use CryptoLight
    #[arg(long, conflicts_with = "full")]
    light: bool,

    /// Use CryptoNight
    #[arg(long)]
    full: bool,

    /// Force the software AES path
    #[arg(long)]
    soft: bool,
}

impl HashArgs {
    fn overrides(self) -> Overrides {
        let algorithm = if self.light {
            Some(Algorithm::Cryptolight)
        } else if self.full {
            Some(Algorithm::Cryptonight)
        } else {
            None
        };
        Overrides {
            algorithm,
            software_aes: self.soft,
            ..Overrides::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Hash an input and print the digest
    Hash {
        /// Input text (or hex with --hex)
        input: String,

        /// Treat the input as hex bytes
        #[arg(long)]
        hex: bool,

        #[command(flatten)]
        hashing: HashArgs,
    },

    /// Search a job for a nonce meeting the target
    Mine {
        /// Hashing blob as hex
        #[arg(long)]
        blob: String,

        /// Pool target: 8 or 16 little-endian hex digits, or 0x-prefixed hex.
        /// Digits are always hex; use --difficulty for a decimal value
        #[arg(long, conflicts_with = "difficulty", required_unless_present = "difficulty")]
        target: Option<String>,

        /// Share difficulty instead of a target
        #[arg(long)]
        difficulty: Option<u64>,

        /// First nonce to try
        #[arg(long, default_value = "0")]
        start: u64,

        /// Exclusive end of the nonce range
        #[arg(long, default_value_t = NONCE_SPACE)]
        end: u64,

        /// Number of threads (default: config, else number of CPU cores)
        #[arg(short, long)]
        threads: Option<usize>,

        #[command(flatten)]
        hashing: HashArgs,

        /// Report the lowest qualifying nonce instead of the first found
        #[arg(long)]
        lowest: bool,

        /// Give up after this many seconds
        #[arg(long)]
        time_limit: Option<u64>,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of hashes per AES path
        #[arg(short, long, default_value = "20")]
        count: u32,

        #[command(flatten)]
        hashing: HashArgs,
    },

    /// Show whether the hardware AES path is available
    CpuInfo,

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default config
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config
    Show,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Hash {
            input,
            hex,
            hashing,
        } => cmd_hash(config_path, &input, hex, hashing),
        Commands::Mine {
            blob,
            target,
            difficulty,
            start,
            end,
            threads,
            hashing,
            lowest,
            time_limit,
        } => cmd_mine(MineArgs {
            config_path,
            blob,
            target,
            difficulty,
            range: start..end,
            overrides: Overrides {
                threads,
                race: lowest.then_some(Race::Lowest),
                ..hashing.overrides()
            },
            time_limit,
        }),
        Commands::Benchmark { count, hashing } => cmd_benchmark(config_path, count, hashing),
        Commands::CpuInfo => cmd_cpu_info(),
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => cmd_config_init(config_path, force),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>, overrides: Overrides) -> anyhow::Result<MinerConfig> {
    Ok(MinerConfig::load_or_default(path)?.with_overrides(overrides))
}

fn cmd_hash(
    config_path: Option<&Path>,
    input: &str,
    is_hex: bool,
    hashing: HashArgs,
) -> anyhow::Result<()> {
    let config = load_config(config_path, hashing.overrides())?;
    let data = if is_hex {
        hex::decode(input.trim())?
    } else {
        input.as_bytes().to_vec()
    };

    let mut hasher = CryptoNight::new(config.variant(), config.aes_path())?;
    let digest = hasher.hash(&data);
    println!("{}", hex::encode(digest));

    Ok(())
}

struct MineArgs<'a> {
    config_path: Option<&'a Path>,
    blob: String,
    target: Option<String>,
    difficulty: Option<u64>,
    range: std::ops::Range<u64>,
    overrides: Overrides,
    time_limit: Option<u64>,
}

fn cmd_mine(args: MineArgs<'_>) -> anyhow::Result<()> {
    let config = load_config(args.config_path, args.overrides)?;

    let target = match (args.target, args.difficulty) {
        (Some(text), _) => parse_target(&text)?,
        (None, Some(difficulty)) => target_from_difficulty(difficulty)?,
        (None, None) => anyhow::bail!("either --target or --difficulty is required"),
    };
    let blob = parse_blob(&args.blob)?;
    let mut job = Job::with_layout(blob, target, config.nonce_offset, args.range)?;

    println!("Starting mining...");
    println!("Algorithm: {}", config.variant());
    println!(
        "Target: {:#010x} (difficulty {})",
        target.compact(),
        target
            .difficulty()
            .map_or_else(|| "unsatisfiable".to_string(), |d| d.to_string())
    );
    println!("Threads: {}", config.effective_threads());

    let control = ScanControl::new();
    let report = mine(
        &mut job,
        &config,
        &control,
        args.time_limit.map(Duration::from_secs),
        |progress| {
            print!(
                "\rHashrate: {:.2} H/s | Hashes: {} | Time: {:.0}s",
                progress.hashrate(),
                progress.hashes,
                progress.elapsed.as_secs_f64()
            );
            std::io::stdout().flush().ok();
        },
    )?;

    match report.outcome {
        ScanOutcome::Found {
            nonce,
            hash,
            hashes,
        } => {
            println!("\nFound valid hash!");
            println!("Nonce: {} ({})", nonce, hex::encode(nonce.to_le_bytes()));
            println!("Hash: {}", hex::encode(hash));
            println!("Blob: {}", hex::encode(&job.blob));
            println!("Hashes computed: {}", hashes);
        }
        ScanOutcome::Exhausted { hashes } => {
            if report.timed_out {
                println!("\nTime limit reached after {} hashes", hashes);
            } else {
                println!("\nRange exhausted after {} hashes", hashes);
            }
        }
    }
    println!("Average hashrate: {:.2} H/s", report.hashrate());

    Ok(())
}

fn cmd_benchmark(
    config_path: Option<&Path>,
    count: u32,
    hashing: HashArgs,
) -> anyhow::Result<()> {
    let config = load_config(config_path, hashing.overrides())?;
    let variant = config.variant();
    println!("Running {} benchmark with {} hashes...", variant, count);

    let mut paths = vec![AesPath::Software];
    if config.aes_path() == AesPath::Hardware {
        paths.push(AesPath::Hardware);
    }

    for aes in paths {
        let mut hasher = CryptoNight::new(variant, aes)?;
        let mut input = [0u8; BLOB_LEN];

        let start = Instant::now();
        for i in 0..count {
            write_nonce(&mut input, NONCE_OFFSET, i)?;
            let _ = hasher.hash(&input);
        }
        let elapsed = start.elapsed();
        let hashrate = count as f64 / elapsed.as_secs_f64();

        println!("\n{:?} AES:", aes);
        println!("  Time elapsed: {:.2}s", elapsed.as_secs_f64());
        println!("  Hashrate: {:.2} H/s", hashrate);
    }

    println!("\nAlgorithm parameters:");
    println!("  Scratchpad: {} KB", variant.memory() / 1024);
    println!("  Iterations: {}", variant.iterations());

    Ok(())
}

fn cmd_cpu_info() -> anyhow::Result<()> {
    println!("Architecture: {}", std::env::consts::ARCH);
    println!(
        "Hardware AES: {}",
        if has_hardware_aes() { "yes" } else { "no" }
    );
    println!("Logical CPUs: {}", num_cpus::get());
    Ok(())
}

fn cmd_config_init(path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}. Use --force to overwrite it.",
            path.display()
        );
    }

    MinerConfig::default().save(&path)?;
    println!("Wrote default config to {}", path.display());

    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> anyhow::Result<()> {
    let config = MinerConfig::load_or_default(path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
