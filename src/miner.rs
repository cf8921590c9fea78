//! Multi-threaded job runner
//!
//! Runs the parallel scanner on a dedicated rayon pool while the calling
//! thread polls the shared [`ScanControl`] for progress and the time limit.

use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::algorithm::{scan_parallel, AesPath, ParallelScan, ScanControl, ScanOutcome};
use crate::config::MinerConfig;
use crate::job::Job;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Error, Debug)]
pub enum MinerError {
    #[error(transparent)]
    Scan(#[from] crate::algorithm::Error),

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Snapshot passed to the progress callback.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub hashes: u64,
    pub elapsed: Duration,
}

impl Progress {
    pub fn hashrate(&self) -> f64 {
        rate(self.hashes, self.elapsed)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MineReport {
    pub outcome: ScanOutcome,
    pub elapsed: Duration,
    pub threads: usize,
    pub aes: AesPath,
    /// The time limit ended the scan
    pub timed_out: bool,
}

impl MineReport {
    pub fn hashrate(&self) -> f64 {
        rate(self.outcome.hashes(), self.elapsed)
    }
}

fn rate(hashes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        hashes as f64 / secs
    } else {
        0.0
    }
}

/// Scan `job` with the settings in `config`.
///
/// `on_progress` runs on the calling thread every `config.report_interval`
/// seconds (never when the interval is 0). When a nonce is found it is left
/// in `job.blob`.
pub fn mine(
    job: &mut Job,
    config: &MinerConfig,
    control: &ScanControl,
    time_limit: Option<Duration>,
    mut on_progress: impl FnMut(Progress),
) -> Result<MineReport, MinerError> {
    let threads = config.effective_threads();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("cryptonight-worker-{i}"))
        .build()?;

    let params = ParallelScan {
        variant: config.variant(),
        aes: config.aes_path(),
        nonce_offset: job.nonce_offset,
        workers: threads,
        policy: config.race.into(),
    };
    log::info!(
        "mining {} on {} threads ({:?} AES), target {:#010x}, nonces {}..{}",
        params.variant,
        threads,
        params.aes,
        job.target.compact(),
        job.range.start,
        job.range.end
    );

    let target = job.target;
    let range = job.range.clone();
    let blob = &mut job.blob;
    let baseline = control.hashes();
    let report_every =
        (config.report_interval > 0).then(|| Duration::from_secs(config.report_interval));
    let start = Instant::now();
    let mut timed_out = false;

    let outcome = thread::scope(|s| {
        let worker = s.spawn(move || {
            pool.install(move || scan_parallel(&params, blob, target, range, control))
        });

        let mut last_report = Instant::now();
        while !worker.is_finished() {
            thread::sleep(POLL_INTERVAL);

            if let Some(limit) = time_limit {
                if !timed_out && start.elapsed() >= limit {
                    log::debug!("time limit reached, stopping workers");
                    timed_out = true;
                    control.stop();
                }
            }

            if let Some(every) = report_every {
                if last_report.elapsed() >= every {
                    on_progress(Progress {
                        hashes: control.hashes() - baseline,
                        elapsed: start.elapsed(),
                    });
                    last_report = Instant::now();
                }
            }
        }

        match worker.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    })?;

    let report = MineReport {
        outcome,
        elapsed: start.elapsed(),
        threads,
        aes: params.aes,
        timed_out,
    };
    match outcome {
        ScanOutcome::Found { nonce, .. } => log::info!(
            "found nonce {nonce:#010x} after {} hashes",
            outcome.hashes()
        ),
        ScanOutcome::Exhausted { hashes } => log::info!("no nonce found after {hashes} hashes"),
    }
    Ok(report)
}
