//! # Job Runner - Entry Point
//! src/main.rs
//!
//! Arranca el pool, encola jobs de ejemplo (promedios agrupados sobre un
//! dataset sintético), consulta su estado hasta que terminan y hace el
//! graceful shutdown.

use job_runner::config::Config;
use job_runner::error::{JobError, Result};
use job_runner::jobs::payload::mean_by_key;
use job_runner::jobs::{CategoryKey, JobManager, JobManagerConfig, JobStatus, JobStatusKind};
use job_runner::logging;
use std::thread;
use std::time::{Duration, Instant};

const STATES: [&str; 3] = ["Ohio", "Texas", "Utah"];
const CATEGORIES: [(&str, &str); 3] = [
    ("Gender", "Female"),
    ("Gender", "Male"),
    ("Age (years)", "18 - 24"),
];

/// Filas sintéticas `(estado, categoría, estrato) -> valor`
fn synthetic_rows(seed: u64) -> Vec<(CategoryKey, f64)> {
    let mut rows = Vec::new();

    for (s, state) in STATES.iter().enumerate() {
        for (c, (category, stratum)) in CATEGORIES.iter().enumerate() {
            for sample in 0..4u64 {
                let raw = (seed * 37 + s as u64 * 11 + c as u64 * 7 + sample * 3) % 50;
                rows.push((CategoryKey::new([*state, *category, *stratum]), raw as f64 + 10.0));
            }
        }
    }

    rows
}

fn run(config: Config) -> Result<()> {
    config.validate()?;
    config.print_summary();

    let manager = JobManager::new(JobManagerConfig::from_config(&config))?;
    let job_duration = Duration::from_millis(config.demo_job_ms);
    let started = Instant::now();

    let mut ids = Vec::with_capacity(config.demo_jobs);
    for n in 0..config.demo_jobs as u64 {
        let id = manager.submit(move || {
            thread::sleep(job_duration);

            // El último job falla a propósito para mostrar el payload de error
            if n == 7 {
                return Err(format!("Unknown question for demo job {}", n));
            }
            Ok(mean_by_key(synthetic_rows(n)))
        })?;
        ids.push(id);
    }

    tracing::info!(submitted = ids.len(), "Demo jobs submitted");

    let poll = Duration::from_millis(config.poll_interval_ms);
    let timeout = Duration::from_millis(config.demo_timeout_ms);
    if !manager.wait_all_done(poll, timeout) {
        let pending = manager
            .list_jobs()
            .iter()
            .filter(|(_, kind)| *kind != JobStatusKind::Done)
            .count();
        manager.graceful_shutdown();
        return Err(JobError::WaitTimeout {
            pending,
            timeout_ms: config.demo_timeout_ms,
        });
    }

    for id in &ids {
        match manager.status(*id)? {
            JobStatus::Done(outcome) => match outcome.data() {
                Some(data) => println!("{} done: {}", id, data),
                None => println!("{} failed: {}", id, outcome.error().unwrap_or("unknown error")),
            },
            other => println!("{} {:?}", id, other.kind()),
        }
    }

    manager.graceful_shutdown();
    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "Demo finished");

    Ok(())
}

fn main() {
    logging::init();

    // Crear configuración (CLI + env)
    let config = Config::new();

    if let Err(e) = run(config) {
        tracing::error!(error = %e, "Fatal error");
        std::process::exit(1);
    }
}
