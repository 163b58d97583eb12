//! # Configuración del Ejecutor de Jobs
//! src/config.rs
//!
//! Configuración con soporte para argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./job_runner --workers 4 --results-dir ./results
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! TP_NUM_OF_THREADS=4 RESULTS_DIR=/var/lib/jobs ./job_runner
//! ```

use crate::error::{JobError, Result};
use clap::Parser;

/// Configuración del ejecutor
#[derive(Debug, Clone, Parser)]
#[command(name = "job_runner")]
#[command(about = "Ejecutor asíncrono de jobs largos con pool fijo de workers")]
#[command(version = "0.1.0")]
pub struct Config {
    // === Workers ===
    /// Número de workers. Si no se indica, se usa la concurrencia del hardware.
    ///
    /// Un override explícito se respeta aunque supere la cantidad de cores;
    /// en ese caso `print_summary` registra un warning.
    #[arg(long, env = "TP_NUM_OF_THREADS")]
    pub workers: Option<usize>,

    // === Storage ===
    /// Directorio donde se guarda un archivo JSON por job
    #[arg(long = "results-dir", default_value = "./results", env = "RESULTS_DIR")]
    pub results_dir: String,

    // === Demo ===
    /// Cantidad de jobs de ejemplo que encola el binario
    #[arg(long = "demo-jobs", default_value = "8", env = "DEMO_JOBS")]
    pub demo_jobs: usize,

    /// Duración simulada de cada job de ejemplo en milisegundos
    #[arg(long = "demo-job-ms", default_value = "200", env = "DEMO_JOB_MS")]
    pub demo_job_ms: u64,

    /// Intervalo de polling del estado en milisegundos
    #[arg(long = "poll-interval-ms", default_value = "50", env = "POLL_INTERVAL_MS")]
    pub poll_interval_ms: u64,

    /// Tiempo máximo de espera a que terminen los jobs de ejemplo
    #[arg(long = "demo-timeout-ms", default_value = "30000", env = "DEMO_TIMEOUT_MS")]
    pub demo_timeout_ms: u64,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Concurrencia disponible en el host
    pub fn hardware_concurrency() -> usize {
        num_cpus::get().max(1)
    }

    /// Tamaño del pool: el override explícito o la concurrencia del hardware
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(Self::hardware_concurrency)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(JobError::InvalidConfig("Workers must be >= 1".to_string()));
        }

        if self.results_dir.trim().is_empty() {
            return Err(JobError::InvalidConfig("Results dir must not be empty".to_string()));
        }

        if self.poll_interval_ms == 0 {
            return Err(JobError::InvalidConfig("Poll interval must be > 0".to_string()));
        }

        if self.demo_timeout_ms == 0 {
            return Err(JobError::InvalidConfig("Demo timeout must be > 0".to_string()));
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn print_summary(&self) {
        let hardware = Self::hardware_concurrency();
        let workers = self.worker_count();

        tracing::info!(
            workers,
            hardware_concurrency = hardware,
            source = if self.workers.is_some() { "override" } else { "hardware" },
            results_dir = %self.results_dir,
            "Worker pool configuration"
        );

        if workers > hardware {
            tracing::warn!(
                workers,
                hardware_concurrency = hardware,
                "Worker count exceeds hardware concurrency"
            );
        }

        tracing::info!(
            demo_jobs = self.demo_jobs,
            demo_job_ms = self.demo_job_ms,
            poll_interval_ms = self.poll_interval_ms,
            demo_timeout_ms = self.demo_timeout_ms,
            "Demo configuration"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            workers: None,
            results_dir: "./results".to_string(),
            demo_jobs: 8,
            demo_job_ms: 200,
            poll_interval_ms: 50,
            demo_timeout_ms: 30_000,
        }
    }
}
