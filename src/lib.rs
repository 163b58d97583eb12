//! # Job Runner
//! src/lib.rs
//!
//! Ejecutor asíncrono de computaciones largas: los jobs se encolan sin
//! bloquear al llamador, un pool fijo de workers los ejecuta y cada resultado
//! queda en disco para consultarlo después por id.
//!
//! ## Arquitectura
//!
//! - `jobs`: cola, workers, registry, store de resultados, submit y estado
//! - `config`: configuración por CLI y variables de entorno
//! - `error`: errores que la capa de jobs devuelve al llamador
//! - `logging`: inicialización de `tracing`
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use job_runner::jobs::{JobManager, JobManagerConfig, JobStatus};
//!
//! let manager = JobManager::new(JobManagerConfig {
//!     workers: 4,
//!     results_dir: "./results".into(),
//! })?;
//!
//! let id = manager.submit(|| Ok::<_, String>(21 * 2))?;
//! manager.graceful_shutdown();
//!
//! assert!(matches!(manager.status(id)?, JobStatus::Done(_)));
//! # Ok::<(), job_runner::error::JobError>(())
//! ```

pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;
