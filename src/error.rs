//! # Errores del Sistema de Jobs
//! src/error.rs
//!
//! Taxonomía de errores que la capa de jobs devuelve a sus llamadores.
//! Los fallos dentro de un job NO aparecen aquí: se capturan como
//! `JobOutcome::Failure` y se persisten como resultado terminal.

use crate::jobs::types::JobId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    /// El identificador nunca fue asignado o no tiene la forma `job_id_<n>`
    #[error("Invalid job id: {0}")]
    InvalidJobId(String),

    /// Se pidió un submit después de iniciar el graceful shutdown
    #[error("Shutting down, no new jobs are accepted")]
    ShuttingDown,

    #[error("Result not found for {0}")]
    ResultNotFound(JobId),

    /// El store es write-once: un job nunca se ejecuta dos veces
    #[error("Result already stored for {0}")]
    ResultAlreadyExists(JobId),

    /// Registro corrupto o escrito a medias (p.ej. crash durante la escritura)
    #[error("Malformed result for {id}: {reason}")]
    MalformedResult { id: JobId, reason: String },

    #[error("Failed to persist result for {id}: {source}")]
    ResultPersistence {
        id: JobId,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No se pudo lanzar un thread del pool (fatal en el arranque)
    #[error("Failed to spawn worker {index}: {source}")]
    WorkerSpawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    /// Algunos jobs no llegaron a Done dentro del plazo de espera
    #[error("Timed out after {timeout_ms} ms with {pending} job(s) not done")]
    WaitTimeout { pending: usize, timeout_ms: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, JobError>;
