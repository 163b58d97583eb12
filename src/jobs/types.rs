//! # Tipos y Estructuras para el Sistema de Jobs
//! src/jobs/types.rs
//!
//! Define los tipos fundamentales para el manejo de trabajos asíncronos:
//! el identificador de un job, el resultado persistido y el estado derivado.

use crate::error::JobError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefijo de los identificadores en su forma de texto
const JOB_ID_PREFIX: &str = "job_id_";

/// Identificador de un job.
///
/// En memoria es solo el número de secuencia; la forma `job_id_<n>` existe
/// únicamente en el borde (nombres de archivo, respuestas al cliente).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub(crate) u64);

impl JobId {
    /// Crea un id a partir de su número de secuencia (>= 1)
    pub fn new(sequence: u64) -> Option<Self> {
        if sequence == 0 {
            None
        } else {
            Some(Self(sequence))
        }
    }

    /// Número de secuencia del job
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", JOB_ID_PREFIX, self.0)
    }
}

impl FromStr for JobId {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix(JOB_ID_PREFIX)
            .ok_or_else(|| JobError::InvalidJobId(s.to_string()))?;

        // Solo dígitos ASCII: rechaza signos, espacios y "+1"
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(JobError::InvalidJobId(s.to_string()));
        }

        digits
            .parse::<u64>()
            .ok()
            .and_then(JobId::new)
            .ok_or_else(|| JobError::InvalidJobId(s.to_string()))
    }
}

impl Serialize for JobId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Resultado terminal de un job, tal como se persiste en el ResultStore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum JobOutcome {
    /// El job terminó y devolvió un valor
    Success { data: serde_json::Value },

    /// El job falló (error devuelto, panic, o resultado perdido al persistir)
    Failure { error: String },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success { .. })
    }

    /// Datos del resultado (si terminó bien)
    pub fn data(&self) -> Option<&serde_json::Value> {
        match self {
            JobOutcome::Success { data } => Some(data),
            JobOutcome::Failure { .. } => None,
        }
    }

    /// Descripción del fallo (si falló)
    pub fn error(&self) -> Option<&str> {
        match self {
            JobOutcome::Success { .. } => None,
            JobOutcome::Failure { error } => Some(error),
        }
    }
}

/// Estado de un job, derivado del contador, el registry y el store
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// Asignado pero todavía no empezó
    Pending,

    /// Algún worker lo está ejecutando
    Running,

    /// Terminado, con su resultado
    Done(JobOutcome),
}

impl JobStatus {
    pub fn kind(&self) -> JobStatusKind {
        match self {
            JobStatus::Pending => JobStatusKind::Pending,
            JobStatus::Running => JobStatusKind::Running,
            JobStatus::Done(_) => JobStatusKind::Done,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, JobStatus::Done(_))
    }
}

/// Estado sin payload, para listados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatusKind {
    Pending,
    Running,
    Done,
}

impl JobStatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatusKind::Pending => "pending",
            JobStatusKind::Running => "running",
            JobStatusKind::Done => "done",
        }
    }
}

impl fmt::Display for JobStatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
