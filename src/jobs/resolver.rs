//! # Consulta de Estado
//! src/jobs/resolver.rs
//!
//! Resuelve el estado de un job a partir del contador de ids, el registry de
//! jobs en ejecución y el store de resultados. Nunca toca la cola ni espera
//! a los workers.

use crate::error::{JobError, Result};
use crate::jobs::registry::RunningJobRegistry;
use crate::jobs::storage::ResultStore;
use crate::jobs::submitter::AllocationCounter;
use crate::jobs::types::{JobId, JobStatus, JobStatusKind};

#[derive(Clone)]
pub struct StatusResolver {
    counter: AllocationCounter,
    registry: RunningJobRegistry,
    store: ResultStore,
}

impl StatusResolver {
    pub fn new(counter: AllocationCounter, registry: RunningJobRegistry, store: ResultStore) -> Self {
        Self {
            counter,
            registry,
            store,
        }
    }

    /// Estado de un job a partir de su id en forma de texto (`job_id_<n>`)
    pub fn status_str(&self, raw: &str) -> Result<JobStatus> {
        let id: JobId = raw.parse()?;
        self.status(id)
    }

    /// Estado de un job
    ///
    /// - `InvalidJobId` si el id nunca fue asignado
    /// - `Running` si algún worker lo tiene, o si su registro está corrupto
    /// - `Done` si el store tiene un resultado bien formado
    /// - `Pending` en otro caso
    pub fn status(&self, id: JobId) -> Result<JobStatus> {
        if !self.counter.is_allocated(id) {
            return Err(JobError::InvalidJobId(id.to_string()));
        }

        // El registry se consulta antes que el store: el worker escribe el
        // resultado antes de salir del registry, así un job nunca parece
        // volver de Running a Pending
        if self.registry.contains(id) {
            return Ok(JobStatus::Running);
        }

        match self.store.get(id) {
            Ok(outcome) => Ok(JobStatus::Done(outcome)),
            Err(JobError::ResultNotFound(_)) => Ok(JobStatus::Pending),
            Err(JobError::MalformedResult { reason, .. }) => {
                tracing::warn!(job_id = %id, reason = %reason, "Malformed result, reporting running");
                Ok(JobStatus::Running)
            }
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "Failed to read result, reporting running");
                Ok(JobStatus::Running)
            }
        }
    }

    /// Estado de todos los jobs asignados, en orden de id
    pub fn list_jobs(&self) -> Vec<(JobId, JobStatusKind)> {
        let last = self.counter.current();

        (1..=last)
            .filter_map(JobId::new)
            .map(|id| {
                let kind = self
                    .status(id)
                    .map(|status| status.kind())
                    .unwrap_or(JobStatusKind::Running);
                (id, kind)
            })
            .collect()
    }
}
