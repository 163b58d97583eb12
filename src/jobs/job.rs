//! # Estructura de Job
//! src/jobs/job.rs
//!
//! Un job es un id más una unidad de trabajo sin argumentos que devuelve un
//! único resultado serializable o un error. Los argumentos quedan capturados
//! por la closure, así que no hay desempaquetado dinámico.

use crate::jobs::types::{JobId, JobOutcome};
use serde::Serialize;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Trabajo ya tipado: devuelve JSON o la descripción del error
type Work = Box<dyn FnOnce() -> Result<serde_json::Value, String> + Send + 'static>;

/// Unidad de trabajo encolada
pub struct Job {
    id: JobId,
    work: Work,
}

impl Job {
    /// Envuelve cualquier closure cuyo resultado se pueda serializar
    pub fn new<F, T, E>(id: JobId, work: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Serialize,
        E: fmt::Display,
    {
        let work: Work = Box::new(move || {
            let value = work().map_err(|e| e.to_string())?;
            serde_json::to_value(value).map_err(|e| format!("Result is not serializable: {}", e))
        });

        Self { id, work }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Ejecuta el trabajo consumiendo el job.
    ///
    /// Nunca propaga un fallo: errores y panics se convierten en
    /// `JobOutcome::Failure` para que el job siempre termine.
    pub fn run(self) -> JobOutcome {
        match panic::catch_unwind(AssertUnwindSafe(self.work)) {
            Ok(Ok(data)) => JobOutcome::Success { data },
            Ok(Err(error)) => JobOutcome::Failure { error },
            Err(payload) => JobOutcome::Failure {
                error: format!("Job panicked: {}", panic_message(payload.as_ref())),
            },
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").field("id", &self.id).finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Elemento de la cola: un job real o el sentinel de parada
#[derive(Debug)]
pub enum QueueItem {
    Job(Job),

    /// Despierta y termina exactamente a un worker
    Stop,
}

impl QueueItem {
    pub fn is_job(&self) -> bool {
        matches!(self, QueueItem::Job(_))
    }
}
