//! # Registro de Jobs en Ejecución
//! src/jobs/registry.rs
//!
//! Conjunto thread-safe de los ids que algún worker está ejecutando.
//! Un id entra justo después del dequeue y sale después de persistir el
//! resultado; solo el worker dueño del job lo modifica.

use crate::jobs::types::JobId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct RunningJobRegistry {
    running: Arc<Mutex<HashSet<JobId>>>,
}

impl RunningJobRegistry {
    pub fn new() -> Self {
        Self {
            running: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<JobId>> {
        self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Marca un job como running.
    ///
    /// Retorna false si ya estaba registrado
    pub fn mark_running(&self, id: JobId) -> bool {
        self.lock().insert(id)
    }

    /// Saca un job del registro. Retorna false si no estaba.
    pub fn mark_done(&self, id: JobId) -> bool {
        self.lock().remove(&id)
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.lock().contains(&id)
    }

    /// Número de jobs ejecutándose en este instante
    pub fn snapshot_count(&self) -> usize {
        self.lock().len()
    }

    /// Copia ordenada de los ids en ejecución
    pub fn snapshot(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self.lock().iter().copied().collect();
        ids.sort();
        ids
    }
}

impl Default for RunningJobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RunningJobRegistry {
    fn clone(&self) -> Self {
        Self {
            running: Arc::clone(&self.running),
        }
    }
}
