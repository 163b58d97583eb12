//! # Worker
//! src/jobs/worker.rs
//!
//! Unidad de ejecución de larga vida. Toma jobs de la cola compartida, los
//! ejecuta de a uno y persiste su resultado.
//!
//! Estados: Idle (bloqueado en `dequeue`) -> Executing -> Idle, o
//! Idle -> Terminated al recibir el sentinel.

use crate::jobs::job::{Job, QueueItem};
use crate::jobs::queue::JobQueue;
use crate::jobs::registry::RunningJobRegistry;
use crate::jobs::storage::ResultStore;
use crate::jobs::types::JobOutcome;

pub struct Worker {
    name: String,
    queue: JobQueue,
    registry: RunningJobRegistry,
    store: ResultStore,
}

impl Worker {
    pub fn new(
        name: String,
        queue: JobQueue,
        registry: RunningJobRegistry,
        store: ResultStore,
    ) -> Self {
        Self {
            name,
            queue,
            registry,
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Loop principal del worker. Retorna cuando recibe el sentinel.
    ///
    /// Retorna la cantidad de jobs procesados.
    pub fn run(self) -> usize {
        tracing::info!(worker = %self.name, "Worker started");
        let mut processed = 0;

        loop {
            match self.queue.dequeue() {
                QueueItem::Stop => break,
                QueueItem::Job(job) => {
                    self.execute(job);
                    processed += 1;
                }
            }
        }

        tracing::info!(worker = %self.name, processed, "Worker terminated");
        processed
    }

    /// Ejecuta un job completo: running -> ejecutar -> persistir -> done
    fn execute(&self, job: Job) {
        let id = job.id();

        if !self.registry.mark_running(id) {
            tracing::warn!(worker = %self.name, job_id = %id, "Job was already marked running");
        }
        tracing::debug!(worker = %self.name, job_id = %id, "Picked up job");

        let outcome = job.run();
        match &outcome {
            JobOutcome::Success { .. } => {
                tracing::info!(worker = %self.name, job_id = %id, "Job completed");
            }
            JobOutcome::Failure { error } => {
                tracing::warn!(worker = %self.name, job_id = %id, error = %error, "Job failed");
            }
        }

        // El job sale de running aunque no se pueda escribir el resultado
        if let Err(e) = self.store.put(id, &outcome) {
            tracing::error!(
                worker = %self.name,
                job_id = %id,
                error = %e,
                "Failed to persist job result"
            );
            self.store.record_persistence_failure(id, e.to_string());
        }

        self.registry.mark_done(id);
    }
}
