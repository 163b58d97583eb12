//! # Gestor Central de Jobs
//! src/jobs/manager.rs
//!
//! Arma todas las piezas (cola, registry, store, pool, submitter, resolver)
//! y expone el contrato que consume la capa de transporte.

use crate::config::Config;
use crate::error::Result;
use crate::jobs::pool::WorkerPool;
use crate::jobs::queue::JobQueue;
use crate::jobs::registry::RunningJobRegistry;
use crate::jobs::resolver::StatusResolver;
use crate::jobs::storage::ResultStore;
use crate::jobs::submitter::{AllocationCounter, JobSubmitter, ShutdownFlag};
use crate::jobs::types::{JobId, JobStatus, JobStatusKind};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

/// Configuración del Job Manager
#[derive(Debug, Clone)]
pub struct JobManagerConfig {
    /// Número fijo de workers
    pub workers: usize,

    /// Directorio de resultados
    pub results_dir: PathBuf,
}

impl JobManagerConfig {
    /// Crea una configuración desde el Config principal
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.worker_count(),
            results_dir: PathBuf::from(&config.results_dir),
        }
    }
}

/// Gestor central de jobs
pub struct JobManager {
    submitter: JobSubmitter,
    resolver: StatusResolver,
    queue: JobQueue,
    registry: RunningJobRegistry,
    store: ResultStore,
    shutdown: ShutdownFlag,
    pool: WorkerPool,
}

impl JobManager {
    /// Abre el store y lanza todos los workers antes de aceptar submits
    pub fn new(config: JobManagerConfig) -> Result<Self> {
        let store = ResultStore::open(&config.results_dir)?;
        let queue = JobQueue::new();
        let registry = RunningJobRegistry::new();
        let counter = AllocationCounter::new();
        let shutdown = ShutdownFlag::new();

        let pool = WorkerPool::start(
            config.workers,
            queue.clone(),
            registry.clone(),
            store.clone(),
            shutdown.clone(),
        )?;

        Ok(Self {
            submitter: JobSubmitter::new(queue.clone(), counter.clone(), shutdown.clone()),
            resolver: StatusResolver::new(counter, registry.clone(), store.clone()),
            queue,
            registry,
            store,
            shutdown,
            pool,
        })
    }

    /// Encola un job y retorna su id sin esperar a que se ejecute
    pub fn submit<F, T, E>(&self, work: F) -> Result<JobId>
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        T: Serialize,
        E: fmt::Display,
    {
        self.submitter.submit(work)
    }

    pub fn status(&self, id: JobId) -> Result<JobStatus> {
        self.resolver.status(id)
    }

    /// Igual que `status`, con el id en forma de texto
    pub fn status_str(&self, raw: &str) -> Result<JobStatus> {
        self.resolver.status_str(raw)
    }

    /// Estado de todos los jobs asignados
    pub fn list_jobs(&self) -> Vec<(JobId, JobStatusKind)> {
        self.resolver.list_jobs()
    }

    /// Jobs en cola más jobs en ejecución en este instante.
    ///
    /// Es aproximado: la cola y el registry se leen con locks distintos, así
    /// que un job que un worker acaba de sacar de la cola y todavía no marcó
    /// como running puede no contarse. Sirve para introspección, no para
    /// sincronizar.
    pub fn pending_plus_running_count(&self) -> usize {
        self.queue.len() + self.registry.snapshot_count()
    }

    /// Espera (con polling cada `poll`) a que todos los jobs asignados estén
    /// Done. Retorna `false` si se cumple `timeout` antes.
    pub fn wait_all_done(&self, poll: Duration, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            let jobs = self.list_jobs();
            let done = jobs.iter().filter(|(_, kind)| *kind == JobStatusKind::Done).count();

            tracing::debug!(
                done,
                total = jobs.len(),
                in_flight = self.pending_plus_running_count(),
                "Polling job status"
            );

            if done == jobs.len() {
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(done, total = jobs.len(), "Timed out waiting for jobs");
                return false;
            }
            thread::sleep(poll.min(deadline - now));
        }
    }

    /// Deja de aceptar jobs, drena la cola y detiene los workers
    pub fn graceful_shutdown(&self) -> bool {
        self.pool.graceful_shutdown()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_set()
    }

    pub fn worker_count(&self) -> usize {
        self.pool.size()
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }
}
