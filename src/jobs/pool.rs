//! # Pool de Workers
//! src/jobs/pool.rs
//!
//! Dueño del conjunto fijo de workers. El tamaño se resuelve una vez en el
//! arranque y no cambia: no se crean threads por job.
//!
//! ## Graceful shutdown
//!
//! 1. Se activa el flag (los submits nuevos fallan con `ShuttingDown`)
//! 2. Se encolan exactamente N sentinels, detrás de todo job ya aceptado
//! 3. Se espera a que cada worker termine
//!
//! Los jobs en cola se drenan y los que están en ejecución no se interrumpen.

use crate::error::{JobError, Result};
use crate::jobs::queue::JobQueue;
use crate::jobs::registry::RunningJobRegistry;
use crate::jobs::storage::ResultStore;
use crate::jobs::submitter::ShutdownFlag;
use crate::jobs::worker::Worker;
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

pub struct WorkerPool {
    size: usize,
    queue: JobQueue,
    shutdown: ShutdownFlag,

    /// Handles de los workers; `None` una vez que el pool terminó
    handles: Mutex<Option<Vec<JoinHandle<usize>>>>,
}

impl WorkerPool {
    /// Lanza los `size` workers, todos sobre la misma cola, registry y store.
    ///
    /// Si algún thread no se puede crear, los ya lanzados se detienen y el
    /// arranque falla.
    pub fn start(
        size: usize,
        queue: JobQueue,
        registry: RunningJobRegistry,
        store: ResultStore,
        shutdown: ShutdownFlag,
    ) -> Result<Self> {
        if size == 0 {
            return Err(JobError::InvalidConfig("worker pool size must be >= 1".to_string()));
        }

        let mut handles = Vec::with_capacity(size);

        for index in 0..size {
            let name = format!("worker-{}", index);
            let worker = Worker::new(name.clone(), queue.clone(), registry.clone(), store.clone());

            match thread::Builder::new().name(name).spawn(move || worker.run()) {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    tracing::error!(index, error = %source, "Failed to spawn worker, aborting startup");
                    Self::stop_all(&queue, handles);
                    return Err(JobError::WorkerSpawn { index, source });
                }
            }
        }

        tracing::info!(workers = size, "Worker pool started");

        Ok(Self {
            size,
            queue,
            shutdown,
            handles: Mutex::new(Some(handles)),
        })
    }

    /// Un sentinel por worker y espera a que todos terminen.
    ///
    /// Retorna el total de jobs procesados por los workers.
    fn stop_all(queue: &JobQueue, handles: Vec<JoinHandle<usize>>) -> usize {
        for _ in 0..handles.len() {
            queue.enqueue_stop();
        }

        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    tracing::error!("Worker thread panicked");
                    0
                })
            })
            .sum()
    }

    fn handles(&self) -> MutexGuard<'_, Option<Vec<JoinHandle<usize>>>> {
        self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Número fijo de workers
    pub fn size(&self) -> usize {
        self.size
    }

    /// Verifica si todos los workers ya terminaron
    pub fn is_terminated(&self) -> bool {
        self.handles().is_none()
    }

    /// Drena la cola y detiene todos los workers.
    ///
    /// Idempotente: solo la primera llamada encola sentinels; las llamadas
    /// concurrentes esperan a que ese drenaje termine. Retorna true si esta
    /// llamada fue la que detuvo el pool.
    pub fn graceful_shutdown(&self) -> bool {
        // El lock se mantiene durante el join para que otra llamada no
        // retorne antes de que los workers terminen
        let mut guard = self.handles();

        let Some(handles) = guard.take() else {
            return false;
        };

        self.shutdown.trigger();
        tracing::info!(
            workers = self.size,
            queued = self.queue.len(),
            "Graceful shutdown requested, draining queue"
        );

        let processed = Self::stop_all(&self.queue, handles);

        tracing::info!(processed, "All workers terminated");
        true
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.graceful_shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::job::Job;
    use crate::jobs::types::JobId;
    use std::sync::Arc;
    use std::time::Duration;

    fn start(size: usize) -> (tempfile::TempDir, WorkerPool, JobQueue, ResultStore, ShutdownFlag) {
        let temp = tempfile::tempdir().unwrap();
        let store = ResultStore::open(temp.path()).unwrap();
        let queue = JobQueue::new();
        let shutdown = ShutdownFlag::new();
        let pool = WorkerPool::start(
            size,
            queue.clone(),
            RunningJobRegistry::new(),
            store.clone(),
            shutdown.clone(),
        )
        .unwrap();
        (temp, pool, queue, store, shutdown)
    }

    fn id(n: u64) -> JobId {
        JobId::new(n).unwrap()
    }

    #[test]
    fn test_pool_zero_size_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let result = WorkerPool::start(
            0,
            JobQueue::new(),
            RunningJobRegistry::new(),
            ResultStore::open(temp.path()).unwrap(),
            ShutdownFlag::new(),
        );
        assert!(matches!(result, Err(JobError::InvalidConfig(_))));
    }

    #[test]
    fn test_pool_shutdown_drains_queue() {
        let (_temp, pool, queue, store, shutdown) = start(2);
        assert_eq!(pool.size(), 2);

        for n in 1..=6 {
            queue.enqueue(Job::new(id(n), move || {
                thread::sleep(Duration::from_millis(10));
                Ok::<_, String>(n)
            }));
        }

        assert!(pool.graceful_shutdown());
        assert!(shutdown.is_set());
        assert!(pool.is_terminated());

        for n in 1..=6 {
            assert!(store.get(id(n)).unwrap().is_success());
        }
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn test_pool_shutdown_idempotent() {
        let (_temp, pool, queue, _store, _shutdown) = start(3);

        assert!(pool.graceful_shutdown());
        assert!(!pool.graceful_shutdown());

        // No quedan sentinels de sobra en la cola
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn test_pool_concurrent_shutdown() {
        let (_temp, pool, queue, store, _shutdown) = start(2);
        queue.enqueue(Job::new(id(1), || {
            thread::sleep(Duration::from_millis(100));
            Ok::<_, String>(())
        }));

        let pool = Arc::new(pool);
        let callers: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    let stopped_here = pool.graceful_shutdown();
                    // Ninguna llamada retorna antes de que el pool termine
                    assert!(pool.is_terminated());
                    stopped_here
                })
            })
            .collect();

        let stopped: Vec<bool> = callers.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(stopped.iter().filter(|s| **s).count(), 1);
        assert!(store.exists(id(1)));
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn test_pool_drop_stops_workers() {
        let (_temp, pool, queue, store, shutdown) = start(1);
        queue.enqueue(Job::new(id(1), || Ok::<_, String>("late")));

        drop(pool);

        assert!(shutdown.is_set());
        assert!(store.exists(id(1)));
    }
}
