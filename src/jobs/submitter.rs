//! # Submit de Jobs
//! src/jobs/submitter.rs
//!
//! Asigna ids monótonos y encola jobs sin esperar a ningún worker.
//! El contador de ids y el flag de shutdown son objetos de estado
//! explícitos, cada uno con su propia sincronización.

use crate::error::{JobError, Result};
use crate::jobs::job::Job;
use crate::jobs::queue::JobQueue;
use crate::jobs::types::JobId;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Contador del último id asignado. Empieza en 0 y nunca decrece.
#[derive(Clone, Default)]
pub struct AllocationCounter {
    last: Arc<Mutex<u64>>,
}

impl AllocationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reserva el siguiente id
    pub fn allocate(&self) -> JobId {
        let mut last = self.lock();
        *last += 1;
        JobId(*last)
    }

    /// Último número de secuencia asignado (0 si todavía no hubo submits)
    pub fn current(&self) -> u64 {
        *self.lock()
    }

    /// Verifica si un id fue asignado en este proceso
    pub fn is_allocated(&self, id: JobId) -> bool {
        id.sequence() <= self.current()
    }
}

/// Flag de graceful shutdown: se activa una sola vez y nunca se limpia.
///
/// Los submits pasan por un gate mientras asignan y encolan; activar el flag
/// toma ese mismo gate, así que todo job aceptado queda en la cola antes que
/// cualquier sentinel.
#[derive(Clone, Default)]
pub struct ShutdownFlag {
    inner: Arc<FlagInner>,
}

#[derive(Default)]
struct FlagInner {
    set: AtomicBool,
    gate: Mutex<()>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    fn gate(&self) -> MutexGuard<'_, ()> {
        self.inner.gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Entra al gate de submits. Falla con `ShuttingDown` si el flag ya está activo.
    pub fn enter(&self) -> Result<MutexGuard<'_, ()>> {
        let guard = self.gate();
        if self.is_set() {
            return Err(JobError::ShuttingDown);
        }
        Ok(guard)
    }

    /// Activa el flag. Retorna true solo para la primera llamada.
    pub fn trigger(&self) -> bool {
        let _guard = self.gate();
        !self.inner.set.swap(true, Ordering::SeqCst)
    }

    pub fn is_set(&self) -> bool {
        self.inner.set.load(Ordering::SeqCst)
    }
}

/// Punto de entrada para encolar trabajo
#[derive(Clone)]
pub struct JobSubmitter {
    queue: JobQueue,
    counter: AllocationCounter,
    shutdown: ShutdownFlag,
}

impl JobSubmitter {
    pub fn new(queue: JobQueue, counter: AllocationCounter, shutdown: ShutdownFlag) -> Self {
        Self {
            queue,
            counter,
            shutdown,
        }
    }

    /// Encola un job y retorna su id inmediatamente
    ///
    /// Nunca espera por capacidad (la cola no tiene límite) ni por workers.
    pub fn submit<F, T, E>(&self, work: F) -> Result<JobId>
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        T: Serialize,
        E: fmt::Display,
    {
        let _gate = self.shutdown.enter()?;

        let id = self.counter.allocate();
        self.queue.enqueue(Job::new(id, work));

        tracing::debug!(job_id = %id, "Job submitted");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::job::QueueItem;
    use std::collections::HashSet;
    use std::thread;

    fn submitter() -> (JobSubmitter, JobQueue, AllocationCounter, ShutdownFlag) {
        let queue = JobQueue::new();
        let counter = AllocationCounter::new();
        let shutdown = ShutdownFlag::new();
        let submitter = JobSubmitter::new(queue.clone(), counter.clone(), shutdown.clone());
        (submitter, queue, counter, shutdown)
    }

    // ==================== AllocationCounter ====================

    #[test]
    fn test_counter_starts_at_zero() {
        let counter = AllocationCounter::new();
        assert_eq!(counter.current(), 0);
        assert_eq!(counter.allocate().sequence(), 1);
        assert_eq!(counter.allocate().sequence(), 2);
        assert_eq!(counter.current(), 2);
    }

    #[test]
    fn test_counter_is_allocated() {
        let counter = AllocationCounter::new();
        counter.allocate();

        assert!(counter.is_allocated(JobId::new(1).unwrap()));
        assert!(!counter.is_allocated(JobId::new(2).unwrap()));
    }

    // ==================== ShutdownFlag ====================

    #[test]
    fn test_flag_triggers_once() {
        let flag = ShutdownFlag::new();
        assert!(!flag.is_set());
        assert!(flag.trigger());
        assert!(!flag.trigger());
        assert!(flag.is_set());
    }

    #[test]
    fn test_flag_enter_after_trigger() {
        let flag = ShutdownFlag::new();
        assert!(flag.enter().is_ok());
        flag.trigger();
        assert!(matches!(flag.enter(), Err(JobError::ShuttingDown)));
    }

    // ==================== JobSubmitter ====================

    #[test]
    fn test_submit_returns_sequential_ids() {
        let (submitter, queue, counter, _) = submitter();

        let a = submitter.submit(|| Ok::<_, String>(1)).unwrap();
        let b = submitter.submit(|| Ok::<_, String>(2)).unwrap();

        assert_eq!(a.to_string(), "job_id_1");
        assert_eq!(b.to_string(), "job_id_2");
        assert_eq!(counter.current(), 2);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_submit_enqueues_in_id_order() {
        let (submitter, queue, _, _) = submitter();
        for _ in 0..4 {
            submitter.submit(|| Ok::<_, String>(())).unwrap();
        }

        for n in 1..=4 {
            match queue.try_dequeue() {
                Some(QueueItem::Job(job)) => assert_eq!(job.id().sequence(), n),
                other => panic!("unexpected queue item: {:?}", other),
            }
        }
    }

    #[test]
    fn test_submit_after_shutdown_rejected() {
        let (submitter, queue, counter, shutdown) = submitter();
        shutdown.trigger();

        let result = submitter.submit(|| Ok::<_, String>(()));
        assert!(matches!(result, Err(JobError::ShuttingDown)));
        assert_eq!(counter.current(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_concurrent_submit_unique_gapless_ids() {
        let (submitter, queue, counter, _) = submitter();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let submitter = submitter.clone();
                thread::spawn(move || {
                    (0..50)
                        .map(|_| submitter.submit(|| Ok::<_, String>(())).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            let ids = handle.join().unwrap();
            // Cada thread ve sus ids en orden creciente
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            for id in ids {
                assert!(seen.insert(id.sequence()), "duplicate id {}", id);
            }
        }

        assert_eq!(seen.len(), 400);
        assert_eq!(counter.current(), 400);
        assert!((1..=400).all(|n| seen.contains(&n)));
        assert_eq!(queue.len(), 400);
    }
}
