//! # Cola FIFO para Jobs
//! src/jobs/queue.rs
//!
//! Implementa una cola thread-safe, sin límite de capacidad, que entrega los
//! jobs en estricto orden de llegada. Admite un sentinel de parada para
//! despertar a los workers bloqueados durante el shutdown.

use crate::jobs::job::{Job, QueueItem};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Cola FIFO thread-safe
pub struct JobQueue {
    /// Items pendientes (jobs y sentinels)
    items: Arc<Mutex<VecDeque<QueueItem>>>,

    /// Condvar para notificar cuando hay nuevos items
    condvar: Arc<Condvar>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(VecDeque::new())),
            condvar: Arc::new(Condvar::new()),
        }
    }

    /// Cada sección crítica deja la cola consistente, así que un lock
    /// envenenado se puede seguir usando
    fn lock(&self) -> MutexGuard<'_, VecDeque<QueueItem>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Encola un job al final. Nunca bloquea ni falla.
    pub fn enqueue(&self, job: Job) {
        self.push(QueueItem::Job(job));
    }

    /// Encola un sentinel de parada
    pub fn enqueue_stop(&self) {
        self.push(QueueItem::Stop);
    }

    fn push(&self, item: QueueItem) {
        let mut items = self.lock();
        items.push_back(item);

        // Notificar a un worker esperando
        self.condvar.notify_one();
    }

    /// Desencola el siguiente item
    ///
    /// Bloquea hasta que haya uno disponible
    pub fn dequeue(&self) -> QueueItem {
        let mut items = self.lock();

        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }

            items = self
                .condvar
                .wait(items)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Intenta desencolar sin bloquear
    pub fn try_dequeue(&self) -> Option<QueueItem> {
        self.lock().pop_front()
    }

    /// Número de jobs reales esperando (sin contar sentinels)
    pub fn len(&self) -> usize {
        self.lock().iter().filter(|item| item.is_job()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for JobQueue {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            condvar: Arc::clone(&self.condvar),
        }
    }
}
