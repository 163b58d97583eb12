//! # Sistema de Jobs
//!
//! Ejecuta computaciones largas de forma asíncrona sobre un pool fijo de
//! workers y guarda cada resultado en disco para consultarlo después.
//!
//! ## Flujo
//!
//! `JobSubmitter` -> `JobQueue` -> `Worker` -> `ResultStore`
//!
//! `StatusResolver` lee el `RunningJobRegistry` y el `ResultStore` por su
//! cuenta, sin bloquearse con los workers.

pub mod job;
pub mod manager;
pub mod payload;
pub mod pool;
pub mod queue;
pub mod registry;
pub mod resolver;
pub mod storage;
pub mod submitter;
pub mod types;
pub mod worker;

pub use job::{Job, QueueItem};
pub use manager::{JobManager, JobManagerConfig};
pub use payload::CategoryKey;
pub use pool::WorkerPool;
pub use queue::JobQueue;
pub use registry::RunningJobRegistry;
pub use resolver::StatusResolver;
pub use storage::ResultStore;
pub use submitter::{AllocationCounter, JobSubmitter, ShutdownFlag};
pub use types::{JobId, JobOutcome, JobStatus, JobStatusKind};
pub use worker::Worker;
