//! # Logging
//! src/logging.rs
//!
//! Inicializa `tracing` para el proceso. El filtro se lee de `RUST_LOG`
//! (por defecto `info`).

use tracing_subscriber::EnvFilter;

/// Instala el subscriber global.
///
/// Se puede llamar más de una vez; las llamadas siguientes no hacen nada.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false)
        .try_init();
}
