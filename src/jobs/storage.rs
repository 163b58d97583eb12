//! # Persistencia de Resultados
//! src/jobs/storage.rs
//!
//! Un archivo JSON por job (`<dir>/job_id_<n>.json`), escrito una sola vez.
//! La escritura va a un archivo temporal, se sincroniza a disco y se renombra
//! (atómico en sistemas Unix), así que cuando `put` retorna el resultado ya es
//! visible para cualquier lector.

use crate::error::{JobError, Result};
use crate::jobs::types::{JobId, JobOutcome};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Store write-once de resultados por job
pub struct ResultStore {
    /// Directorio con un archivo por job
    dir: PathBuf,

    /// Jobs cuyo resultado no se pudo escribir (id -> motivo).
    /// Los mantiene como terminales para que no queden "running" para siempre.
    lost: Arc<Mutex<HashMap<JobId, String>>>,
}

impl ResultStore {
    /// Abre (o crea) el directorio de resultados.
    ///
    /// Los ids empiezan de nuevo en 1 con cada proceso, así que los registros
    /// de una ejecución anterior se eliminan.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let removed = Self::remove_stale(&dir)?;
        if removed > 0 {
            tracing::info!(dir = %dir.display(), removed, "Removed stale job results");
        }

        Ok(Self {
            dir,
            lost: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    fn remove_stale(dir: &Path) -> Result<usize> {
        let mut removed = 0;

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();

            let is_record = name.starts_with("job_id_")
                && (name.ends_with(".json") || name.ends_with(".json.tmp"));

            if is_record && entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    fn lost(&self) -> MutexGuard<'_, HashMap<JobId, String>> {
        self.lost.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ruta del registro de un job
    pub fn record_path(&self, id: JobId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Persiste el resultado de un job.
    ///
    /// Falla si el job ya tenía resultado. No reintenta: el error sube al worker.
    pub fn put(&self, id: JobId, outcome: &JobOutcome) -> Result<()> {
        let path = self.record_path(id);

        if path.exists() || self.lost().contains_key(&id) {
            return Err(JobError::ResultAlreadyExists(id));
        }

        let bytes = serde_json::to_vec(outcome)?;
        let temp_path = self.dir.join(format!("{}.json.tmp", id));

        let write = || -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            fs::rename(&temp_path, &path)
        };

        write().map_err(|source| {
            let _ = fs::remove_file(&temp_path);
            JobError::ResultPersistence { id, source }
        })
    }

    /// Marca un job como terminado sin datos porque su resultado se perdió
    pub fn record_persistence_failure(&self, id: JobId, reason: String) {
        self.lost().insert(id, reason);
    }

    /// Verifica si el job tiene un registro (bien formado o no)
    pub fn exists(&self, id: JobId) -> bool {
        self.lost().contains_key(&id) || self.record_path(id).is_file()
    }

    /// Lee el resultado de un job
    ///
    /// - `ResultNotFound` si todavía no se escribió
    /// - `MalformedResult` si el archivo está corrupto o incompleto
    pub fn get(&self, id: JobId) -> Result<JobOutcome> {
        if let Some(reason) = self.lost().get(&id) {
            return Ok(JobOutcome::Failure {
                error: format!("Result could not be persisted: {}", reason),
            });
        }

        let bytes = match fs::read(self.record_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(JobError::ResultNotFound(id));
            }
            Err(e) => return Err(JobError::Io(e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| JobError::MalformedResult {
            id,
            reason: e.to_string(),
        })
    }
}

impl Clone for ResultStore {
    fn clone(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            lost: Arc::clone(&self.lost),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn id(n: u64) -> JobId {
        JobId::new(n).unwrap()
    }

    fn success(value: serde_json::Value) -> JobOutcome {
        JobOutcome::Success { data: value }
    }

    // ==================== Basic Operations ====================

    #[test]
    fn test_storage_put_and_get() {
        let temp = tempfile::tempdir().unwrap();
        let store = ResultStore::open(temp.path()).unwrap();

        let outcome = success(serde_json::json!({"Ohio": 31.2}));
        store.put(id(1), &outcome).unwrap();

        assert!(store.exists(id(1)));
        assert_eq!(store.get(id(1)).unwrap(), outcome);
        assert!(store.record_path(id(1)).ends_with("job_id_1.json"));
    }

    #[test]
    fn test_storage_get_nonexistent() {
        let temp = tempfile::tempdir().unwrap();
        let store = ResultStore::open(temp.path()).unwrap();

        assert!(!store.exists(id(4)));
        assert!(matches!(store.get(id(4)), Err(JobError::ResultNotFound(_))));
    }

    #[test]
    fn test_storage_write_once() {
        let temp = tempfile::tempdir().unwrap();
        let store = ResultStore::open(temp.path()).unwrap();

        store.put(id(2), &success(serde_json::json!(1))).unwrap();
        let second = store.put(id(2), &success(serde_json::json!(2)));

        assert!(matches!(second, Err(JobError::ResultAlreadyExists(_))));
        assert_eq!(store.get(id(2)).unwrap(), success(serde_json::json!(1)));
    }

    #[test]
    fn test_storage_no_temp_file_left() {
        let temp = tempfile::tempdir().unwrap();
        let store = ResultStore::open(temp.path()).unwrap();
        store.put(id(1), &success(serde_json::json!(null))).unwrap();

        let names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["job_id_1.json".to_string()]);
    }

    #[test]
    fn test_storage_failure_outcome() {
        let temp = tempfile::tempdir().unwrap();
        let store = ResultStore::open(temp.path()).unwrap();

        let failed = JobOutcome::Failure { error: "column missing".to_string() };
        store.put(id(3), &failed).unwrap();

        assert_eq!(store.get(id(3)).unwrap(), failed);
    }

    // ==================== Corrupted Data ====================

    #[test]
    fn test_storage_corrupted_file() {
        let temp = tempfile::tempdir().unwrap();
        let store = ResultStore::open(temp.path()).unwrap();

        fs::write(store.record_path(id(5)), b"{\"outcome\": \"succ").unwrap();

        assert!(store.exists(id(5)));
        assert!(matches!(store.get(id(5)), Err(JobError::MalformedResult { .. })));
    }

    #[test]
    fn test_storage_empty_file_is_malformed() {
        let temp = tempfile::tempdir().unwrap();
        let store = ResultStore::open(temp.path()).unwrap();

        fs::write(store.record_path(id(6)), b"").unwrap();

        assert!(matches!(store.get(id(6)), Err(JobError::MalformedResult { .. })));
    }

    // ==================== Persistence Failures ====================

    #[test]
    fn test_storage_put_fails_when_dir_disappears() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("results");
        let store = ResultStore::open(&dir).unwrap();

        fs::remove_dir_all(&dir).unwrap();

        let result = store.put(id(1), &success(serde_json::json!(1)));
        assert!(matches!(result, Err(JobError::ResultPersistence { .. })));
        assert!(!store.exists(id(1)));
    }

    #[test]
    fn test_storage_lost_result_is_terminal_failure() {
        let temp = tempfile::tempdir().unwrap();
        let store = ResultStore::open(temp.path()).unwrap();

        store.record_persistence_failure(id(7), "disk full".to_string());

        assert!(store.exists(id(7)));
        let outcome = store.get(id(7)).unwrap();
        assert!(outcome.error().unwrap().contains("disk full"));
        assert!(matches!(
            store.put(id(7), &success(serde_json::json!(1))),
            Err(JobError::ResultAlreadyExists(_))
        ));
    }

    // ==================== Lifecycle ====================

    #[test]
    fn test_storage_open_removes_stale_records() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("job_id_1.json"), b"{}").unwrap();
        fs::write(temp.path().join("job_id_2.json.tmp"), b"{").unwrap();
        fs::write(temp.path().join("notes.txt"), b"keep me").unwrap();

        let store = ResultStore::open(temp.path()).unwrap();

        assert!(!store.exists(id(1)));
        assert!(!temp.path().join("job_id_2.json.tmp").exists());
        assert!(temp.path().join("notes.txt").exists());
    }

    #[test]
    fn test_storage_open_creates_dir() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("nested").join("results");

        let store = ResultStore::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir.as_path());
    }

    #[test]
    fn test_storage_clone_shares_state() {
        let temp = tempfile::tempdir().unwrap();
        let store = ResultStore::open(temp.path()).unwrap();
        let clone = store.clone();

        clone.record_persistence_failure(id(9), "io".to_string());
        assert!(store.exists(id(9)));
    }

    #[test]
    fn test_storage_concurrent_writes_different_ids() {
        let temp = tempfile::tempdir().unwrap();
        let store = ResultStore::open(temp.path()).unwrap();

        let handles: Vec<_> = (1..=16u64)
            .map(|n| {
                let store = store.clone();
                thread::spawn(move || {
                    store.put(id(n), &success(serde_json::json!({ "n": n }))).unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for n in 1..=16u64 {
            assert_eq!(store.get(id(n)).unwrap().data().unwrap()["n"], n);
        }
    }
}
