use crate::clock::SystemClock;
use crate::controller::JournalController;
use crate::errors::AppError;
use crate::storage::FileStore;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type Journal = JournalController<FileStore, SystemClock>;

#[derive(Clone)]
pub struct AppState {
    pub journal: Arc<Mutex<Journal>>,
}

impl AppState {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal: Arc::new(Mutex::new(journal)),
        }
    }

    /// Runs `f` against the journal on the blocking pool; reconciliation does
    /// synchronous file writes.
    pub async fn with_journal<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Journal) -> T + Send + 'static,
        T: Send + 'static,
    {
        let journal = Arc::clone(&self.journal);
        tokio::task::spawn_blocking(move || {
            let mut guard = journal.blocking_lock();
            f(&mut guard)
        })
        .await
        .map_err(AppError::internal)
    }
}
