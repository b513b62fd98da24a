use std::{
    collections::HashMap,
    fs, io,
    path::PathBuf,
    sync::Mutex,
};

pub const DRAFT_KEY: &str = "food-journal-log";
pub const HISTORY_KEY: &str = "food-journal-history";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Draft,
    History,
}

impl Slot {
    pub fn key(self) -> &'static str {
        match self {
            Slot::Draft => DRAFT_KEY,
            Slot::History => HISTORY_KEY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {key}: {source}")]
    Read { key: &'static str, source: io::Error },
    #[error("failed to write {key}: {source}")]
    Write { key: &'static str, source: io::Error },
    #[error("failed to encode {key}: {source}")]
    Encode {
        key: &'static str,
        source: serde_json::Error,
    },
}

/// String-valued key-value storage holding the journal's two slots.
pub trait SlotStore {
    fn load(&self, slot: Slot) -> Result<Option<String>, StoreError>;
    fn save(&self, slot: Slot, value: &str) -> Result<(), StoreError>;
}

/// One file per slot, `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn slot_path(&self, slot: Slot) -> PathBuf {
        self.dir.join(format!("{}.json", slot.key()))
    }
}

impl SlotStore for FileStore {
    fn load(&self, slot: Slot) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.slot_path(slot)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                key: slot.key(),
                source,
            }),
        }
    }

    fn save(&self, slot: Slot, value: &str) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            key: slot.key(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(write_err)?;
        fs::write(self.slot_path(slot), value).map_err(write_err)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<&'static str, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with(self, slot: Slot, value: impl Into<String>) -> Self {
        self.save(slot, &value.into()).expect("memory store writes cannot fail");
        self
    }
}

impl SlotStore for MemoryStore {
    fn load(&self, slot: Slot) -> Result<Option<String>, StoreError> {
        let slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(slots.get(slot.key()).cloned())
    }

    fn save(&self, slot: Slot, value: &str) -> Result<(), StoreError> {
        let mut slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.insert(slot.key(), value.to_string());
        Ok(())
    }
}

impl<S: SlotStore + ?Sized> SlotStore for &S {
    fn load(&self, slot: Slot) -> Result<Option<String>, StoreError> {
        (**self).load(slot)
    }

    fn save(&self, slot: Slot, value: &str) -> Result<(), StoreError> {
        (**self).save(slot, value)
    }
}
