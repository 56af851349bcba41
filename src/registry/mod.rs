//! Loaded-reader registry.
//!
//! Loading a [`RetroReader`] means reading two checkpoints, so each model
//! identifier is loaded at most once and then shared. The registry is an
//! ordinary value owned by the caller (typically wrapped in an `Arc`), not
//! process-global state.
//!
//! Each identifier gets its own slot mutex. That mutex is the single
//! acquisition point for construction: concurrent callers for the same id
//! wait on it, callers for different ids do not block each other.


use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::ReaderConfig;
use crate::pipeline::{LoadError, RetroReader};

type Slot = Arc<Mutex<Option<Arc<RetroReader>>>>;

/// Construction-once, read-many cache of loaded readers keyed by model id.
#[derive(Default)]
pub struct ReaderRegistry {
    slots: RwLock<HashMap<String, Slot>>,
}

impl std::fmt::Debug for ReaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderRegistry")
            .field("model_ids", &self.model_ids())
            .finish()
    }
}

impl ReaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the reader for `model_id`, running `load` if it is not loaded yet.
    ///
    /// `load` runs at most once per successful identifier. If it fails the
    /// slot stays empty and the error is returned; a later call retries.
    pub fn get_or_load<F, E>(&self, model_id: &str, load: F) -> Result<Arc<RetroReader>, E>
    where
        F: FnOnce() -> Result<RetroReader, E>,
        E: std::fmt::Display,
    {
        let slot = self.slot(model_id);
        let mut guard = slot.lock();

        if let Some(reader) = guard.as_ref() {
            debug!(model_id, "Reader already loaded");
            return Ok(reader.clone());
        }

        info!(model_id, "Loading reader");
        match load() {
            Ok(reader) => {
                let reader = Arc::new(reader);
                *guard = Some(reader.clone());
                Ok(reader)
            }
            Err(e) => {
                warn!(model_id, error = %e, "Reader load failed");
                Err(e)
            }
        }
    }

    /// Loads `config` under its `model_name`.
    pub fn get_or_load_config(&self, config: ReaderConfig) -> Result<Arc<RetroReader>, LoadError> {
        let model_id = config.model_name.clone();
        self.get_or_load(&model_id, move || RetroReader::load(config))
    }

    /// Returns the reader for `model_id` if it has been loaded.
    ///
    /// Never waits on a load in progress; such a slot reads as not loaded.
    pub fn get(&self, model_id: &str) -> Option<Arc<RetroReader>> {
        let slot = self.slots.read().get(model_id).cloned()?;
        slot.try_lock()?.clone()
    }

    pub fn is_loaded(&self, model_id: &str) -> bool {
        self.get(model_id).is_some()
    }

    /// Number of loaded readers.
    pub fn len(&self) -> usize {
        self.loaded_slots().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifiers of loaded readers, sorted.
    pub fn model_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.loaded_slots().map(|(id, _)| id).collect();
        ids.sort_unstable();
        ids
    }

    fn slot(&self, model_id: &str) -> Slot {
        if let Some(slot) = self.slots.read().get(model_id) {
            return slot.clone();
        }
        self.slots
            .write()
            .entry(model_id.to_string())
            .or_default()
            .clone()
    }

    fn loaded_slots(&self) -> impl Iterator<Item = (String, Slot)> {
        let slots: Vec<(String, Slot)> = self
            .slots
            .read()
            .iter()
            .map(|(id, slot)| (id.clone(), slot.clone()))
            .collect();
        slots
            .into_iter()
            .filter(|(_, slot)| slot.try_lock().is_some_and(|guard| guard.is_some()))
    }
}
