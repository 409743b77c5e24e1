use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;

use crate::config::DataSources;
use crate::data::loader;
use crate::data::model::Datasets;
use crate::error::Result;

/// Load-once holder for the session's datasets.
///
/// The first [`DatasetCache::get`] parses the sources; later calls hand out
/// the same immutable snapshot until [`DatasetCache::invalidate`] is called.
/// Failed loads are not remembered, so the next call retries.
pub struct DatasetCache {
    sources: DataSources,
    slot: Mutex<Option<Arc<Datasets>>>,
}

impl DatasetCache {
    pub fn new(sources: DataSources) -> Self {
        Self {
            sources,
            slot: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Result<Arc<Datasets>> {
        let mut slot = self.slot.lock();
        if let Some(ds) = slot.as_ref() {
            debug!("Dataset cache hit");
            return Ok(Arc::clone(ds));
        }
        let ds = Arc::new(loader::load(&self.sources)?);
        *slot = Some(Arc::clone(&ds));
        Ok(ds)
    }

    /// Drop the snapshot; the next `get` reloads from the sources.
    /// Sessions still holding the old `Arc` keep their copy.
    pub fn invalidate(&self) {
        if self.slot.lock().take().is_some() {
            info!("Dataset cache invalidated");
        }
    }
}
