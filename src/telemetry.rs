//! Telemetry extraction service.
//!
//! Thin async layer over `dashvault_media::extract_telemetry`: resolves the
//! clip through storage, reads it, parses off the request path, and caches
//! the result. The cache stores `None` results too, so a clip known to carry
//! no telemetry is not re-parsed on every request.

use dashvault_common::{ClipLocation, Result};
use dashvault_media::{extract_telemetry, TelemetryData};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::storage::ClipStorage;

pub struct TelemetryService {
    storage: Arc<dyn ClipStorage>,
    cache: Mutex<ExtractionCache>,
}

impl TelemetryService {
    pub fn new(storage: Arc<dyn ClipStorage>, cache_entries: usize) -> Self {
        Self {
            storage,
            cache: Mutex::new(ExtractionCache::new(cache_entries)),
        }
    }

    /// Telemetry for one clip. `Ok(None)` means the clip was read and holds
    /// no telemetry; a missing clip is an error.
    pub async fn telemetry_for_clip(
        &self,
        clip: &ClipLocation,
    ) -> Result<Option<Arc<TelemetryData>>> {
        if let Some(cached) = self.cache.lock().get(clip) {
            tracing::debug!(clip = %clip, "Telemetry cache hit");
            return Ok(cached);
        }

        let path = self.storage.local_path(clip)?;
        let buf = tokio::fs::read(&path).await?;

        // Parsing walks the whole mdat; keep it off the async workers.
        let data = tokio::task::spawn_blocking(move || extract_telemetry(&buf))
            .await
            .map_err(|e| {
                dashvault_common::Error::internal(format!("telemetry task failed: {e}"))
            })?
            .map(Arc::new);

        tracing::debug!(
            clip = %clip,
            frames = data.as_ref().map_or(0, |d| d.frames.len()),
            "Extracted telemetry"
        );

        self.cache.lock().insert(clip.clone(), data.clone());
        Ok(data)
    }
}

/// Bounded map evicting the oldest-inserted entry.
struct ExtractionCache {
    capacity: usize,
    order: VecDeque<ClipLocation>,
    entries: HashMap<ClipLocation, Option<Arc<TelemetryData>>>,
}

impl ExtractionCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    fn get(&self, clip: &ClipLocation) -> Option<Option<Arc<TelemetryData>>> {
        self.entries.get(clip).cloned()
    }

    fn insert(&mut self, clip: ClipLocation, data: Option<Arc<TelemetryData>>) {
        if self.entries.insert(clip.clone(), data).is_none() {
            self.order.push_back(clip);
            while self.order.len() > self.capacity {
                if let Some(evicted) = self.order.pop_front() {
                    self.entries.remove(&evicted);
                }
            }
        }
    }
}
