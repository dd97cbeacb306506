use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::AppResult;
use crate::measurements::{FetchMeasurements, MeasurementRecord};

/// Wraps one measurement retrieval for one item identity, tracking an
/// in-flight count and a has-completed-once ratchet.
///
/// The ratchet never resets within an instance's lifetime; a fresh load
/// requires constructing a new coordinator, which the list state does per
/// item identity. Overlapping triggers are not deduplicated: a second
/// trigger before the first settles starts an overlapping call, and
/// `is_loading` stays true until all outstanding calls settle.
pub struct FetchCoordinator {
    source: Arc<dyn FetchMeasurements>,
    item_id: String,
    in_flight: AtomicUsize,
    loaded: AtomicBool,
}

impl FetchCoordinator {
    pub fn new(source: Arc<dyn FetchMeasurements>, item_id: impl Into<String>) -> Self {
        Self {
            source,
            item_id: item_id.into(),
            in_flight: AtomicUsize::new(0),
            loaded: AtomicBool::new(false),
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    /// Runs the wrapped retrieval. On failure the in-flight count is still
    /// released, the loaded ratchet stays unset, and the error propagates.
    pub async fn trigger(&self) -> AppResult<Vec<MeasurementRecord>> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let result = self.source.fetch_measurements(&self.item_id).await;
        if result.is_ok() {
            self.loaded.store(true, Ordering::SeqCst);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }
}
