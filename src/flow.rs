use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::errors::AppResult;
use crate::fetch::FetchCoordinator;
use crate::graphic::{Graphic, GraphicKind};
use crate::measurements::{records_of_type, FetchMeasurements, MeasurementRecord, MeasurementType};
use crate::overlay::OverlayManager;
use crate::surface::SurfaceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowMode {
    /// Section picker: no measurement type selected.
    Browsing,
    /// Record list for the selected type.
    Viewing(MeasurementType),
}

/// Drives the measurement side panel for one domain item: mode transitions,
/// the highlight graphic on the primary surface, and the camera restore on
/// back-navigation.
pub struct MeasurementFlowController {
    manager: Arc<OverlayManager>,
    item_id: String,
    mode: Mutex<FlowMode>,
    closed: AtomicBool,
}

impl MeasurementFlowController {
    pub fn new(manager: Arc<OverlayManager>, item_id: impl Into<String>) -> Self {
        Self {
            manager,
            item_id: item_id.into(),
            mode: Mutex::new(FlowMode::Browsing),
            closed: AtomicBool::new(false),
        }
    }

    pub fn mode(&self) -> FlowMode {
        *self.mode.lock()
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn select_type(&self, kind: MeasurementType) {
        *self.mode.lock() = FlowMode::Viewing(kind);
    }

    /// Places the measurement highlight on the primary surface, replacing
    /// any previous highlight so at most one exists at a time.
    pub fn show_highlight(&self, graphic: Graphic) {
        self.manager
            .remove_by_kind(GraphicKind::MeasurementHighlight, SurfaceKind::Primary);
        self.manager.add_graphic(
            SurfaceKind::Primary,
            graphic.with_kind(GraphicKind::MeasurementHighlight),
        );
    }

    /// Returns to the section picker. Highlight removal is synchronous and
    /// always runs before any camera move. The camera restore only happens
    /// on a genuine back-navigation out of a selected type, so invoking this
    /// again from `Browsing` is an idempotent cleanup.
    pub async fn go_back(&self) {
        let previous = {
            let mut mode = self.mode.lock();
            std::mem::replace(&mut *mode, FlowMode::Browsing)
        };

        self.manager
            .remove_by_kind(GraphicKind::MeasurementHighlight, SurfaceKind::Primary);

        if let FlowMode::Viewing(_) = previous {
            if let Some(graphic) = self.manager.graphic_by_item(&self.item_id) {
                self.manager.zoom_to(&graphic.geometry).await;
            }
        }
    }

    /// Teardown path: runs `go_back` exactly once more regardless of the
    /// current mode. A second `close` is a no-op.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.go_back().await;
    }
}

impl Drop for MeasurementFlowController {
    fn drop(&mut self) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        // no async camera restore is possible here; the highlight still must
        // not outlive the controller
        self.manager
            .remove_by_kind(GraphicKind::MeasurementHighlight, SurfaceKind::Primary);
        warn!(
            target: "flow",
            item_id = %self.item_id,
            "flow controller dropped without close; highlight removed without camera restore"
        );
    }
}

/// What the record list shows: exactly one of these at any time.
#[derive(Debug, Clone, PartialEq)]
pub enum ListDisplay {
    Loading,
    Records(Vec<MeasurementRecord>),
    Empty,
}

/// Backing state for the record list of one item. A new item identity means
/// a new instance (and with it a fresh [`FetchCoordinator`]); cached records
/// from a previous item never leak into a newly selected item's view.
pub struct MeasurementListState {
    coordinator: FetchCoordinator,
    records: Mutex<Option<Vec<MeasurementRecord>>>,
}

impl MeasurementListState {
    pub fn new(source: Arc<dyn FetchMeasurements>, item_id: impl Into<String>) -> Self {
        Self {
            coordinator: FetchCoordinator::new(source, item_id),
            records: Mutex::new(None),
        }
    }

    pub fn item_id(&self) -> &str {
        self.coordinator.item_id()
    }

    pub fn coordinator(&self) -> &FetchCoordinator {
        &self.coordinator
    }

    /// Triggers the fetch and caches the returned records.
    pub async fn load(&self) -> AppResult<()> {
        let records = self.coordinator.trigger().await?;
        *self.records.lock() = Some(records);
        Ok(())
    }

    /// Pure filter of the cached records; never triggers a fetch.
    pub fn records_of(&self, kind: MeasurementType) -> Vec<MeasurementRecord> {
        self.records
            .lock()
            .as_deref()
            .map(|records| records_of_type(records, kind))
            .unwrap_or_default()
    }

    pub fn display(&self, kind: MeasurementType) -> ListDisplay {
        if self.coordinator.is_loading() || !self.coordinator.is_loaded() {
            return ListDisplay::Loading;
        }
        let filtered = self.records_of(kind);
        if filtered.is_empty() {
            ListDisplay::Empty
        } else {
            ListDisplay::Records(filtered)
        }
    }

    /// Unmount/identity-change cleanup: drops the cached records.
    pub fn clear(&self) {
        *self.records.lock() = None;
    }
}
