mod config;
mod errors;
mod fetch;
mod flow;
mod graphic;
mod lifecycle;
mod measurements;
mod overlay;
mod style;
mod surface;

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use config::AppConfig;
pub use errors::{AppError, AppResult};
pub use fetch::FetchCoordinator;
pub use flow::{FlowMode, ListDisplay, MeasurementFlowController, MeasurementListState};
pub use graphic::{
    deserialize_graphic, filter_non_empty, Attributes, Extent, Geometry, Graphic, GraphicKind,
    Symbol, SymbolKind,
};
pub use lifecycle::LifecycleFlags;
pub use measurements::{records_of_type, FetchMeasurements, MeasurementRecord, MeasurementType};
pub use overlay::OverlayManager;
pub use style::{StyleVariant, SymbolStyleSet};
pub use surface::{CameraTarget, MemorySurface, RenderingSurface, SurfaceKind};

/// One mounted map view: configuration plus the single [`OverlayManager`]
/// owning its surfaces.
pub struct MapSession {
    config: AppConfig,
    manager: Arc<OverlayManager>,
}

impl MapSession {
    pub fn initialize() -> AppResult<Self> {
        init_tracing();
        let config = AppConfig::from_env();
        let styles = match &config.symbol_style_file {
            Some(path) => SymbolStyleSet::load(path)?,
            None => SymbolStyleSet::builtin(),
        };
        Ok(Self {
            config,
            manager: Arc::new(OverlayManager::new(styles)),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn manager(&self) -> Arc<OverlayManager> {
        Arc::clone(&self.manager)
    }

    /// Called when the map view unmounts or is replaced: detaches both
    /// surfaces and resets every lifecycle flag.
    pub fn teardown(&self) {
        self.manager.detach_surfaces();
    }
}

fn init_tracing() {
    static INIT: OnceCell<()> = OnceCell::new();
    let _ = INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,map_overlay=debug"));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}
