use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::errors::AppResult;
use crate::graphic::{self, Geometry, Graphic, GraphicKind, SymbolKind};
use crate::lifecycle::LifecycleFlags;
use crate::style::{StyleVariant, SymbolStyleSet};
use crate::surface::{CameraTarget, RenderingSurface, SurfaceKind};

/// Sole owner of graphic state on the two rendering surfaces. All surface
/// mutation goes through this manager; UI flows request overlay state by
/// semantic classification (graphic kind, item id), never by individual
/// graphic handles.
///
/// Environmental failures (surface not yet attached, lookup misses) degrade
/// to logged no-ops; only malformed payloads surface as errors.
pub struct OverlayManager {
    primary: Mutex<Option<Arc<dyn RenderingSurface>>>,
    overlay: Mutex<Option<Arc<dyn RenderingSurface>>>,
    lifecycle: LifecycleFlags,
    styles: SymbolStyleSet,
}

impl OverlayManager {
    pub fn new(styles: SymbolStyleSet) -> Self {
        Self {
            primary: Mutex::new(None),
            overlay: Mutex::new(None),
            lifecycle: LifecycleFlags::new(),
            styles,
        }
    }

    pub fn lifecycle(&self) -> &LifecycleFlags {
        &self.lifecycle
    }

    pub fn attach_primary(&self, surface: Arc<dyn RenderingSurface>) {
        *self.primary.lock() = Some(surface);
        self.lifecycle.set_surface_init(true);
    }

    pub fn attach_overlay(&self, surface: Arc<dyn RenderingSurface>) {
        *self.overlay.lock() = Some(surface);
        self.lifecycle.set_map_and_overlay_init(true);
    }

    pub fn mark_draw_tool_ready(&self) {
        self.lifecycle.set_draw_tool_init(true);
    }

    /// Teardown for the map view: drops both surface references and resets
    /// every lifecycle flag in one call.
    pub fn detach_surfaces(&self) {
        *self.primary.lock() = None;
        *self.overlay.lock() = None;
        self.lifecycle.reset_all();
    }

    fn surface(&self, kind: SurfaceKind) -> Option<Arc<dyn RenderingSurface>> {
        match kind {
            SurfaceKind::Primary => self.primary.lock().clone(),
            SurfaceKind::Overlay => self.overlay.lock().clone(),
        }
    }

    pub fn add_graphic(&self, surface: SurfaceKind, graphic: Graphic) {
        match self.surface(surface) {
            Some(target) => target.add_graphic(graphic),
            None => error!(
                target: "overlay",
                surface = surface.as_tag(),
                "surface not initialized; dropping graphic"
            ),
        }
    }

    pub fn add_graphics(&self, surface: SurfaceKind, graphics: Vec<Graphic>) {
        match self.surface(surface) {
            Some(target) => target.add_graphics(graphics),
            None => error!(
                target: "overlay",
                surface = surface.as_tag(),
                "surface not initialized; dropping graphic batch"
            ),
        }
    }

    /// All graphics on the surface carrying the given kind tag; empty when
    /// none match or the surface is not attached.
    pub fn graphics_by_kind(&self, kind: GraphicKind, surface: SurfaceKind) -> Vec<Graphic> {
        let Some(target) = self.surface(surface) else {
            debug!(
                target: "overlay",
                surface = surface.as_tag(),
                "lookup on unattached surface"
            );
            return Vec::new();
        };
        target.filter_graphics(&|g| g.is_kind(kind))
    }

    /// First graphic whose `item_id` attribute matches, preferring the
    /// primary surface over the overlay surface.
    pub fn graphic_by_item(&self, item_id: &str) -> Option<Graphic> {
        let found = self
            .surface(SurfaceKind::Primary)
            .and_then(|s| s.find_graphic(&|g| g.is_item(item_id)))
            .or_else(|| {
                self.surface(SurfaceKind::Overlay)
                    .and_then(|s| s.find_graphic(&|g| g.is_item(item_id)))
            });

        if found.is_none() {
            warn!(target: "overlay", item_id, "graphic not found");
        }
        found
    }

    /// Removes the whole matching batch in one surface mutation; no-op when
    /// nothing matches.
    pub fn remove_by_kind(&self, kind: GraphicKind, surface: SurfaceKind) {
        let Some(target) = self.surface(surface) else {
            debug!(
                target: "overlay",
                kind = kind.as_tag(),
                surface = surface.as_tag(),
                "removal skipped; surface not attached"
            );
            return;
        };
        let removed = target.remove_graphics(&|g| g.is_kind(kind));
        if removed > 0 {
            debug!(
                target: "overlay",
                kind = kind.as_tag(),
                surface = surface.as_tag(),
                removed,
                "removed graphics by kind"
            );
        }
    }

    /// Resolves the graphic by item id (both surfaces) and removes that one
    /// graphic from the primary surface; no-op when absent. Other graphics
    /// sharing the item id stay put.
    pub fn remove_by_item(&self, item_id: &str) {
        let Some(graphic) = self.graphic_by_item(item_id) else {
            return;
        };
        if let Some(target) = self.surface(SurfaceKind::Primary) {
            target.remove_graphic(&graphic);
        }
    }

    /// Applies the style primitive to all primary-surface graphics, or only
    /// those matching `kind`. Warns once per symbol kind that has no style
    /// entry.
    pub fn restyle_all(&self, variant: StyleVariant, kind: Option<GraphicKind>) {
        let Some(target) = self.surface(SurfaceKind::Primary) else {
            debug!(
                target: "overlay",
                variant = variant.as_tag(),
                "restyle skipped; primary surface not attached"
            );
            return;
        };

        let mut missing: HashSet<SymbolKind> = HashSet::new();
        let predicate = |g: &Graphic| kind.map(|k| g.is_kind(k)).unwrap_or(true);
        target.restyle_graphics(&predicate, &mut |graphic| {
            if let Some(unstyled) = self.apply_symbol_style(graphic, variant) {
                missing.insert(unstyled);
            }
        });

        for unstyled in missing {
            warn!(
                target: "overlay",
                kind = unstyled.as_tag(),
                "no style entry for symbol kind; graphics left unchanged"
            );
        }
    }

    /// The single style-mutation primitive: replaces the graphic's symbol
    /// with the named variant when the style set covers its symbol kind,
    /// otherwise warns and leaves the graphic untouched.
    pub fn set_symbol_style(&self, graphic: &mut Graphic, variant: StyleVariant) {
        if let Some(unstyled) = self.apply_symbol_style(graphic, variant) {
            warn!(
                target: "overlay",
                kind = unstyled.as_tag(),
                "no style entry for symbol kind; graphic left unchanged"
            );
        }
    }

    fn apply_symbol_style(
        &self,
        graphic: &mut Graphic,
        variant: StyleVariant,
    ) -> Option<SymbolKind> {
        match self.styles.symbol_for(graphic.symbol.kind, variant) {
            Some(symbol) => {
                graphic.symbol = symbol.clone();
                None
            }
            None => Some(graphic.symbol.kind),
        }
    }

    pub fn clear_primary(&self) {
        match self.surface(SurfaceKind::Primary) {
            Some(target) => target.remove_all_graphics(),
            None => warn!(target: "overlay", "clear skipped; primary surface not attached"),
        }
    }

    /// Clearing the overlay layer requires the map+overlay readiness flag,
    /// guarding against mutating a layer that does not yet exist.
    pub fn clear_overlay(&self) {
        if !self.lifecycle.map_and_overlay_init() {
            error!(target: "overlay", "overlay layer has not been initialized yet");
            return;
        }
        match self.surface(SurfaceKind::Overlay) {
            Some(target) => target.remove_all_graphics(),
            None => error!(target: "overlay", "overlay layer has not been initialized yet"),
        }
    }

    /// Animates the primary camera to the geometry's bounding extent. An
    /// absent surface or a failed animation degrades to a logged no-op.
    pub async fn zoom_to(&self, geometry: &Geometry) {
        let Some(target) = self.surface(SurfaceKind::Primary) else {
            debug!(target: "overlay", "zoom skipped; primary surface not attached");
            return;
        };
        if let Err(err) = target.go_to(CameraTarget::Extent(geometry.extent())).await {
            debug!(target: "overlay", ?err, "camera zoom failed");
        }
    }

    /// Moves the camera to a position at a zoom level. Only takes effect once
    /// the primary surface is initialized; callers do not need to guard.
    pub async fn set_coordinates_and_zoom(&self, position: [f64; 2], zoom: u32) {
        if !self.lifecycle.surface_init() {
            return;
        }
        let Some(target) = self.surface(SurfaceKind::Primary) else {
            return;
        };
        if let Err(err) = target.go_to(CameraTarget::Center { position, zoom }).await {
            debug!(target: "overlay", ?err, "camera move failed");
        }
    }

    pub fn deserialize_graphic(&self, raw: &str) -> AppResult<Graphic> {
        graphic::deserialize_graphic(raw)
    }

    pub fn filter_non_empty<T>(
        &self,
        items: Vec<T>,
        map_field: impl Fn(&T) -> &str,
    ) -> AppResult<Vec<T>> {
        graphic::filter_non_empty(items, map_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphic::Symbol;
    use crate::surface::MemorySurface;

    fn highlight(item_id: &str) -> Graphic {
        Graphic::new(
            Geometry::Point {
                longitude: 30.5,
                latitude: 50.4,
            },
            Symbol::new(SymbolKind::SimpleMarker, "#1976d2", 10.0),
        )
        .with_kind(GraphicKind::MeasurementHighlight)
        .with_item(item_id)
    }

    fn attached_manager() -> (OverlayManager, Arc<MemorySurface>, Arc<MemorySurface>) {
        let manager = OverlayManager::new(SymbolStyleSet::builtin());
        let primary = Arc::new(MemorySurface::new());
        let overlay = Arc::new(MemorySurface::new());
        manager.attach_primary(primary.clone());
        manager.attach_overlay(overlay.clone());
        (manager, primary, overlay)
    }

    #[test]
    fn add_find_remove_by_kind_roundtrip() {
        let (manager, _, _) = attached_manager();
        manager.add_graphic(SurfaceKind::Primary, highlight("job-42"));

        let found = manager.graphics_by_kind(GraphicKind::MeasurementHighlight, SurfaceKind::Primary);
        assert_eq!(found.len(), 1);

        manager.remove_by_kind(GraphicKind::MeasurementHighlight, SurfaceKind::Primary);
        assert!(manager
            .graphics_by_kind(GraphicKind::MeasurementHighlight, SurfaceKind::Primary)
            .is_empty());
    }

    #[test]
    fn add_before_attach_is_a_logged_noop() {
        let manager = OverlayManager::new(SymbolStyleSet::builtin());
        manager.add_graphic(SurfaceKind::Primary, highlight("job-42"));
        assert!(manager
            .graphics_by_kind(GraphicKind::MeasurementHighlight, SurfaceKind::Primary)
            .is_empty());
    }

    #[test]
    fn item_lookup_prefers_primary_surface() {
        let (manager, _, overlay) = attached_manager();
        overlay.add_graphic(highlight("job-42").with_kind(GraphicKind::Annotation));
        manager.add_graphic(SurfaceKind::Primary, highlight("job-42"));

        let found = manager.graphic_by_item("job-42").unwrap();
        assert!(found.is_kind(GraphicKind::MeasurementHighlight));
    }

    #[test]
    fn item_lookup_falls_back_to_overlay_surface() {
        let (manager, _, overlay) = attached_manager();
        overlay.add_graphic(highlight("job-7"));

        assert!(manager.graphic_by_item("job-7").is_some());
        assert!(manager.graphic_by_item("job-8").is_none());
    }

    #[test]
    fn remove_by_item_only_mutates_primary() {
        let (manager, primary, overlay) = attached_manager();
        manager.add_graphic(SurfaceKind::Primary, highlight("job-42"));
        overlay.add_graphic(highlight("job-42"));

        manager.remove_by_item("job-42");
        assert_eq!(primary.graphic_count(), 0);
        assert_eq!(overlay.graphic_count(), 1);

        // absent item: plain no-op
        manager.remove_by_item("job-404");
        assert_eq!(overlay.graphic_count(), 1);
    }

    #[test]
    fn remove_by_item_removes_only_the_resolved_graphic() {
        let (manager, primary, _) = attached_manager();
        manager.add_graphic(
            SurfaceKind::Primary,
            highlight("job-42").with_kind(GraphicKind::ItemMarker),
        );
        manager.add_graphic(SurfaceKind::Primary, highlight("job-42"));

        manager.remove_by_item("job-42");
        assert_eq!(primary.graphic_count(), 1);
        // the first match (the item marker) was resolved and removed
        let remaining = primary.find_graphic(&|g| g.is_item("job-42")).unwrap();
        assert!(remaining.is_kind(GraphicKind::MeasurementHighlight));
    }

    #[test]
    fn removal_and_restyle_before_attach_are_noops() {
        let manager = OverlayManager::new(SymbolStyleSet::builtin());
        manager.remove_by_kind(GraphicKind::MeasurementHighlight, SurfaceKind::Primary);
        manager.restyle_all(StyleVariant::Selected, None);

        let primary = Arc::new(MemorySurface::new());
        manager.attach_primary(primary.clone());
        assert_eq!(primary.graphic_count(), 0);
        assert!(primary.camera_log().is_empty());
    }

    #[test]
    fn restyle_updates_covered_kinds_and_skips_missing_ones() {
        let mut styles = SymbolStyleSet::empty();
        styles.insert(
            SymbolKind::SimpleMarker,
            StyleVariant::Selected,
            Symbol::new(SymbolKind::SimpleMarker, "#ff6600", 14.0),
        );
        let manager = OverlayManager::new(styles);
        let primary = Arc::new(MemorySurface::new());
        manager.attach_primary(primary.clone());

        let line = Graphic::new(
            Geometry::Polyline {
                path: vec![[0.0, 0.0], [1.0, 1.0]],
            },
            Symbol::new(SymbolKind::SimpleLine, "#1976d2", 2.0),
        )
        .with_kind(GraphicKind::Sketch);
        manager.add_graphic(SurfaceKind::Primary, highlight("job-42"));
        manager.add_graphic(SurfaceKind::Primary, line.clone());

        manager.restyle_all(StyleVariant::Selected, None);

        let restyled = primary.find_graphic(&|g| g.is_item("job-42")).unwrap();
        assert_eq!(restyled.symbol.color, "#ff6600");
        let untouched = primary.find_graphic(&|g| g.is_kind(GraphicKind::Sketch)).unwrap();
        assert_eq!(untouched.symbol, line.symbol);
    }

    #[test]
    fn restyle_scoped_to_kind_leaves_others_alone() {
        let (manager, primary, _) = attached_manager();
        manager.add_graphic(SurfaceKind::Primary, highlight("job-1"));
        manager.add_graphic(
            SurfaceKind::Primary,
            highlight("job-2").with_kind(GraphicKind::ItemMarker),
        );

        manager.restyle_all(StyleVariant::Selected, Some(GraphicKind::ItemMarker));

        let marker = primary
            .find_graphic(&|g| g.is_kind(GraphicKind::ItemMarker))
            .unwrap();
        assert_eq!(marker.symbol.color, "#ff6600");
        let unscoped = primary
            .find_graphic(&|g| g.is_kind(GraphicKind::MeasurementHighlight))
            .unwrap();
        assert_eq!(unscoped.symbol.color, "#1976d2");
    }

    #[test]
    fn clear_overlay_requires_readiness_flag() {
        let manager = OverlayManager::new(SymbolStyleSet::builtin());
        let overlay = Arc::new(MemorySurface::new());
        overlay.add_graphic(highlight("persisted"));
        // attached without the readiness flag raised
        *manager.overlay.lock() = Some(overlay.clone());

        manager.clear_overlay();
        assert_eq!(overlay.graphic_count(), 1);

        manager.lifecycle.set_map_and_overlay_init(true);
        manager.clear_overlay();
        assert_eq!(overlay.graphic_count(), 0);
    }

    #[tokio::test]
    async fn set_coordinates_is_silent_before_surface_init() {
        let manager = OverlayManager::new(SymbolStyleSet::builtin());
        manager.set_coordinates_and_zoom([30.5, 50.4], 12).await;

        let primary = Arc::new(MemorySurface::new());
        manager.attach_primary(primary.clone());
        manager.set_coordinates_and_zoom([30.5, 50.4], 12).await;

        assert_eq!(
            primary.camera_log(),
            vec![CameraTarget::Center {
                position: [30.5, 50.4],
                zoom: 12
            }]
        );
    }

    #[tokio::test]
    async fn zoom_targets_geometry_extent() {
        let (manager, primary, _) = attached_manager();
        let geometry = Geometry::Polyline {
            path: vec![[0.0, 0.0], [4.0, 2.0]],
        };
        manager.zoom_to(&geometry).await;

        assert_eq!(
            primary.camera_log(),
            vec![CameraTarget::Extent(geometry.extent())]
        );
    }

    #[test]
    fn detach_resets_flags_and_drops_surfaces() {
        let (manager, _, _) = attached_manager();
        manager.mark_draw_tool_ready();
        manager.detach_surfaces();

        assert!(!manager.lifecycle().surface_init());
        assert!(!manager.lifecycle().map_and_overlay_init());
        assert!(!manager.lifecycle().draw_tool_init());
        assert!(manager.graphic_by_item("job-42").is_none());
    }
}
