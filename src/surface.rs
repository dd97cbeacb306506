use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;
use crate::graphic::{Extent, Graphic};

/// Names the two graphic containers of the map view: the interactive canvas
/// and the longer-lived overlay layer for persisted annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceKind {
    Primary,
    Overlay,
}

impl SurfaceKind {
    pub fn as_tag(&self) -> &'static str {
        match self {
            SurfaceKind::Primary => "primary",
            SurfaceKind::Overlay => "overlay",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CameraTarget {
    Extent(Extent),
    Center { position: [f64; 2], zoom: u32 },
}

/// The rendering widget as seen by the overlay core: a graphic container
/// plus an animated camera. Implemented by the real map widget adapter in
/// the application shell and by [`MemorySurface`] in tests.
#[async_trait]
pub trait RenderingSurface: Send + Sync {
    fn add_graphic(&self, graphic: Graphic);

    fn add_graphics(&self, graphics: Vec<Graphic>);

    /// First graphic matching the predicate, in insertion order.
    fn find_graphic(&self, predicate: &dyn Fn(&Graphic) -> bool) -> Option<Graphic>;

    fn filter_graphics(&self, predicate: &dyn Fn(&Graphic) -> bool) -> Vec<Graphic>;

    /// Removes the first graphic equal to the given one, returning whether
    /// anything was removed.
    fn remove_graphic(&self, graphic: &Graphic) -> bool;

    /// Removes every matching graphic in one mutation, returning the count.
    fn remove_graphics(&self, predicate: &dyn Fn(&Graphic) -> bool) -> usize;

    fn remove_all_graphics(&self);

    fn restyle_graphics(
        &self,
        predicate: &dyn Fn(&Graphic) -> bool,
        apply: &mut dyn FnMut(&mut Graphic),
    );

    fn graphic_count(&self) -> usize;

    /// Animates the camera to the target. Completion is awaited by callers
    /// that care; failure is not user-actionable.
    async fn go_to(&self, target: CameraTarget) -> AppResult<()>;
}

/// In-memory surface holding graphics behind a mutex and recording camera
/// movements instead of animating them.
#[derive(Default)]
pub struct MemorySurface {
    graphics: Mutex<Vec<Graphic>>,
    camera_log: Mutex<Vec<CameraTarget>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every camera target passed to `go_to`, oldest first.
    pub fn camera_log(&self) -> Vec<CameraTarget> {
        self.camera_log.lock().clone()
    }
}

#[async_trait]
impl RenderingSurface for MemorySurface {
    fn add_graphic(&self, graphic: Graphic) {
        self.graphics.lock().push(graphic);
    }

    fn add_graphics(&self, graphics: Vec<Graphic>) {
        self.graphics.lock().extend(graphics);
    }

    fn find_graphic(&self, predicate: &dyn Fn(&Graphic) -> bool) -> Option<Graphic> {
        self.graphics.lock().iter().find(|g| predicate(g)).cloned()
    }

    fn filter_graphics(&self, predicate: &dyn Fn(&Graphic) -> bool) -> Vec<Graphic> {
        self.graphics
            .lock()
            .iter()
            .filter(|g| predicate(g))
            .cloned()
            .collect()
    }

    fn remove_graphic(&self, graphic: &Graphic) -> bool {
        let mut graphics = self.graphics.lock();
        match graphics.iter().position(|g| g == graphic) {
            Some(index) => {
                graphics.remove(index);
                true
            }
            None => false,
        }
    }

    fn remove_graphics(&self, predicate: &dyn Fn(&Graphic) -> bool) -> usize {
        let mut graphics = self.graphics.lock();
        let before = graphics.len();
        graphics.retain(|g| !predicate(g));
        before - graphics.len()
    }

    fn remove_all_graphics(&self) {
        self.graphics.lock().clear();
    }

    fn restyle_graphics(
        &self,
        predicate: &dyn Fn(&Graphic) -> bool,
        apply: &mut dyn FnMut(&mut Graphic),
    ) {
        for graphic in self.graphics.lock().iter_mut() {
            if predicate(graphic) {
                apply(graphic);
            }
        }
    }

    fn graphic_count(&self) -> usize {
        self.graphics.lock().len()
    }

    async fn go_to(&self, target: CameraTarget) -> AppResult<()> {
        self.camera_log.lock().push(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphic::{Geometry, GraphicKind, Symbol, SymbolKind};

    fn point_graphic(item_id: &str) -> Graphic {
        Graphic::new(
            Geometry::Point {
                longitude: 1.0,
                latitude: 2.0,
            },
            Symbol::new(SymbolKind::SimpleMarker, "#000000", 8.0),
        )
        .with_kind(GraphicKind::ItemMarker)
        .with_item(item_id)
    }

    #[test]
    fn removes_matching_graphics_in_one_mutation() {
        let surface = MemorySurface::new();
        surface.add_graphics(vec![
            point_graphic("a"),
            point_graphic("b"),
            point_graphic("a"),
        ]);

        let removed = surface.remove_graphics(&|g| g.is_item("a"));
        assert_eq!(removed, 2);
        assert_eq!(surface.graphic_count(), 1);
        assert!(surface.find_graphic(&|g| g.is_item("b")).is_some());
    }

    #[test]
    fn remove_graphic_takes_only_the_first_equal_one() {
        let surface = MemorySurface::new();
        surface.add_graphics(vec![point_graphic("a"), point_graphic("a")]);

        let resolved = surface.find_graphic(&|g| g.is_item("a")).unwrap();
        assert!(surface.remove_graphic(&resolved));
        assert_eq!(surface.graphic_count(), 1);

        let absent = point_graphic("zzz");
        assert!(!surface.remove_graphic(&absent));
        assert_eq!(surface.graphic_count(), 1);
    }

    #[tokio::test]
    async fn records_camera_movements() {
        let surface = MemorySurface::new();
        surface
            .go_to(CameraTarget::Center {
                position: [30.5, 50.4],
                zoom: 12,
            })
            .await
            .unwrap();

        assert_eq!(surface.camera_log().len(), 1);
    }
}
