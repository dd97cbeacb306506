use std::sync::atomic::{AtomicBool, Ordering};

/// Readiness flags for the mounted map view. The three flags are
/// independent: no flag implies another, and each subsystem checks only its
/// own flag before acting.
#[derive(Debug, Default)]
pub struct LifecycleFlags {
    surface_init: AtomicBool,
    map_and_overlay_init: AtomicBool,
    draw_tool_init: AtomicBool,
}

impl LifecycleFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surface_init(&self) -> bool {
        self.surface_init.load(Ordering::SeqCst)
    }

    pub fn set_surface_init(&self, value: bool) {
        self.surface_init.store(value, Ordering::SeqCst);
    }

    pub fn map_and_overlay_init(&self) -> bool {
        self.map_and_overlay_init.load(Ordering::SeqCst)
    }

    pub fn set_map_and_overlay_init(&self, value: bool) {
        self.map_and_overlay_init.store(value, Ordering::SeqCst);
    }

    pub fn draw_tool_init(&self) -> bool {
        self.draw_tool_init.load(Ordering::SeqCst)
    }

    pub fn set_draw_tool_init(&self, value: bool) {
        self.draw_tool_init.store(value, Ordering::SeqCst);
    }

    /// Clears all three flags in one call, so no stale "initialized" flag
    /// survives a surface teardown.
    pub fn reset_all(&self) {
        self.set_surface_init(false);
        self.set_map_and_overlay_init(false);
        self.set_draw_tool_init(false);
    }
}
