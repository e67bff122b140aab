//! Zoom / pan state and the controller that mutates it.

use crate::config::ExplorerConfig;
use crate::model::DataBounds;
use crate::transform::CoordinateTransform;
use kurbo::{Point, Size, Vec2};

/// The current zoom/pan applied to the coordinate transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    /// Pan offset in screen pixels.
    pub pan: Vec2,
    /// Data-space extent of the loaded dataset (base scale source).
    pub data_bounds: Option<DataBounds>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            data_bounds: None,
        }
    }
}

/// Owns the [`Viewport`]. Zoom is clamped; pan is not (an empty region is
/// always recoverable via [`ViewportController::reset_view`]).
///
/// Every mutating method returns `true` if the viewport changed.
#[derive(Debug, Clone)]
pub struct ViewportController {
    viewport: Viewport,
    zoom_min: f64,
    zoom_max: f64,
    zoom_step: f64,
    padding_fraction: f64,
    /// Last pointer position of an active pan gesture.
    drag_anchor: Option<Point>,
}

impl ViewportController {
    pub fn new(config: &ExplorerConfig) -> Self {
        Self {
            viewport: Viewport::default(),
            zoom_min: config.zoom_min,
            zoom_max: config.zoom_max,
            zoom_step: config.zoom_step,
            padding_fraction: config.padding_fraction,
            drag_anchor: None,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn zoom(&self) -> f64 {
        self.viewport.zoom
    }

    pub fn zoom_limits(&self) -> (f64, f64) {
        (self.zoom_min, self.zoom_max)
    }

    /// Build the transform for the current state. Never cache the result
    /// across a mutation.
    pub fn transform(&self, canvas: Size) -> CoordinateTransform {
        CoordinateTransform::new(
            self.viewport.data_bounds,
            canvas,
            self.padding_fraction,
            self.viewport.zoom,
            self.viewport.pan,
        )
    }

    pub fn set_data_bounds(&mut self, bounds: Option<DataBounds>) -> bool {
        if self.viewport.data_bounds == bounds {
            return false;
        }
        self.viewport.data_bounds = bounds;
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.viewport.zoom * self.zoom_step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.viewport.zoom / self.zoom_step)
    }

    /// Set zoom, clamped into `[zoom_min, zoom_max]`.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let clamped = zoom.clamp(self.zoom_min, self.zoom_max);
        if (self.viewport.zoom - clamped).abs() < f64::EPSILON {
            return false;
        }
        log::debug!("zoom {:.3} -> {:.3}", self.viewport.zoom, clamped);
        self.viewport.zoom = clamped;
        true
    }

    /// Zoom 1.0, pan (0, 0). Also ends any pan gesture.
    pub fn reset_view(&mut self) -> bool {
        self.drag_anchor = None;
        let changed = self.viewport.zoom != 1.0 || self.viewport.pan != Vec2::ZERO;
        self.viewport.zoom = 1.0;
        self.viewport.pan = Vec2::ZERO;
        changed
    }

    /// Add a screen-space delta to the pan offset. Unclamped.
    pub fn pan_by(&mut self, delta: Vec2) -> bool {
        if delta == Vec2::ZERO {
            return false;
        }
        self.viewport.pan += delta;
        true
    }

    // ─── Pan gesture ─────────────────────────────────────────────────────

    pub fn begin_pan(&mut self, anchor: Point) {
        self.drag_anchor = Some(anchor);
    }

    /// Move an active pan gesture to `pointer`: pan by the delta from the
    /// anchor, then re-anchor so successive moves accumulate without drift.
    pub fn pan_to(&mut self, pointer: Point) -> bool {
        let Some(anchor) = self.drag_anchor else {
            return false;
        };
        self.drag_anchor = Some(pointer);
        self.pan_by(pointer - anchor)
    }

    pub fn end_pan(&mut self) {
        self.drag_anchor = None;
    }

    pub fn is_panning(&self) -> bool {
        self.drag_anchor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> ViewportController {
        ViewportController::new(&ExplorerConfig::default())
    }

    #[test]
    fn zoom_in_then_out_restores_zoom() {
        let mut vc = controller();
        vc.zoom_in();
        vc.zoom_out();
        assert!((vc.zoom() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn repeated_zoom_stays_in_bounds() {
        let mut vc = controller();
        for _ in 0..100 {
            vc.zoom_in();
        }
        assert_eq!(vc.zoom(), 5.0);
        assert!(!vc.zoom_in(), "clamped zoom reports no change");
        for _ in 0..100 {
            vc.zoom_out();
        }
        assert_eq!(vc.zoom(), 0.2);
    }

    #[test]
    fn pan_gesture_accumulates_without_drift() {
        let mut vc = controller();
        vc.begin_pan(Point::new(100.0, 100.0));
        vc.pan_to(Point::new(110.0, 95.0));
        vc.pan_to(Point::new(130.0, 90.0));
        vc.pan_to(Point::new(125.0, 100.0));
        vc.end_pan();
        assert_eq!(vc.viewport().pan, Vec2::new(25.0, 0.0));
        assert!(!vc.pan_to(Point::new(0.0, 0.0)), "no gesture, no pan");
    }

    #[test]
    fn reset_restores_identity_view() {
        let mut vc = controller();
        vc.zoom_in();
        vc.pan_by(Vec2::new(-40.0, 12.0));
        assert!(vc.reset_view());
        assert_eq!(vc.zoom(), 1.0);
        assert_eq!(vc.viewport().pan, Vec2::ZERO);
        assert!(!vc.reset_view());
    }
}
