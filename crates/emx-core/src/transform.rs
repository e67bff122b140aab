//! Data space ↔ screen space mapping.
//!
//! Two stages:
//!
//! 1. **Normalize**: data bounds are mapped linearly onto the canvas inset by
//!    `padding_fraction` on every side (the canonical region). Each axis has
//!    its own scale; a degenerate axis (range ≤ `AXIS_EPSILON`) uses 1.0.
//! 2. **View**: `screen = center + (base - center) * zoom + pan`, where
//!    `center` is the canvas center.
//!
//! `to_data` is the exact algebraic inverse of `to_screen`. A transform is a
//! plain value: rebuild it from the current viewport every frame.

use crate::model::DataBounds;
use kurbo::{Point, Size, Vec2};

/// Ranges at or below this are treated as a single coordinate.
pub const AXIS_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    data_min: Point,
    inner_origin: Point,
    scale: Vec2,
    center: Point,
    zoom: f64,
    pan: Vec2,
}

impl CoordinateTransform {
    pub fn new(
        bounds: Option<DataBounds>,
        canvas: Size,
        padding_fraction: f64,
        zoom: f64,
        pan: Vec2,
    ) -> Self {
        let pad_x = canvas.width * padding_fraction;
        let pad_y = canvas.height * padding_fraction;
        let inner_w = canvas.width - 2.0 * pad_x;
        let inner_h = canvas.height - 2.0 * pad_y;

        let (data_min, scale) = match bounds {
            Some(b) => (
                b.min,
                Vec2::new(axis_scale(inner_w, b.width()), axis_scale(inner_h, b.height())),
            ),
            None => (Point::ORIGIN, Vec2::new(1.0, 1.0)),
        };

        Self {
            data_min,
            inner_origin: Point::new(pad_x, pad_y),
            scale,
            center: Point::new(canvas.width / 2.0, canvas.height / 2.0),
            zoom: zoom.max(f64::MIN_POSITIVE),
            pan,
        }
    }

    /// Canonical (zoom- and pan-independent) position of a data point.
    pub fn base_point(&self, data: Point) -> Point {
        Point::new(
            self.inner_origin.x + (data.x - self.data_min.x) * self.scale.x,
            self.inner_origin.y + (data.y - self.data_min.y) * self.scale.y,
        )
    }

    pub fn to_screen(&self, data: Point) -> Point {
        let base = self.base_point(data);
        self.center + (base - self.center) * self.zoom + self.pan
    }

    pub fn to_data(&self, screen: Point) -> Point {
        let base = self.center + (screen - self.pan - self.center) / self.zoom;
        Point::new(
            self.data_min.x + (base.x - self.inner_origin.x) / self.scale.x,
            self.data_min.y + (base.y - self.inner_origin.y) / self.scale.y,
        )
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    /// Screen pixels per data unit along each axis at the current zoom.
    pub fn pixels_per_unit(&self) -> Vec2 {
        self.scale * self.zoom
    }
}

fn axis_scale(inner_extent: f64, range: f64) -> f64 {
    if range <= AXIS_EPSILON {
        1.0
    } else {
        inner_extent / range
    }
}
