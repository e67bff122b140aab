//! Frame → Vello drawing commands.
//!
//! Encodes each [`Frame`] into a `vello::Scene`. The chrome is encoded into
//! its own scene once per [`ChromeUpdate::Rebuild`] and appended every frame.
//! The caller presents the scene via wgpu.

use crate::layers::{
    BACKGROUND, Chrome, ChromeUpdate, DrawPoint, FIRST_VERTEX, Frame, GRID_LINE, OVERLAY_FILL,
    OVERLAY_STROKE, Overlay, Renderer,
};
use emx_core::Rgba;
use kurbo::{Affine, BezPath, Circle, Line, Point, Rect, Stroke};
use peniko::{Color, Fill};
use vello::Scene;

/// Vello implementation of [`Renderer`].
#[derive(Default)]
pub struct VelloRenderer {
    scene: Scene,
    chrome: Scene,
}

impl VelloRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene for the last drawn frame, ready to hand to `vello::Renderer`.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}

impl Renderer for VelloRenderer {
    fn draw_frame(&mut self, frame: &Frame) {
        if let ChromeUpdate::Rebuild(chrome) = &frame.chrome {
            self.chrome.reset();
            paint_chrome(&mut self.chrome, chrome);
        }

        self.scene.reset();
        self.scene.append(&self.chrome, None);
        for point in frame.points() {
            paint_point(&mut self.scene, point);
        }
        if let Some(overlay) = &frame.overlay {
            paint_overlay(&mut self.scene, overlay);
        }
    }
}

// ─── Chrome ──────────────────────────────────────────────────────────────────

fn paint_chrome(scene: &mut Scene, chrome: &Chrome) {
    let bg = Rect::new(0.0, 0.0, chrome.size.width, chrome.size.height);
    scene.fill(Fill::NonZero, Affine::IDENTITY, color(BACKGROUND), None, &bg);

    let stroke = Stroke::new(1.0);
    let grid = color(GRID_LINE);
    for &x in &chrome.columns {
        let line = Line::new((x, 0.0), (x, chrome.size.height));
        scene.stroke(&stroke, Affine::IDENTITY, grid, None, &line);
    }
    for &y in &chrome.rows {
        let line = Line::new((0.0, y), (chrome.size.width, y));
        scene.stroke(&stroke, Affine::IDENTITY, grid, None, &line);
    }

    for label in &chrome.labels {
        log::trace!("LABEL {:?} at ({}, {})", label.text, label.position.x, label.position.y);
        // Text shaping needs a font context; labels are left to the host.
    }
}

// ─── Points and overlay ──────────────────────────────────────────────────────

fn paint_point(scene: &mut Scene, point: &DrawPoint) {
    let circle = Circle::new(point.center, point.radius);
    scene.fill(Fill::NonZero, Affine::IDENTITY, color(point.color), None, &circle);
    if let Some(outline) = point.outline {
        scene.stroke(&Stroke::new(2.0), Affine::IDENTITY, color(outline), None, &circle);
    }
    if let Some(count) = point.badge {
        log::trace!("BADGE {} at ({}, {})", count, point.center.x, point.center.y);
    }
}

fn paint_overlay(scene: &mut Scene, overlay: &Overlay) {
    let stroke = Stroke::new(2.0).with_dashes(0.0, [5.0, 5.0]);
    match overlay {
        Overlay::Box(rect) => {
            scene.fill(Fill::NonZero, Affine::IDENTITY, color(OVERLAY_FILL), None, rect);
            scene.stroke(&stroke, Affine::IDENTITY, color(OVERLAY_STROKE), None, rect);
        }
        Overlay::Polygon { vertices, closed } => {
            let Some(path) = polygon_path(vertices, *closed) else {
                return;
            };
            if *closed {
                scene.fill(Fill::EvenOdd, Affine::IDENTITY, color(OVERLAY_FILL), None, &path);
            }
            scene.stroke(&stroke, Affine::IDENTITY, color(OVERLAY_STROKE), None, &path);

            for (i, v) in vertices.iter().enumerate() {
                let (c, r) = if i == 0 {
                    (FIRST_VERTEX, 5.0)
                } else {
                    (OVERLAY_STROKE, 3.0)
                };
                scene.fill(Fill::NonZero, Affine::IDENTITY, color(c), None, &Circle::new(*v, r));
            }
        }
    }
}

fn polygon_path(vertices: &[Point], closed: bool) -> Option<BezPath> {
    let (first, rest) = vertices.split_first()?;
    let mut path = BezPath::new();
    path.move_to(*first);
    for v in rest {
        path.line_to(*v);
    }
    if closed {
        path.close_path();
    }
    Some(path)
}

fn color(c: Rgba) -> Color {
    Color::from_rgba8(c.r, c.g, c.b, c.a)
}
