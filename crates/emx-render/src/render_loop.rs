//! Frame composition.
//!
//! The loop never keeps drawable state between frames: every draw rebuilds
//! the whole [`Frame`] from the committed state passed in [`FrameInput`], so
//! a skipped frame cannot leave stale pixels behind. The only memory is the
//! chrome key, so the renderer can keep its cached grid.

use crate::hit::visible_candidates;
use crate::layers::{
    Chrome, ChromeUpdate, DrawPoint, Frame, HOVER_OUTLINE, Overlay, Renderer, SELECTION_OUTLINE,
    UNSELECTED_ALPHA,
};
use emx_core::geometry::rect_contains_inclusive;
use emx_core::{
    Cluster, ClusteringEngine, CoordinateTransform, Dataset, EntityId, PointId, PointStyler,
    Rgba, ViewportController,
};
use kurbo::{Point, Rect, Size};
use std::collections::HashSet;

/// Committed state the next frame is drawn from.
pub struct FrameInput<'a> {
    pub dataset: &'a Dataset,
    pub styler: &'a dyn PointStyler,
    pub viewport: &'a ViewportController,
    pub clustering: &'a ClusteringEngine,
    pub canvas: Size,
    pub selection: &'a HashSet<PointId>,
    pub hovered: Option<EntityId>,
    pub overlay: Option<Overlay>,
    pub point_radius: f64,
    pub cull_margin: f64,
}

impl FrameInput<'_> {
    pub fn transform(&self) -> CoordinateTransform {
        self.viewport.transform(self.canvas)
    }

    /// Clusters over the visible points at the current zoom. Hit testing
    /// uses the same list the frame is drawn from.
    pub fn clusters(&self) -> Vec<Cluster> {
        let candidates = visible_candidates(self.dataset.points(), self.styler);
        self.clustering
            .cluster_indices(self.dataset.points(), &candidates, self.viewport.zoom())
    }
}

/// Drives a [`Renderer`] on a recurring schedule and on demand.
#[derive(Debug, Default)]
pub struct RenderLoop {
    dirty: bool,
    /// Canvas size and point count the renderer's chrome was built for.
    chrome_key: Option<(Size, usize)>,
    frames: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            dirty: true,
            ..Self::default()
        }
    }

    /// Mark the committed state as changed.
    pub fn request_redraw(&mut self) {
        self.dirty = true;
    }

    pub fn needs_redraw(&self) -> bool {
        self.dirty
    }

    /// Force the next frame to resend chrome (e.g. the renderer was replaced).
    pub fn invalidate_chrome(&mut self) {
        self.chrome_key = None;
        self.dirty = true;
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }

    /// Recurring frame callback: always draws.
    pub fn tick(&mut self, input: &FrameInput<'_>, renderer: &mut dyn Renderer) -> bool {
        let frame = self.build_frame(input);
        renderer.draw_frame(&frame);
        self.dirty = false;
        self.frames += 1;
        true
    }

    /// On-demand redraw: draws only if a redraw was requested since the last
    /// frame.
    pub fn flush(&mut self, input: &FrameInput<'_>, renderer: &mut dyn Renderer) -> bool {
        if !self.dirty {
            return false;
        }
        self.tick(input, renderer)
    }

    /// Compose the frame for `input`, updating the chrome key.
    pub fn build_frame(&mut self, input: &FrameInput<'_>) -> Frame {
        let key = (input.canvas, input.dataset.len());
        let chrome = if self.chrome_key == Some(key) {
            ChromeUpdate::Keep
        } else {
            self.chrome_key = Some(key);
            ChromeUpdate::Rebuild(Chrome::build(input.canvas, input.dataset.len()))
        };

        let transform = input.transform();
        let clusters = input.clusters();
        let visible_area = Rect::from_origin_size(Point::ORIGIN, input.canvas)
            .inflate(input.cull_margin, input.cull_margin);

        let mut frame = Frame {
            canvas: input.canvas,
            chrome,
            unselected: Vec::new(),
            selected: Vec::new(),
            hovered: None,
            overlay: input.overlay.clone(),
        };
        let mut culled = 0usize;

        for cluster in &clusters {
            let center = transform.to_screen(cluster.centroid);
            if !rect_contains_inclusive(visible_area, center) {
                culled += 1;
                continue;
            }
            let points = input.dataset.points();
            let is_selected = cluster
                .member_ids(points)
                .any(|id| input.selection.contains(&id));
            let base_radius = cluster.radius(input.point_radius);
            let color = cluster_color(cluster, input);
            let badge = (!cluster.is_singleton()).then(|| cluster.count() as u32);

            let mut draw = DrawPoint {
                entity: cluster.id,
                center,
                radius: base_radius,
                color,
                outline: None,
                badge,
            };

            if input.hovered == Some(cluster.id) {
                draw.radius = base_radius + if is_selected { 2.0 } else { 1.0 };
                draw.outline = Some(if is_selected { SELECTION_OUTLINE } else { HOVER_OUTLINE });
                frame.hovered = Some(draw);
            } else if is_selected {
                draw.radius = base_radius + 2.0;
                draw.outline = Some(SELECTION_OUTLINE);
                frame.selected.push(draw);
            } else {
                draw.color = fade(color);
                frame.unselected.push(draw);
            }
        }

        log::trace!(
            "frame: {} clusters, {} unselected, {} selected, hovered={}, culled {}",
            clusters.len(),
            frame.unselected.len(),
            frame.selected.len(),
            frame.hovered.is_some(),
            culled
        );
        frame
    }
}

/// Singletons use their own style; aggregates use the dominant category's
/// color when the styler colors by a categorical attribute.
fn cluster_color(cluster: &Cluster, input: &FrameInput<'_>) -> Rgba {
    let points = input.dataset.points();
    let first = &points[cluster.members[0]];
    let own = input.styler.style(first).color;
    if cluster.is_singleton() {
        return own;
    }
    input
        .styler
        .color_attribute()
        .and_then(|attr| cluster.dominant_category(points, attr))
        .and_then(|category| input.styler.category_color(category))
        .unwrap_or(own)
}

fn fade(color: Rgba) -> Rgba {
    color.with_alpha(((color.a as u16 * UNSELECTED_ALPHA as u16) / 255) as u8)
}
