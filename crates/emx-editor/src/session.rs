//! Explorer session: one owned instance per visualization surface.
//!
//! `Explorer` ties the pieces together: dataset and styler, viewport,
//! clustering, selection controller, hover state and the render loop.
//! Hosts create one per canvas with [`Explorer::create`] and drop it with
//! [`Explorer::teardown`]; nothing is global.
//!
//! All calls are synchronous and expected on one thread. Every mutation of
//! committed state requests a redraw, so `render_if_needed` after any batch
//! of calls always shows the latest state.

use crate::controller::{SelectionContext, SelectionController, SelectionListener};
use crate::input::{InputEvent, Modifiers};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::SelectionMode;
use emx_core::{
    AttributeStyler, Cluster, ClusteringEngine, Dataset, EntityId, ExplorerConfig, PointId, PointStyler,
    ViewportController,
};
use emx_render::hit::visible_candidates;
use emx_render::{FrameInput, RenderLoop, Renderer};
use kurbo::{Point, Size, Vec2};

/// Tooltip anchor offset above the pointer.
const HOVER_ANCHOR_OFFSET: f64 = 10.0;

/// What the pointer is over, and where the host should place a tooltip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverInfo {
    pub entity: EntityId,
    pub anchor: Point,
}

/// Called with `Some` when the pointer enters an entity and `None` when it
/// leaves.
pub type HoverListener = Box<dyn FnMut(Option<&HoverInfo>)>;

/// Visible points and their clusters, cached per (dataset, zoom, styler).
#[derive(Default)]
struct Derived {
    key: Option<(u64, u64, u64)>,
    candidates: Vec<usize>,
    clusters: Vec<Cluster>,
}

pub struct Explorer {
    config: ExplorerConfig,
    canvas: Size,
    dataset: Dataset,
    styler: Box<dyn PointStyler>,
    /// Bumped whenever visibility may have changed.
    styler_epoch: u64,
    viewport: ViewportController,
    clustering: ClusteringEngine,
    selection: SelectionController,
    derived: Derived,
    hovered: Option<EntityId>,
    hover_listeners: Vec<HoverListener>,
    /// Space held: pointer drags pan instead of selecting.
    pan_armed: bool,
    render_loop: RenderLoop,
}

impl Explorer {
    pub fn create(config: ExplorerConfig) -> Self {
        let config = config.validated();
        log::debug!(
            "explorer created: {}x{} canvas, {} mode",
            config.canvas_width,
            config.canvas_height,
            config.default_mode
        );
        Self {
            canvas: Size::new(config.canvas_width, config.canvas_height),
            dataset: Dataset::default(),
            styler: Box::new(AttributeStyler::default()),
            styler_epoch: 0,
            viewport: ViewportController::new(&config),
            clustering: ClusteringEngine::new(&config),
            selection: SelectionController::new(&config),
            derived: Derived::default(),
            hovered: None,
            hover_listeners: Vec::new(),
            pan_armed: false,
            render_loop: RenderLoop::new(),
            config,
        }
    }

    /// End of the surface's lifetime. Listeners are dropped with it.
    pub fn teardown(self) {
        log::debug!(
            "explorer torn down after {} frames",
            self.render_loop.frames_drawn()
        );
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    pub fn hovered(&self) -> Option<EntityId> {
        self.hovered
    }

    pub fn selected_ids(&self) -> Vec<PointId> {
        self.selection.selection().sorted_ids()
    }

    pub fn is_pan_armed(&self) -> bool {
        self.pan_armed
    }

    pub fn needs_redraw(&self) -> bool {
        self.render_loop.needs_redraw()
    }

    /// Clusters for the current zoom over the visible points, as drawn.
    pub fn clusters(&mut self) -> &[Cluster] {
        self.refresh_derived();
        &self.derived.clusters
    }

    // ─── Subscriptions ───────────────────────────────────────────────────

    pub fn on_selection_changed(&mut self, listener: SelectionListener) {
        self.selection.subscribe(listener);
    }

    pub fn on_hover(&mut self, listener: HoverListener) {
        self.hover_listeners.push(listener);
    }

    // ─── Data ────────────────────────────────────────────────────────────

    /// Replace the dataset wholesale. Any gesture in progress is cancelled
    /// and selected ids missing from the new data are pruned.
    pub fn load_dataset(&mut self, dataset: Dataset) {
        log::debug!(
            "loading dataset rev {} ({} points)",
            dataset.revision(),
            dataset.len()
        );
        self.selection.cancel();
        self.viewport.end_pan();
        self.viewport.set_data_bounds(dataset.bounds());
        self.dataset = dataset;
        self.styler.rebind(&self.dataset);
        self.styler_epoch += 1;
        self.prune_selection();
        self.set_hover(None, Point::ORIGIN);
        self.render_loop.request_redraw();
    }

    /// Parse and load points from JSON (`[{"id", "x", "y", ...attributes}]`).
    pub fn load_json(&mut self, json: &str) -> Result<(), String> {
        let dataset = Dataset::from_json(json)?;
        self.load_dataset(dataset);
        Ok(())
    }

    pub fn set_styler(&mut self, styler: Box<dyn PointStyler>) {
        self.styler = styler;
        self.refresh_visibility();
    }

    /// Color by `attribute` with the built-in styler.
    pub fn color_by(&mut self, attribute: Option<&str>) {
        self.set_styler(Box::new(AttributeStyler::new(&self.dataset, attribute)));
    }

    /// Re-evaluate visibility after the styler's filter changed. Hidden ids
    /// leave the selection.
    pub fn refresh_visibility(&mut self) {
        self.styler_epoch += 1;
        self.prune_selection();
        if let Some(entity) = self.hovered
            && !self.entity_visible(entity)
        {
            self.set_hover(None, Point::ORIGIN);
        }
        self.render_loop.request_redraw();
    }

    fn prune_selection(&mut self) {
        let styler = &self.styler;
        self.selection
            .prune(&self.dataset, |p| styler.style(p).visible);
    }

    fn entity_visible(&mut self, entity: EntityId) -> bool {
        self.refresh_derived();
        self.derived.clusters.iter().any(|c| c.id == entity)
    }

    // ─── Selection commands ──────────────────────────────────────────────

    /// Switch by host name. Unknown names leave the mode unchanged.
    pub fn set_mode(&mut self, name: &str) -> Result<SelectionMode, String> {
        let mode = self.selection.set_mode(name)?;
        self.render_loop.request_redraw();
        Ok(mode)
    }

    pub fn switch_mode(&mut self, mode: SelectionMode) {
        self.selection.switch_mode(mode);
        self.render_loop.request_redraw();
    }

    pub fn cancel(&mut self) -> bool {
        let cancelled = self.selection.cancel();
        if cancelled {
            self.render_loop.request_redraw();
        }
        cancelled
    }

    pub fn finish_polygon(&mut self) -> bool {
        let changed = self.with_context(|sel, ctx| sel.finish_polygon(ctx));
        self.render_loop.request_redraw();
        changed
    }

    pub fn clear_selection(&mut self) -> bool {
        let changed = self.selection.clear_selection();
        self.redraw_if(changed)
    }

    pub fn select_ids(&mut self, ids: impl IntoIterator<Item = PointId>) -> bool {
        let changed = self.selection.select_ids(ids, &self.dataset);
        self.redraw_if(changed)
    }

    pub fn deselect(&mut self, ids: impl IntoIterator<Item = PointId>) -> bool {
        let changed = self.selection.deselect(ids);
        self.redraw_if(changed)
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    pub fn pointer_down(&mut self, x: f64, y: f64, modifiers: Modifiers) -> bool {
        if self.pan_armed {
            self.viewport.begin_pan(Point::new(x, y));
            return false;
        }
        self.route(InputEvent::from_pointer_down(x, y, modifiers))
    }

    /// Pans during a pan gesture; otherwise feeds the active tool and
    /// updates hover.
    pub fn pointer_move(&mut self, x: f64, y: f64, modifiers: Modifiers) -> bool {
        let p = Point::new(x, y);
        if self.viewport.is_panning() {
            if self.viewport.pan_to(p) {
                self.set_hover(None, p);
                self.render_loop.request_redraw();
            }
            return false;
        }
        let changed = self.route(InputEvent::from_pointer_move(x, y, modifiers));
        let hit = self.with_context(|_, ctx| ctx.hit(p));
        self.set_hover(hit, p);
        changed
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, modifiers: Modifiers) -> bool {
        if self.viewport.is_panning() {
            self.viewport.end_pan();
            return false;
        }
        self.route(InputEvent::from_pointer_up(x, y, modifiers))
    }

    pub fn double_click(&mut self, x: f64, y: f64) -> bool {
        self.route(InputEvent::DoubleClick { x, y })
    }

    /// Pointer leaves the canvas.
    pub fn pointer_leave(&mut self) {
        self.set_hover(None, Point::ORIGIN);
    }

    fn route(&mut self, event: InputEvent) -> bool {
        let before = self.selection.tool_state();
        let changed = self.with_context(|sel, ctx| sel.handle(&event, ctx));
        if changed || self.selection.tool_state() != before {
            self.render_loop.request_redraw();
        }
        changed
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Resolve and run a shortcut. Returns the action taken, if any.
    pub fn key(&mut self, key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let action = ShortcutMap::resolve(
            key,
            modifiers.ctrl,
            modifiers.shift,
            modifiers.alt,
            modifiers.meta,
        )?;
        log::debug!("shortcut {key:?} -> {action:?}");
        match action {
            ShortcutAction::Mode(mode) => self.switch_mode(mode),
            ShortcutAction::Cancel => {
                self.cancel();
            }
            ShortcutAction::Finish => {
                self.finish_polygon();
            }
            ShortcutAction::ClearSelection => {
                self.clear_selection();
            }
            ShortcutAction::ZoomIn => {
                self.zoom_in();
            }
            ShortcutAction::ZoomOut => {
                self.zoom_out();
            }
            ShortcutAction::ResetView => {
                self.reset_view();
            }
            ShortcutAction::PanStart => self.pan_armed = true,
        }
        Some(action)
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) -> bool {
        let changed = self.viewport.zoom_in();
        self.view_changed(changed)
    }

    pub fn zoom_out(&mut self) -> bool {
        let changed = self.viewport.zoom_out();
        self.view_changed(changed)
    }

    pub fn reset_view(&mut self) -> bool {
        let changed = self.viewport.reset_view();
        self.view_changed(changed)
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        let changed = self.viewport.pan_by(Vec2::new(dx, dy));
        self.view_changed(changed)
    }

    /// Start a pan gesture at `(x, y)`; subsequent pointer moves pan.
    pub fn begin_pan(&mut self, x: f64, y: f64) {
        self.viewport.begin_pan(Point::new(x, y));
    }

    /// End the pan gesture and disarm space-to-pan.
    pub fn end_pan(&mut self) {
        self.pan_armed = false;
        self.viewport.end_pan();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        let size = Size::new(width.max(1.0), height.max(1.0));
        if size != self.canvas {
            log::debug!("canvas resized to {}x{}", size.width, size.height);
            self.canvas = size;
            self.render_loop.request_redraw();
        }
    }

    fn view_changed(&mut self, changed: bool) -> bool {
        if changed {
            // Entities moved under the pointer; the tooltip is stale.
            self.set_hover(None, Point::ORIGIN);
        }
        self.redraw_if(changed)
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Recurring frame callback: always draws.
    pub fn render_tick(&mut self, renderer: &mut dyn Renderer) -> bool {
        let (input, render_loop) = self.frame_parts();
        render_loop.tick(&input, renderer)
    }

    /// Draw only if something changed since the last frame.
    pub fn render_if_needed(&mut self, renderer: &mut dyn Renderer) -> bool {
        let (input, render_loop) = self.frame_parts();
        render_loop.flush(&input, renderer)
    }

    /// Make the next frame resend chrome (new renderer or surface).
    pub fn invalidate_chrome(&mut self) {
        self.render_loop.invalidate_chrome();
    }

    /// The committed state as a frame input, alongside the render loop that
    /// consumes it.
    fn frame_parts(&mut self) -> (FrameInput<'_>, &mut RenderLoop) {
        let Explorer {
            ref config,
            canvas,
            ref dataset,
            ref styler,
            ref viewport,
            ref clustering,
            ref selection,
            hovered,
            ref mut render_loop,
            ..
        } = *self;
        let input = FrameInput {
            dataset,
            styler: styler.as_ref(),
            viewport,
            clustering,
            canvas,
            selection: selection.selection().as_set(),
            hovered,
            overlay: selection.overlay(),
            point_radius: config.point_radius,
            cull_margin: config.cull_margin,
        };
        (input, render_loop)
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn refresh_derived(&mut self) {
        let key = (
            self.dataset.revision(),
            self.viewport.zoom().to_bits(),
            self.styler_epoch,
        );
        if self.derived.key == Some(key) {
            return;
        }
        let candidates = visible_candidates(self.dataset.points(), self.styler.as_ref());
        let clusters = self
            .clustering
            .cluster_indices(self.dataset.points(), &candidates, self.viewport.zoom());
        self.derived = Derived {
            key: Some(key),
            candidates,
            clusters,
        };
    }

    /// Run `f` with the selection controller and the current frame context.
    fn with_context<R>(
        &mut self,
        f: impl FnOnce(&mut SelectionController, &SelectionContext<'_>) -> R,
    ) -> R {
        self.refresh_derived();
        let transform = self.viewport.transform(self.canvas);
        let ctx = SelectionContext {
            points: self.dataset.points(),
            candidates: &self.derived.candidates,
            clusters: &self.derived.clusters,
            transform: &transform,
            hit_tolerance: self.config.hit_tolerance,
        };
        f(&mut self.selection, &ctx)
    }

    fn set_hover(&mut self, entity: Option<EntityId>, pointer: Point) {
        if entity == self.hovered {
            return;
        }
        self.hovered = entity;
        let info = entity.map(|entity| HoverInfo {
            entity,
            anchor: Point::new(pointer.x, pointer.y - HOVER_ANCHOR_OFFSET),
        });
        for listener in &mut self.hover_listeners {
            listener(info.as_ref());
        }
        self.render_loop.request_redraw();
    }

    fn redraw_if(&mut self, changed: bool) -> bool {
        if changed {
            self.render_loop.request_redraw();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emx_core::style::CATEGORY_PALETTE;
    use emx_core::{AttrValue, Point as DataPoint, Rgba};
    use emx_render::Frame;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Count(usize);

    impl Renderer for Count {
        fn draw_frame(&mut self, _frame: &Frame) {
            self.0 += 1;
        }
    }

    #[derive(Default)]
    struct Colors(Vec<Rgba>);

    impl Renderer for Colors {
        fn draw_frame(&mut self, frame: &Frame) {
            self.0 = frame.points().map(|p| p.color).collect();
        }
    }

    /// Bounds 0..100: screen = 50 + 4 * data.
    fn explorer() -> Explorer {
        let mut ex = Explorer::create(ExplorerConfig::default());
        ex.load_dataset(Dataset::new(vec![
            DataPoint::new("a", 0.0, 0.0),
            DataPoint::new("b", 50.0, 50.0),
            DataPoint::new("c", 100.0, 100.0),
        ]));
        ex
    }

    #[test]
    fn reload_recolors_with_new_categories() {
        let topic = |id: &str, x: f64, name: &str| {
            DataPoint::new(id, x, x).with_attr("topic", AttrValue::Text(name.into()))
        };
        let mut ex = Explorer::create(ExplorerConfig::default());
        ex.load_dataset(Dataset::new(vec![topic("a", 0.0, "Cooking")]));
        ex.color_by(Some("topic"));

        ex.load_dataset(Dataset::new(vec![
            topic("b", 0.0, "Travel"),
            topic("c", 100.0, "Finance"),
        ]));
        let mut colors = Colors::default();
        assert!(ex.render_tick(&mut colors));

        let faded = |c: Rgba| c.with_alpha(204);
        assert_eq!(
            colors.0,
            vec![faded(CATEGORY_PALETTE[0]), faded(CATEGORY_PALETTE[1])]
        );
    }

    #[test]
    fn hover_reports_entity_and_anchor() {
        let mut ex = explorer();
        let seen: Rc<RefCell<Vec<Option<HoverInfo>>>> = Rc::default();
        let sink = seen.clone();
        ex.on_hover(Box::new(move |info| sink.borrow_mut().push(info.copied())));

        ex.pointer_move(252.0, 250.0, Modifiers::NONE);
        ex.pointer_move(253.0, 251.0, Modifiers::NONE);
        ex.pointer_move(400.0, 100.0, Modifiers::NONE);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2, "only changes are reported");
        assert_eq!(
            seen[0],
            Some(HoverInfo {
                entity: EntityId::Point(PointId::intern("b")),
                anchor: Point::new(252.0, 240.0),
            })
        );
        assert_eq!(seen[1], None);
    }

    #[test]
    fn space_drag_pans_instead_of_selecting() {
        let mut ex = explorer();
        ex.key(" ", Modifiers::NONE);
        assert!(ex.is_pan_armed());
        ex.pointer_down(50.0, 50.0, Modifiers::NONE);
        ex.pointer_move(80.0, 40.0, Modifiers::NONE);
        ex.pointer_up(80.0, 40.0, Modifiers::NONE);
        assert_eq!(ex.viewport().viewport().pan, Vec2::new(30.0, -10.0));
        assert!(ex.selected_ids().is_empty());
        ex.end_pan();
        assert!(!ex.is_pan_armed());
    }

    #[test]
    fn render_if_needed_follows_mutations() {
        let mut ex = explorer();
        let mut r = Count::default();
        assert!(ex.render_if_needed(&mut r));
        assert!(!ex.render_if_needed(&mut r));

        ex.pointer_down(50.0, 50.0, Modifiers::NONE);
        assert!(ex.render_if_needed(&mut r));
        assert!(ex.zoom_out());
        assert!(ex.render_if_needed(&mut r));
        assert!(ex.render_tick(&mut r), "tick always draws");
        assert_eq!(r.0, 4);
    }

    #[test]
    fn shortcuts_drive_mode_and_view() {
        let mut ex = explorer();
        assert_eq!(ex.key("l", Modifiers::NONE), Some(ShortcutAction::Mode(SelectionMode::Polygon)));
        assert_eq!(ex.mode(), SelectionMode::Polygon);
        ex.key("+", Modifiers::NONE);
        assert!((ex.viewport().zoom() - 1.2).abs() < 1e-12);
        ex.key("0", Modifiers::NONE);
        assert_eq!(ex.viewport().zoom(), 1.0);
        assert_eq!(ex.key("q", Modifiers::NONE), None);
    }

    #[test]
    fn hidden_selection_is_pruned_on_refresh() {
        let mut ex = explorer();
        ex.select_ids(["a", "b"].map(PointId::intern));
        let styler = AttributeStyler::new(ex.dataset(), None).with_filter(|p| p.id.as_str() != "a");
        ex.set_styler(Box::new(styler));
        assert_eq!(ex.selected_ids(), vec![PointId::intern("b")]);
    }

    #[test]
    fn load_json_rejects_garbage_and_keeps_data() {
        let mut ex = explorer();
        assert!(ex.load_json("{not json").is_err());
        assert_eq!(ex.dataset().len(), 3);
        ex.load_json(r#"[{"id": "z", "x": 1, "y": 2}]"#).expect("valid");
        assert_eq!(ex.dataset().len(), 1);
        ex.teardown();
    }
}
