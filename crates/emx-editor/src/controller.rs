//! Selection state machine.
//!
//! The controller owns the active mode, its tool, and the [`SelectionSet`].
//! Pointer events go to the tool; the intents it returns are resolved here
//! against the current frame (clusters, visible points, transform) and
//! applied to the set. Every change is reported to listeners before the
//! call returns.

use crate::input::InputEvent;
use crate::selection::SelectionSet;
use crate::tools::{SelectionIntent, SelectionMode, Tool, ToolState, tool_for};
use emx_core::{Cluster, CoordinateTransform, Dataset, EntityId, ExplorerConfig, Point, PointId};
use emx_render::Overlay;
use emx_render::hit::{hit_test, hit_test_polygon, hit_test_rect};

/// Called synchronously with the full, sorted selection after each change.
pub type SelectionListener = Box<dyn FnMut(&[PointId])>;

/// The frame state an intent is resolved against.
pub struct SelectionContext<'a> {
    pub points: &'a [Point],
    /// Visible points only, as indices into `points`.
    pub candidates: &'a [usize],
    /// Clusters over `candidates` at the current zoom.
    pub clusters: &'a [Cluster],
    pub transform: &'a CoordinateTransform,
    pub hit_tolerance: f64,
}

impl SelectionContext<'_> {
    pub fn hit(&self, screen: kurbo::Point) -> Option<EntityId> {
        hit_test(screen, self.clusters, self.transform, self.hit_tolerance)
    }

    /// Underlying point ids of an entity. Unknown entities expand to nothing.
    pub fn expand(&self, entity: EntityId) -> Vec<PointId> {
        match entity {
            EntityId::Point(id) => vec![id],
            EntityId::Cluster(_) => self
                .clusters
                .iter()
                .find(|c| c.id == entity)
                .map(|c| c.member_ids(self.points).collect())
                .unwrap_or_default(),
        }
    }
}

pub struct SelectionController {
    mode: SelectionMode,
    tool: Box<dyn Tool>,
    selection: SelectionSet,
    listeners: Vec<SelectionListener>,
    polygon_close_radius: f64,
}

impl std::fmt::Debug for SelectionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionController")
            .field("mode", &self.mode)
            .field("tool_state", &self.tool.state())
            .field("selected", &self.selection.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SelectionController {
    /// Start in the configured default mode, or `Click` if it does not parse.
    pub fn new(config: &ExplorerConfig) -> Self {
        let mode = config.default_mode.parse().unwrap_or_else(|e| {
            log::warn!("{e}; starting in click mode");
            SelectionMode::Click
        });
        Self {
            mode,
            tool: tool_for(mode, config.polygon_close_radius),
            selection: SelectionSet::new(),
            listeners: Vec::new(),
            polygon_close_radius: config.polygon_close_radius,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn tool_state(&self) -> ToolState {
        self.tool.state()
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.tool.state().overlay()
    }

    pub fn subscribe(&mut self, listener: SelectionListener) {
        self.listeners.push(listener);
    }

    // ─── Mode ────────────────────────────────────────────────────────────

    /// Switch by host name. Unknown names are rejected and the current mode
    /// (and any gesture in progress) is kept.
    pub fn set_mode(&mut self, name: &str) -> Result<SelectionMode, String> {
        match name.parse::<SelectionMode>() {
            Ok(mode) => {
                self.switch_mode(mode);
                Ok(mode)
            }
            Err(e) => {
                log::warn!("{e}; keeping {} mode", self.mode);
                Err(e)
            }
        }
    }

    /// Abandon any gesture and activate `mode`. The selection is untouched.
    pub fn switch_mode(&mut self, mode: SelectionMode) {
        self.tool.cancel();
        if mode != self.mode {
            log::debug!("selection mode {} -> {}", self.mode, mode);
            self.mode = mode;
            self.tool = tool_for(mode, self.polygon_close_radius);
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Route a pointer event to the active tool. Returns `true` if the
    /// selection changed.
    pub fn handle(&mut self, event: &InputEvent, ctx: &SelectionContext<'_>) -> bool {
        let hit = match (self.mode, event) {
            (SelectionMode::Click, InputEvent::PointerDown { x, y, .. }) => {
                ctx.hit(kurbo::Point::new(*x, *y))
            }
            _ => None,
        };
        match self.tool.handle(event, hit) {
            Some(intent) => self.apply(intent, ctx),
            None => false,
        }
    }

    /// Explicit finish of a polygon gesture. Needs at least 3 vertices.
    pub fn finish_polygon(&mut self, ctx: &SelectionContext<'_>) -> bool {
        match self.tool.finish() {
            Some(intent) => self.apply(intent, ctx),
            None => false,
        }
    }

    /// Discard the gesture in progress. Returns `true` if there was one.
    pub fn cancel(&mut self) -> bool {
        let active = !self.tool.state().is_idle();
        self.tool.cancel();
        active
    }

    fn apply(&mut self, intent: SelectionIntent, ctx: &SelectionContext<'_>) -> bool {
        let changed = match intent {
            SelectionIntent::Toggle(entity) => {
                let ids = ctx.expand(entity);
                log::debug!("toggle {entity} ({} points)", ids.len());
                self.selection.toggle_all(ids)
            }
            SelectionIntent::ReplaceWithBox(rect) => {
                let ids = hit_test_rect(rect, ctx.points, ctx.candidates, ctx.transform);
                log::debug!("box {rect:?} matched {} points", ids.len());
                self.selection.replace_with(ids)
            }
            SelectionIntent::ReplaceWithPolygon(vertices) => {
                let ids = hit_test_polygon(&vertices, ctx.points, ctx.candidates, ctx.transform);
                log::debug!("lasso with {} vertices matched {} points", vertices.len(), ids.len());
                self.selection.replace_with(ids)
            }
        };
        self.notify_if(changed)
    }

    // ─── Host commands ───────────────────────────────────────────────────

    pub fn clear_selection(&mut self) -> bool {
        let changed = self.selection.clear();
        self.notify_if(changed)
    }

    /// Replace the selection with the given ids, dropping any not in
    /// `dataset`.
    pub fn select_ids(&mut self, ids: impl IntoIterator<Item = PointId>, dataset: &Dataset) -> bool {
        let changed = self
            .selection
            .replace_with(ids.into_iter().filter(|id| dataset.contains(*id)));
        self.notify_if(changed)
    }

    pub fn deselect(&mut self, ids: impl IntoIterator<Item = PointId>) -> bool {
        let changed = self.selection.remove_all(ids);
        self.notify_if(changed)
    }

    /// Drop ids that are no longer in `dataset` or are hidden.
    pub fn prune(&mut self, dataset: &Dataset, visible: impl Fn(&Point) -> bool) -> bool {
        let dropped = self
            .selection
            .retain(|id| dataset.get(id).is_some_and(&visible));
        if !dropped.is_empty() {
            log::warn!("pruned {} stale selected ids", dropped.len());
        }
        self.notify_if(!dropped.is_empty())
    }

    fn notify_if(&mut self, changed: bool) -> bool {
        if changed {
            let ids = self.selection.sorted_ids();
            for listener in &mut self.listeners {
                listener(&ids);
            }
        }
        changed
    }
}
