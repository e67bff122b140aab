//! Selection tools.
//!
//! Each tool translates input events into `SelectionIntent`s that the
//! [`SelectionController`](crate::controller::SelectionController) applies.
//! Tools only track gesture state; they never touch the selection set.
//!
//! | Mode | Pointer down | Pointer move | Pointer up | Double click |
//! |------|--------------|--------------|------------|--------------|
//! | **Click** | toggle hit entity | — | — | — |
//! | **Box** | start drag | update corner | replace with box | — |
//! | **Polygon** | add vertex / close | — | — | finish |

use crate::input::InputEvent;
use emx_core::EntityId;
use emx_core::geometry::normalized_rect;
use emx_render::Overlay;
use kurbo::{Point, Rect};
use std::fmt;
use std::str::FromStr;

/// The active selection mode determines how input events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionMode {
    Click,
    Box,
    Polygon,
}

impl SelectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Box => "box",
            Self::Polygon => "polygon",
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionMode {
    type Err = String;

    /// Accepts the host's names and their brush/lasso aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "click" | "select" => Ok(Self::Click),
            "box" | "brush" => Ok(Self::Box),
            "polygon" | "lasso" => Ok(Self::Polygon),
            other => Err(format!("unknown selection mode: {other:?}")),
        }
    }
}

/// Snapshot of the in-progress gesture, in screen space.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ToolState {
    #[default]
    Idle,
    BoxDragging { start: Point, current: Point },
    /// `closed` is set while the pointer rests on the close target, so the
    /// next click will close the ring.
    PolygonDrawing { vertices: Vec<Point>, closed: bool },
}

impl ToolState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Visual feedback for the render loop.
    pub fn overlay(&self) -> Option<Overlay> {
        match self {
            Self::Idle => None,
            Self::BoxDragging { start, current } => Some(Overlay::Box(normalized_rect(*start, *current))),
            Self::PolygonDrawing { vertices, .. } if vertices.is_empty() => None,
            Self::PolygonDrawing { vertices, closed } => Some(Overlay::Polygon {
                vertices: vertices.clone(),
                closed: *closed,
            }),
        }
    }
}

/// What a finished gesture asks of the selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionIntent {
    /// Toggle the entity's underlying point ids.
    Toggle(EntityId),
    /// Replace the selection with the visible points inside this screen rect.
    ReplaceWithBox(Rect),
    /// Replace the selection with the visible points inside this screen polygon.
    ReplaceWithPolygon(Vec<Point>),
}

/// Trait for tools that handle input and produce selection intents.
pub trait Tool {
    fn mode(&self) -> SelectionMode;

    /// Handle an input event. `hit` is the entity under the pointer, when the
    /// caller resolved one.
    fn handle(&mut self, event: &InputEvent, hit: Option<EntityId>) -> Option<SelectionIntent>;

    fn state(&self) -> ToolState;

    /// Explicit "finish" action. Only the polygon tool has one.
    fn finish(&mut self) -> Option<SelectionIntent> {
        None
    }

    /// Discard any in-progress gesture.
    fn cancel(&mut self);
}

/// Build the tool for `mode`.
pub fn tool_for(mode: SelectionMode, polygon_close_radius: f64) -> Box<dyn Tool> {
    match mode {
        SelectionMode::Click => Box::new(ClickTool),
        SelectionMode::Box => Box::new(BoxTool::default()),
        SelectionMode::Polygon => Box::new(PolygonTool::new(polygon_close_radius)),
    }
}

// ─── Click Tool ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ClickTool;

impl Tool for ClickTool {
    fn mode(&self) -> SelectionMode {
        SelectionMode::Click
    }

    fn handle(&mut self, event: &InputEvent, hit: Option<EntityId>) -> Option<SelectionIntent> {
        match event {
            // A miss is a no-op, never a clear.
            InputEvent::PointerDown { .. } => hit.map(SelectionIntent::Toggle),
            _ => None,
        }
    }

    fn state(&self) -> ToolState {
        ToolState::Idle
    }

    fn cancel(&mut self) {}
}

// ─── Box Tool ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct BoxTool {
    drag: Option<(Point, Point)>,
}

impl Tool for BoxTool {
    fn mode(&self) -> SelectionMode {
        SelectionMode::Box
    }

    fn handle(&mut self, event: &InputEvent, _hit: Option<EntityId>) -> Option<SelectionIntent> {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                let p = Point::new(*x, *y);
                self.drag = Some((p, p));
                None
            }
            InputEvent::PointerMove { x, y, .. } => {
                if let Some((_, current)) = &mut self.drag {
                    *current = Point::new(*x, *y);
                }
                None
            }
            InputEvent::PointerUp { x, y, .. } => {
                let (start, _) = self.drag.take()?;
                let rect = normalized_rect(start, Point::new(*x, *y));
                Some(SelectionIntent::ReplaceWithBox(rect))
            }
            _ => None,
        }
    }

    fn state(&self) -> ToolState {
        match self.drag {
            Some((start, current)) => ToolState::BoxDragging { start, current },
            None => ToolState::Idle,
        }
    }

    fn cancel(&mut self) {
        self.drag = None;
    }
}

// ─── Polygon Tool ────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct PolygonTool {
    vertices: Vec<Point>,
    /// Clicking this close to the first vertex closes the polygon.
    close_radius: f64,
    /// Pointer is over the close target.
    closing: bool,
}

impl PolygonTool {
    pub fn new(close_radius: f64) -> Self {
        Self {
            vertices: Vec::new(),
            close_radius,
            closing: false,
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn can_finish(&self) -> bool {
        self.vertices.len() >= 3
    }

    fn near_first(&self, p: Point) -> bool {
        self.can_finish()
            && self
                .vertices
                .first()
                .is_some_and(|first| first.distance(p) <= self.close_radius)
    }

    fn add_vertex(&mut self, p: Point) -> Option<SelectionIntent> {
        if self.near_first(p) {
            return self.finish();
        }
        self.closing = false;
        // The second click of a double click repeats the last vertex.
        if self.vertices.last().is_some_and(|last| last.distance(p) < f64::EPSILON) {
            return None;
        }
        self.vertices.push(p);
        None
    }
}

impl Tool for PolygonTool {
    fn mode(&self) -> SelectionMode {
        SelectionMode::Polygon
    }

    fn handle(&mut self, event: &InputEvent, _hit: Option<EntityId>) -> Option<SelectionIntent> {
        match event {
            InputEvent::PointerDown { x, y, .. } => self.add_vertex(Point::new(*x, *y)),
            InputEvent::PointerMove { x, y, .. } => {
                self.closing = self.near_first(Point::new(*x, *y));
                None
            }
            InputEvent::DoubleClick { .. } => self.finish(),
            _ => None,
        }
    }

    /// Finalize with the current vertices. Fewer than 3 vertices keeps
    /// drawing and returns `None`.
    fn finish(&mut self) -> Option<SelectionIntent> {
        if !self.can_finish() {
            return None;
        }
        let vertices = std::mem::take(&mut self.vertices);
        self.closing = false;
        log::debug!("polygon finished with {} vertices", vertices.len());
        Some(SelectionIntent::ReplaceWithPolygon(vertices))
    }

    fn state(&self) -> ToolState {
        if self.vertices.is_empty() {
            ToolState::Idle
        } else {
            ToolState::PolygonDrawing {
                vertices: self.vertices.clone(),
                closed: self.closing,
            }
        }
    }

    fn cancel(&mut self) {
        self.vertices.clear();
        self.closing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use emx_core::PointId;
    use pretty_assertions::assert_eq;

    fn down(x: f64, y: f64) -> InputEvent {
        InputEvent::from_pointer_down(x, y, Modifiers::NONE)
    }

    #[test]
    fn mode_names_and_aliases() {
        assert_eq!("click".parse(), Ok(SelectionMode::Click));
        assert_eq!("Brush".parse(), Ok(SelectionMode::Box));
        assert_eq!("lasso".parse(), Ok(SelectionMode::Polygon));
        assert!("magic-wand".parse::<SelectionMode>().is_err());
        assert_eq!(SelectionMode::Polygon.to_string(), "polygon");
    }

    #[test]
    fn click_toggles_hit_and_ignores_miss() {
        let mut tool = ClickTool;
        let id = EntityId::Point(PointId::intern("p1"));
        assert_eq!(tool.handle(&down(1.0, 1.0), Some(id)), Some(SelectionIntent::Toggle(id)));
        assert_eq!(tool.handle(&down(1.0, 1.0), None), None);
    }

    #[test]
    fn box_drag_normalizes_corners() {
        let mut tool = BoxTool::default();
        assert_eq!(tool.handle(&down(200.0, 150.0), None), None);
        tool.handle(&InputEvent::from_pointer_move(120.0, 90.0, Modifiers::NONE), None);
        assert_eq!(
            tool.state(),
            ToolState::BoxDragging {
                start: Point::new(200.0, 150.0),
                current: Point::new(120.0, 90.0),
            }
        );
        let intent = tool.handle(&InputEvent::from_pointer_up(100.0, 80.0, Modifiers::NONE), None);
        assert_eq!(
            intent,
            Some(SelectionIntent::ReplaceWithBox(Rect::new(100.0, 80.0, 200.0, 150.0)))
        );
        assert!(tool.state().is_idle());
    }

    #[test]
    fn pointer_up_without_drag_is_ignored() {
        let mut tool = BoxTool::default();
        let up = InputEvent::from_pointer_up(10.0, 10.0, Modifiers::NONE);
        assert_eq!(tool.handle(&up, None), None);
    }

    #[test]
    fn polygon_closes_near_first_vertex() {
        let mut tool = PolygonTool::new(15.0);
        for (x, y) in [(100.0, 100.0), (200.0, 100.0), (150.0, 200.0)] {
            assert_eq!(tool.handle(&down(x, y), None), None);
        }
        let intent = tool.handle(&down(108.0, 104.0), None);
        assert_eq!(
            intent,
            Some(SelectionIntent::ReplaceWithPolygon(vec![
                Point::new(100.0, 100.0),
                Point::new(200.0, 100.0),
                Point::new(150.0, 200.0),
            ]))
        );
        assert!(tool.vertices().is_empty());
    }

    #[test]
    fn polygon_near_first_with_two_vertices_keeps_drawing() {
        let mut tool = PolygonTool::new(15.0);
        tool.handle(&down(100.0, 100.0), None);
        tool.handle(&down(200.0, 100.0), None);
        assert_eq!(tool.handle(&down(105.0, 100.0), None), None);
        assert_eq!(tool.vertices().len(), 3);
    }

    #[test]
    fn hovering_the_close_target_marks_the_ring_closed() {
        let mut tool = PolygonTool::new(15.0);
        let hover = |x, y| InputEvent::from_pointer_move(x, y, Modifiers::NONE);
        let closed = |tool: &PolygonTool| matches!(tool.state(), ToolState::PolygonDrawing { closed, .. } if closed);

        tool.handle(&down(100.0, 100.0), None);
        tool.handle(&down(200.0, 100.0), None);
        tool.handle(&hover(104.0, 100.0), None);
        assert!(!closed(&tool), "two vertices cannot close");

        tool.handle(&down(150.0, 200.0), None);
        tool.handle(&hover(104.0, 100.0), None);
        assert!(closed(&tool));
        assert!(matches!(
            tool.state().overlay(),
            Some(Overlay::Polygon { closed: true, .. })
        ));

        tool.handle(&hover(160.0, 160.0), None);
        assert!(!closed(&tool));
        tool.handle(&hover(104.0, 100.0), None);
        tool.cancel();
        tool.handle(&down(0.0, 0.0), None);
        assert!(!closed(&tool), "cancel resets the close preview");
    }

    #[test]
    fn double_click_finishes_only_with_three_vertices() {
        let mut tool = PolygonTool::new(15.0);
        let dbl = InputEvent::DoubleClick { x: 0.0, y: 0.0 };
        tool.handle(&down(0.0, 0.0), None);
        tool.handle(&down(50.0, 0.0), None);
        assert_eq!(tool.handle(&dbl, None), None);

        tool.handle(&down(50.0, 50.0), None);
        tool.handle(&down(50.0, 50.0), None);
        assert_eq!(tool.vertices().len(), 3, "repeat click adds nothing");
        assert!(matches!(tool.handle(&dbl, None), Some(SelectionIntent::ReplaceWithPolygon(v)) if v.len() == 3));
    }

    #[test]
    fn overlay_reflects_gesture() {
        let mut tool = PolygonTool::new(15.0);
        assert_eq!(tool.state().overlay(), None);
        tool.handle(&down(1.0, 2.0), None);
        assert_eq!(
            tool.state().overlay(),
            Some(Overlay::Polygon {
                vertices: vec![Point::new(1.0, 2.0)],
                closed: false,
            })
        );
        tool.cancel();
        assert!(tool.state().is_idle());
    }
}
