//! Drawable primitives handed to a [`Renderer`] once per frame.
//!
//! A [`Frame`] is a complete description of what is on screen. Layers are
//! painted in field order: chrome, unselected, selected, hovered, overlay.

use emx_core::{EntityId, Rgba};
use kurbo::{Point, Rect, Size};

/// Outline around selected points.
pub const SELECTION_OUTLINE: Rgba = Rgba::rgb(0x1f, 0x29, 0x37);
/// Outline around the hovered point.
pub const HOVER_OUTLINE: Rgba = Rgba::rgb(0, 0, 0).with_alpha(77);
/// Box and lasso stroke.
pub const OVERLAY_STROKE: Rgba = Rgba::rgb(0x4a, 0x9e, 0xff);
/// Box and lasso fill.
pub const OVERLAY_FILL: Rgba = Rgba::rgb(0x4a, 0x9e, 0xff).with_alpha(26);
/// Marker on the first lasso vertex (the close target).
pub const FIRST_VERTEX: Rgba = Rgba::rgb(0xff, 0x6b, 0x6b);
pub const GRID_LINE: Rgba = Rgba::rgb(0xe5, 0xe7, 0xeb);
pub const LABEL_TEXT: Rgba = Rgba::rgb(0x6b, 0x72, 0x80);
pub const BACKGROUND: Rgba = Rgba::rgb(0xff, 0xff, 0xff);

/// Unselected points are drawn slightly translucent.
pub const UNSELECTED_ALPHA: u8 = 204;

/// One point or cluster, already in screen space.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPoint {
    pub entity: EntityId,
    pub center: Point,
    pub radius: f64,
    pub color: Rgba,
    pub outline: Option<Rgba>,
    /// Member count drawn inside a multi-point cluster.
    pub badge: Option<u32>,
}

/// In-progress selection shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Box(Rect),
    Polygon { vertices: Vec<Point>, closed: bool },
}

/// A text label placed in screen space.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub position: Point,
}

/// Static decoration: grid lines and axis labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Chrome {
    pub size: Size,
    /// Vertical grid line x positions.
    pub columns: Vec<f64>,
    /// Horizontal grid line y positions.
    pub rows: Vec<f64>,
    pub labels: Vec<Label>,
}

impl Chrome {
    /// Grid every 10% of the canvas, axis captions and a point count.
    pub fn build(size: Size, point_count: usize) -> Self {
        let steps = |extent: f64| (1..10).map(|i| extent * i as f64 / 10.0).collect::<Vec<_>>();
        Self {
            size,
            columns: steps(size.width),
            rows: steps(size.height),
            labels: vec![
                Label {
                    text: "X-AXIS".to_string(),
                    position: Point::new(size.width / 2.0, size.height - 6.0),
                },
                Label {
                    text: "Y-AXIS".to_string(),
                    position: Point::new(6.0, size.height / 2.0),
                },
                Label {
                    text: format!("{point_count} points"),
                    position: Point::new(8.0, 16.0),
                },
            ],
        }
    }
}

/// Whether the renderer may reuse the chrome it drew last.
#[derive(Debug, Clone, PartialEq)]
pub enum ChromeUpdate {
    Keep,
    Rebuild(Chrome),
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub canvas: Size,
    pub chrome: ChromeUpdate,
    pub unselected: Vec<DrawPoint>,
    pub selected: Vec<DrawPoint>,
    pub hovered: Option<DrawPoint>,
    pub overlay: Option<Overlay>,
}

impl Frame {
    /// Drawable entities in paint order.
    pub fn points(&self) -> impl Iterator<Item = &DrawPoint> {
        self.unselected
            .iter()
            .chain(self.selected.iter())
            .chain(self.hovered.iter())
    }
}

/// A drawing surface. Implementations own their pixels; nothing else in the
/// workspace writes to them.
pub trait Renderer {
    fn draw_frame(&mut self, frame: &Frame);
}
