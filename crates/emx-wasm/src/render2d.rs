//! Canvas2D renderer.
//!
//! Implements [`Renderer`] on top of `CanvasRenderingContext2d`. The grid
//! and axis labels are painted once into an offscreen canvas and blitted
//! each frame; points and the selection overlay are drawn on top.

use emx_core::Rgba;
use emx_core::kurbo::Point;
use emx_render::layers::{
    Chrome, ChromeUpdate, DrawPoint, FIRST_VERTEX, Frame, OVERLAY_FILL, OVERLAY_STROKE, Overlay,
};
use emx_render::Renderer;
use std::f64::consts::{FRAC_PI_2, TAU};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// Theme-dependent colors for the canvas renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTheme {
    pub bg: &'static str,
    pub grid: &'static str,
    pub label: &'static str,
    pub badge_text: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            bg: "#ffffff",
            grid: "#e5e7eb",
            label: "#6b7280",
            badge_text: "#ffffff",
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: "#111827",
            grid: "rgba(255, 255, 255, 0.06)",
            label: "#9ca3af",
            badge_text: "#ffffff",
        }
    }
}

/// Below this radius a cluster badge would not fit inside the circle.
const MIN_BADGE_RADIUS: f64 = 7.0;
const VERTEX_RADIUS: f64 = 3.0;
const FIRST_VERTEX_RADIUS: f64 = 5.0;

pub struct Canvas2dRenderer {
    ctx: CanvasRenderingContext2d,
    theme: CanvasTheme,
    /// Last chrome received; repainted directly when no offscreen canvas
    /// could be created.
    chrome: Option<Chrome>,
    chrome_canvas: Option<HtmlCanvasElement>,
}

impl Canvas2dRenderer {
    pub fn new(ctx: CanvasRenderingContext2d, theme: CanvasTheme) -> Self {
        Self {
            ctx,
            theme,
            chrome: None,
            chrome_canvas: None,
        }
    }

    pub fn context(&self) -> &CanvasRenderingContext2d {
        &self.ctx
    }

    /// Swap the theme. The caller must invalidate chrome so the grid is
    /// repainted in the new colors.
    pub fn set_theme(&mut self, theme: CanvasTheme) {
        self.theme = theme;
    }

    fn rebuild_chrome(&mut self, chrome: &Chrome) {
        self.chrome_canvas = offscreen_canvas(chrome).and_then(|canvas| {
            let ctx = context_2d(&canvas)?;
            paint_chrome(&ctx, chrome, &self.theme);
            Some(canvas)
        });
        if self.chrome_canvas.is_none() {
            log::warn!("offscreen canvas unavailable; chrome is repainted every frame");
        }
        self.chrome = Some(chrome.clone());
    }

    fn blit_chrome(&self, frame: &Frame) {
        let ctx = &self.ctx;
        ctx.set_fill_style_str(self.theme.bg);
        ctx.fill_rect(0.0, 0.0, frame.canvas.width, frame.canvas.height);
        match (&self.chrome_canvas, &self.chrome) {
            (Some(canvas), _) => {
                if let Err(e) = ctx.draw_image_with_html_canvas_element(canvas, 0.0, 0.0) {
                    log::warn!("chrome blit failed: {e:?}");
                }
            }
            (None, Some(chrome)) => paint_chrome(ctx, chrome, &self.theme),
            (None, None) => {}
        }
    }
}

impl Renderer for Canvas2dRenderer {
    fn draw_frame(&mut self, frame: &Frame) {
        if let ChromeUpdate::Rebuild(chrome) = &frame.chrome {
            self.rebuild_chrome(chrome);
        }
        self.blit_chrome(frame);
        for point in frame.points() {
            draw_point(&self.ctx, point, &self.theme);
        }
        if let Some(overlay) = &frame.overlay {
            draw_overlay(&self.ctx, overlay);
        }
    }
}

fn offscreen_canvas(chrome: &Chrome) -> Option<HtmlCanvasElement> {
    let document = web_sys::window()?.document()?;
    let canvas = document
        .create_element("canvas")
        .ok()?
        .dyn_into::<HtmlCanvasElement>()
        .ok()?;
    canvas.set_width(chrome.size.width.ceil() as u32);
    canvas.set_height(chrome.size.height.ceil() as u32);
    Some(canvas)
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()??
        .dyn_into::<CanvasRenderingContext2d>()
        .ok()
}

fn paint_chrome(ctx: &CanvasRenderingContext2d, chrome: &Chrome, theme: &CanvasTheme) {
    let (w, h) = (chrome.size.width, chrome.size.height);
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, w, h);

    ctx.set_stroke_style_str(theme.grid);
    ctx.set_line_width(1.0);
    ctx.begin_path();
    for &x in &chrome.columns {
        ctx.move_to(x, 0.0);
        ctx.line_to(x, h);
    }
    for &y in &chrome.rows {
        ctx.move_to(0.0, y);
        ctx.line_to(w, y);
    }
    ctx.stroke();

    ctx.set_fill_style_str(theme.label);
    ctx.set_font("12px sans-serif");
    for (i, label) in chrome.labels.iter().enumerate() {
        // Second label is the vertical axis caption.
        let rotated = i == 1;
        if let Err(e) = draw_label(ctx, &label.text, label.position, rotated) {
            log::warn!("label {:?} failed: {e:?}", label.text);
        }
    }
}

fn draw_label(ctx: &CanvasRenderingContext2d, text: &str, at: Point, rotated: bool) -> Result<(), JsValue> {
    if !rotated {
        ctx.set_text_align(if at.x > 50.0 { "center" } else { "left" });
        return ctx.fill_text(text, at.x, at.y);
    }
    ctx.save();
    ctx.translate(at.x + 6.0, at.y)?;
    ctx.rotate(-FRAC_PI_2)?;
    ctx.set_text_align("center");
    let result = ctx.fill_text(text, 0.0, 0.0);
    ctx.restore();
    result
}

fn draw_point(ctx: &CanvasRenderingContext2d, point: &DrawPoint, theme: &CanvasTheme) {
    ctx.begin_path();
    if ctx.arc(point.center.x, point.center.y, point.radius, 0.0, TAU).is_err() {
        return;
    }
    ctx.set_fill_style_str(&css(point.color));
    ctx.fill();

    if let Some(outline) = point.outline {
        ctx.set_stroke_style_str(&css(outline));
        ctx.set_line_width(2.0);
        ctx.stroke();
    }

    if let Some(count) = point.badge
        && point.radius >= MIN_BADGE_RADIUS
    {
        ctx.set_fill_style_str(theme.badge_text);
        ctx.set_font("bold 10px sans-serif");
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        let _ = ctx.fill_text(&count.to_string(), point.center.x, point.center.y);
        ctx.set_text_baseline("alphabetic");
    }
}

fn draw_overlay(ctx: &CanvasRenderingContext2d, overlay: &Overlay) {
    ctx.save();
    let dash = JsValue::from_f64(5.0);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(&dash, &dash));
    ctx.set_stroke_style_str(&css(OVERLAY_STROKE));
    ctx.set_fill_style_str(&css(OVERLAY_FILL));
    ctx.set_line_width(1.5);

    match overlay {
        Overlay::Box(rect) => {
            ctx.fill_rect(rect.x0, rect.y0, rect.width(), rect.height());
            ctx.stroke_rect(rect.x0, rect.y0, rect.width(), rect.height());
        }
        Overlay::Polygon { vertices, closed } => {
            if let Some((first, rest)) = vertices.split_first() {
                ctx.begin_path();
                ctx.move_to(first.x, first.y);
                for v in rest {
                    ctx.line_to(v.x, v.y);
                }
                if *closed {
                    ctx.close_path();
                    ctx.fill();
                }
                ctx.stroke();
            }
            let _ = ctx.set_line_dash(&js_sys::Array::new());
            for (i, v) in vertices.iter().enumerate() {
                let (color, r) = if i == 0 {
                    (FIRST_VERTEX, FIRST_VERTEX_RADIUS)
                } else {
                    (OVERLAY_STROKE, VERTEX_RADIUS)
                };
                ctx.begin_path();
                if ctx.arc(v.x, v.y, r, 0.0, TAU).is_ok() {
                    ctx.set_fill_style_str(&css(color));
                    ctx.fill();
                }
            }
        }
    }
    ctx.restore();
}

fn css(color: Rgba) -> String {
    color.to_css()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_theme_matches_chrome_palette() {
        use emx_render::layers::{BACKGROUND, GRID_LINE, LABEL_TEXT};
        let theme = CanvasTheme::light();
        let hex = |c: Rgba| format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b);
        assert_eq!(theme.bg, hex(BACKGROUND));
        assert_eq!(theme.grid, hex(GRID_LINE));
        assert_eq!(theme.label, hex(LABEL_TEXT));
    }
}
