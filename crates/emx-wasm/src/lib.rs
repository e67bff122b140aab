//! WASM bridge for EMX: exposes the explorer session to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The host owns the `<canvas>`
//! element and forwards DOM events; all state lives on the Rust side.

mod render2d;

pub use render2d::{Canvas2dRenderer, CanvasTheme};

use emx_core::{ExplorerConfig, PointId};
use emx_editor::{Explorer, HoverInfo, Modifiers, ShortcutAction};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// JS callback shared by the selection and hover listeners.
type ChangeCallback = Rc<RefCell<Option<js_sys::Function>>>;

/// The WASM-facing explorer surface.
///
/// Wraps one [`Explorer`] and the Canvas2D renderer that draws it. All
/// interaction from the page goes through this struct.
#[wasm_bindgen]
pub struct ExplorerCanvas {
    explorer: Explorer,
    renderer: Option<Canvas2dRenderer>,
    on_change: ChangeCallback,
    dark_mode: bool,
}

#[wasm_bindgen]
impl ExplorerCanvas {
    /// Create an explorer with default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        Self::build(width, height, ExplorerConfig::default())
    }

    /// Create an explorer from a JSON config. Missing fields take their
    /// defaults; malformed JSON is an error.
    pub fn with_config(width: f64, height: f64, config_json: &str) -> Result<ExplorerCanvas, JsValue> {
        let config = ExplorerConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e))?;
        Ok(Self::build(width, height, config))
    }

    /// Register the page's change handler. It receives a JSON string:
    /// `{"type":"selection","ids":[...]}` or
    /// `{"type":"hover","id":...,"x":...,"y":...}`.
    pub fn set_on_change(&mut self, callback: js_sys::Function) {
        *self.on_change.borrow_mut() = Some(callback);
    }

    /// Drop listeners and the renderer. The object is unusable afterwards.
    pub fn teardown(self) {
        self.on_change.borrow_mut().take();
        self.explorer.teardown();
    }

    // ─── Data ────────────────────────────────────────────────────────────

    /// Load points from a JSON array. Returns `false` on parse error and
    /// keeps the previous dataset.
    pub fn load_points(&mut self, json: &str) -> bool {
        match self.explorer.load_json(json) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("load_points: {e}");
                false
            }
        }
    }

    /// Color points by a categorical or numeric attribute; empty clears it.
    pub fn color_by(&mut self, attribute: &str) {
        let attribute = Some(attribute).filter(|a| !a.is_empty());
        self.explorer.color_by(attribute);
    }

    pub fn point_count(&self) -> usize {
        self.explorer.dataset().len()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Switch by name (`click`, `box`, `polygon` or an alias). Returns
    /// `false` for an unknown name; the current mode is kept.
    pub fn set_mode(&mut self, name: &str) -> bool {
        match self.explorer.set_mode(name) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("set_mode: {e}");
                false
            }
        }
    }

    pub fn get_mode(&self) -> String {
        self.explorer.mode().to_string()
    }

    /// Selected ids as a JSON array, sorted.
    pub fn get_selected_ids(&self) -> String {
        ids_json(&self.explorer.selected_ids())
    }

    /// Replace the selection with ids from a JSON string array. Unknown ids
    /// are ignored.
    pub fn select_ids(&mut self, json: &str) -> bool {
        match parse_ids(json) {
            Ok(ids) => self.explorer.select_ids(ids),
            Err(e) => {
                log::warn!("select_ids: {e}");
                false
            }
        }
    }

    pub fn deselect_ids(&mut self, json: &str) -> bool {
        match parse_ids(json) {
            Ok(ids) => self.explorer.deselect(ids),
            Err(e) => {
                log::warn!("deselect_ids: {e}");
                false
            }
        }
    }

    pub fn clear_selection(&mut self) -> bool {
        self.explorer.clear_selection()
    }

    pub fn cancel(&mut self) -> bool {
        self.explorer.cancel()
    }

    /// Close the lasso in progress. `false` with fewer than 3 vertices.
    pub fn finish_polygon(&mut self) -> bool {
        self.explorer.finish_polygon()
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn handle_pointer_down(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.explorer.pointer_down(x, y, modifiers(shift, ctrl, alt, meta))
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.explorer.pointer_move(x, y, modifiers(shift, ctrl, alt, meta))
    }

    pub fn handle_pointer_up(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.explorer.pointer_up(x, y, modifiers(shift, ctrl, alt, meta))
    }

    pub fn handle_double_click(&mut self, x: f64, y: f64) -> bool {
        self.explorer.double_click(x, y)
    }

    pub fn handle_pointer_leave(&mut self) {
        self.explorer.pointer_leave();
    }

    /// Handle a keydown. Returns JSON:
    /// `{"changed":bool,"action":"...","mode":"..."}`.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        let action = self.explorer.key(key, modifiers(shift, ctrl, alt, meta));
        let changed = action.is_some() && self.explorer.needs_redraw();
        key_result_json(action, changed, &self.explorer.mode().to_string())
    }

    /// Handle a keyup. Releasing space ends the pan gesture.
    pub fn handle_key_up(&mut self, key: &str) {
        if key == " " {
            self.explorer.end_pan();
        }
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) -> bool {
        self.explorer.zoom_in()
    }

    pub fn zoom_out(&mut self) -> bool {
        self.explorer.zoom_out()
    }

    pub fn reset_view(&mut self) -> bool {
        self.explorer.reset_view()
    }

    pub fn get_zoom(&self) -> f64 {
        self.explorer.viewport().zoom()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.explorer.resize(width, height);
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        if self.dark_mode == dark {
            return;
        }
        self.dark_mode = dark;
        if let Some(renderer) = &mut self.renderer {
            renderer.set_theme(theme(dark));
        }
        self.explorer.invalidate_chrome();
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Draw a frame unconditionally (call from `requestAnimationFrame`).
    pub fn render(&mut self, ctx: &CanvasRenderingContext2d) -> bool {
        self.attach(ctx);
        match &mut self.renderer {
            Some(renderer) => self.explorer.render_tick(renderer),
            None => false,
        }
    }

    /// Draw only if state changed since the last frame.
    pub fn render_if_needed(&mut self, ctx: &CanvasRenderingContext2d) -> bool {
        self.attach(ctx);
        match &mut self.renderer {
            Some(renderer) => self.explorer.render_if_needed(renderer),
            None => false,
        }
    }

    pub fn needs_redraw(&self) -> bool {
        self.explorer.needs_redraw()
    }
}

impl ExplorerCanvas {
    fn build(width: f64, height: f64, config: ExplorerConfig) -> Self {
        console_error_panic_hook_setup();

        let mut explorer = Explorer::create(ExplorerConfig {
            canvas_width: width,
            canvas_height: height,
            ..config
        });
        let on_change = ChangeCallback::default();

        let sink = on_change.clone();
        explorer.on_selection_changed(Box::new(move |ids| {
            emit(&sink, &selection_json(ids));
        }));
        let sink = on_change.clone();
        explorer.on_hover(Box::new(move |info| {
            emit(&sink, &hover_json(info));
        }));

        Self {
            explorer,
            renderer: None,
            on_change,
            dark_mode: false,
        }
    }

    /// Bind the renderer to `ctx`, replacing it if the page handed us a
    /// different context.
    fn attach(&mut self, ctx: &CanvasRenderingContext2d) {
        if self.renderer.as_ref().is_some_and(|r| r.context() == ctx) {
            return;
        }
        self.renderer = Some(Canvas2dRenderer::new(ctx.clone(), theme(self.dark_mode)));
        self.explorer.invalidate_chrome();
    }

    pub fn explorer(&self) -> &Explorer {
        &self.explorer
    }
}

fn theme(dark: bool) -> CanvasTheme {
    if dark { CanvasTheme::dark() } else { CanvasTheme::light() }
}

fn modifiers(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers { shift, ctrl, alt, meta }
}

fn emit(callback: &ChangeCallback, payload: &str) {
    // Cloned so the handler may replace itself.
    let handler = callback.borrow().clone();
    if let Some(f) = handler
        && let Err(e) = f.call1(&JsValue::NULL, &JsValue::from_str(payload))
    {
        log::warn!("change callback threw: {e:?}");
    }
}

fn parse_ids(json: &str) -> Result<Vec<PointId>, String> {
    let raw: Vec<String> = serde_json::from_str(json).map_err(|e| format!("invalid id list: {e}"))?;
    Ok(raw.iter().map(|s| PointId::intern(s)).collect())
}

fn ids_json(ids: &[PointId]) -> String {
    let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    json!(ids).to_string()
}

fn selection_json(ids: &[PointId]) -> String {
    let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    json!({ "type": "selection", "ids": ids }).to_string()
}

fn hover_json(info: Option<&HoverInfo>) -> String {
    let value = match info {
        Some(info) => json!({
            "type": "hover",
            "id": info.entity.to_string(),
            "x": info.anchor.x,
            "y": info.anchor.y,
        }),
        None => json!({ "type": "hover", "id": null }),
    };
    value.to_string()
}

fn key_result_json(action: Option<ShortcutAction>, changed: bool, mode: &str) -> String {
    let action = action.map_or("none", action_to_name);
    json!({ "changed": changed, "action": action, "mode": mode }).to_string()
}

fn action_to_name(action: ShortcutAction) -> &'static str {
    match action {
        ShortcutAction::Mode(mode) => match mode {
            emx_editor::SelectionMode::Click => "modeClick",
            emx_editor::SelectionMode::Box => "modeBox",
            emx_editor::SelectionMode::Polygon => "modePolygon",
        },
        ShortcutAction::Cancel => "cancel",
        ShortcutAction::Finish => "finish",
        ShortcutAction::ClearSelection => "clearSelection",
        ShortcutAction::ZoomIn => "zoomIn",
        ShortcutAction::ZoomOut => "zoomOut",
        ShortcutAction::ResetView => "resetView",
        ShortcutAction::PanStart => "panStart",
    }
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("EMX WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone validation (no canvas needed) ────────────────────────────

/// Validate a points JSON payload. Returns `{"ok":true,"count":n}` or
/// `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_points(json: &str) -> String {
    match emx_core::Dataset::from_json(json) {
        Ok(dataset) => json!({ "ok": true, "count": dataset.len() }).to_string(),
        Err(e) => json!({ "ok": false, "error": e }).to_string(),
    }
}

/// Validate a config payload the same way.
#[wasm_bindgen]
pub fn validate_config(json: &str) -> String {
    match ExplorerConfig::from_json(json) {
        Ok(_) => json!({ "ok": true }).to_string(),
        Err(e) => json!({ "ok": false, "error": e }).to_string(),
    }
}
