//! Explorer configuration.
//!
//! One struct carries every tunable constant of the visualization core.
//! Hosts either use `ExplorerConfig::default()` or supply JSON where any
//! missing field falls back to its default.

use serde::Deserialize;

/// Name of a selection mode as the host spells it. Parsed by the editor
/// layer; kept as a string here so the core has no editor dependency.
pub const DEFAULT_MODE: &str = "click";

/// Configuration for an explorer surface.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExplorerConfig {
    /// Canvas size in pixels. Default: **500 × 500**.
    pub canvas_width: f64,
    pub canvas_height: f64,

    /// Padding on every side of the canonical plot region, as a fraction of
    /// the canvas extent. Default: **0.1**.
    pub padding_fraction: f64,

    /// Zoom clamp. Default: **[0.2, 5.0]**.
    pub zoom_min: f64,
    pub zoom_max: f64,

    /// Multiplicative zoom-in / zoom-out step. Default: **1.2**.
    pub zoom_step: f64,

    /// Clustering grid cell edge in data units. Default: **50**.
    pub cluster_grid_size: f64,

    /// Clustering only kicks in at or below this zoom. Default: **0.5**.
    pub cluster_zoom_threshold: f64,

    /// Clustering only kicks in at or above this many points. Default: **100**.
    pub cluster_min_points: usize,

    /// Base point radius in pixels. Default: **4**.
    pub point_radius: f64,

    /// Pick radius in screen pixels. Default: **point_radius + 5**.
    pub hit_tolerance: f64,

    /// Clicking this close to the first lasso vertex closes the polygon.
    /// Default: **15 px**.
    pub polygon_close_radius: f64,

    /// Entities further than this outside the canvas are not drawn.
    /// Default: **2 × point_radius**.
    pub cull_margin: f64,

    /// Initial selection mode (`"click"`, `"box"`, `"polygon"`).
    pub default_mode: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        let point_radius = 4.0;
        Self {
            canvas_width: 500.0,
            canvas_height: 500.0,
            padding_fraction: 0.1,
            zoom_min: 0.2,
            zoom_max: 5.0,
            zoom_step: 1.2,
            cluster_grid_size: 50.0,
            cluster_zoom_threshold: 0.5,
            cluster_min_points: 100,
            point_radius,
            hit_tolerance: point_radius + 5.0,
            polygon_close_radius: 15.0,
            cull_margin: point_radius * 2.0,
            default_mode: DEFAULT_MODE.to_string(),
        }
    }
}

impl ExplorerConfig {
    /// Parse a host-supplied JSON config. Missing fields take defaults.
    ///
    /// # Errors
    /// Returns the serde error text if the JSON is malformed or a field has
    /// the wrong type.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str::<Self>(json)
            .map(Self::validated)
            .map_err(|e| format!("invalid explorer config: {e}"))
    }

    /// Normalize out-of-range values instead of rejecting them: inverted
    /// zoom bounds are swapped, non-positive sizes fall back to defaults.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if self.zoom_min > self.zoom_max {
            std::mem::swap(&mut self.zoom_min, &mut self.zoom_max);
        }
        if self.zoom_min <= 0.0 {
            self.zoom_min = defaults.zoom_min.min(self.zoom_max);
        }
        if self.zoom_step <= 1.0 {
            log::warn!("zoom step {} ignored, using {}", self.zoom_step, defaults.zoom_step);
            self.zoom_step = defaults.zoom_step;
        }
        if self.canvas_width <= 0.0 || self.canvas_height <= 0.0 {
            self.canvas_width = defaults.canvas_width;
            self.canvas_height = defaults.canvas_height;
        }
        if self.cluster_grid_size <= 0.0 {
            self.cluster_grid_size = defaults.cluster_grid_size;
        }
        self.padding_fraction = self.padding_fraction.clamp(0.0, 0.45);
        self.point_radius = self.point_radius.max(0.5);
        self.hit_tolerance = self.hit_tolerance.max(0.0);
        self.cull_margin = self.cull_margin.max(0.0);
        self
    }
}
