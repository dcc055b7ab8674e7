//! Engine configuration.
//!
//! The host persists this surface (grid, snapping, shake, gravity, zoom
//! bounds) and hands it back on startup. Missing JSON fields fall back to
//! the defaults below, so older settings files keep loading.

use crate::space::WorldSize;
use serde::{Deserialize, Serialize};

// ─── Config ───────────────────────────────────────────────────────────────

/// Tunables for snapping, physics, gestures and the viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grid pitch in world units. Default: **20**.
    pub grid_size: f32,
    /// Round moved/resized geometry to the grid. Default: **false**.
    pub snap_to_grid: bool,
    /// Align to other nodes' edges and centers. Default: **true**.
    pub snap_to_objects: bool,
    /// Object snap distance in world units (strict `<`). Default: **5**.
    pub snap_threshold: f32,
    /// Direction reversals a drag must exceed to count as a shake. Default: **4**.
    pub shake_sensitivity: u32,
    /// Edge gravity coefficient; `0` disables sag entirely. Default: **20**.
    pub edge_gravity: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Gap between a node handle and the curve's visible end. Default: **10**.
    pub edge_padding: f32,
    /// Fixed end padding used by multi-point splines. Default: **10**.
    pub spline_padding: f32,
    /// Delay before a press on empty canvas becomes a rectangle selection.
    pub select_debounce_ms: u64,
    /// Minimum interval between shake samples.
    pub shake_sample_ms: u64,
    /// Handle hit radius in screen pixels.
    pub handle_radius: f32,
    /// Width of the resize border in screen pixels.
    pub resize_margin: f32,
    /// Pointer distance (screen pixels) that still counts as touching an edge.
    pub edge_hit_tolerance: f32,
    /// World distance between a dropped node's center and an edge that splits it.
    pub edge_split_tolerance: f32,
    /// World offset applied per successive paste.
    pub paste_offset: f32,
    /// Size of nodes created by double-clicking the canvas.
    pub default_node_size: WorldSize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            snap_to_grid: false,
            snap_to_objects: true,
            snap_threshold: 5.0,
            shake_sensitivity: 4,
            edge_gravity: 20.0,
            min_zoom: 0.1,
            max_zoom: 4.0,
            edge_padding: 10.0,
            spline_padding: 10.0,
            select_debounce_ms: 150,
            shake_sample_ms: 50,
            handle_radius: 10.0,
            resize_margin: 6.0,
            edge_hit_tolerance: 8.0,
            edge_split_tolerance: 20.0,
            paste_offset: 20.0,
            default_node_size: WorldSize::new(200.0, 100.0),
        }
    }
}

impl EngineConfig {
    /// Parse a persisted settings document.
    ///
    /// # Errors
    /// Returns the `serde_json` error if the text is not a valid settings object.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config.normalized())
    }

    /// Serialize for persistence by the host.
    pub fn to_json(&self) -> String {
        // Plain struct of numbers and bools: serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Clamp out-of-range values instead of rejecting the whole document.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            self.grid_size = defaults.grid_size;
        }
        if !(self.snap_threshold.is_finite() && self.snap_threshold >= 0.0) {
            self.snap_threshold = defaults.snap_threshold;
        }
        if !(self.edge_gravity.is_finite() && self.edge_gravity >= 0.0) {
            self.edge_gravity = defaults.edge_gravity;
        }
        if !(self.min_zoom.is_finite() && self.min_zoom > 0.0) {
            self.min_zoom = defaults.min_zoom;
        }
        if !(self.max_zoom.is_finite() && self.max_zoom > 0.0) {
            self.max_zoom = defaults.max_zoom;
        }
        if self.min_zoom > self.max_zoom {
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }
        self.edge_padding = self.edge_padding.max(0.0);
        self.spline_padding = self.spline_padding.max(0.0);
        self
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn json_roundtrip_keeps_values() {
        let config = EngineConfig {
            snap_to_grid: true,
            grid_size: 25.0,
            edge_gravity: 0.0,
            ..Default::default()
        };
        let parsed = EngineConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let parsed = EngineConfig::from_json(r#"{ "snap_threshold": 8.0 }"#).unwrap();
        assert_eq!(parsed.snap_threshold, 8.0);
        assert_eq!(parsed.grid_size, 20.0);
        assert_eq!(parsed.select_debounce_ms, 150);
    }

    #[test]
    fn inverted_zoom_bounds_are_swapped() {
        let parsed = EngineConfig::from_json(r#"{ "min_zoom": 5.0, "max_zoom": 0.5 }"#).unwrap();
        assert_eq!((parsed.min_zoom, parsed.max_zoom), (0.5, 5.0));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(EngineConfig::from_json("{ grid_size: }").is_err());
    }
}
