//! Pan/zoom transform between world and screen space.
//!
//! `screen = world * scale + offset`. The scale is always clamped to
//! `[min_scale, max_scale]`; every mutator goes through `clamp_scale`.

use crate::space::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f32,
    pub offset: ScreenVector,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: ScreenVector::zero(),
            min_scale: 0.1,
            max_scale: 4.0,
        }
    }
}

impl Viewport {
    pub fn new(min_scale: f32, max_scale: f32) -> Self {
        let mut vp = Self::default();
        vp.set_scale_bounds(min_scale, max_scale);
        vp
    }

    fn clamp_scale(&self, scale: f32) -> f32 {
        if !scale.is_finite() {
            return self.scale;
        }
        scale.clamp(self.min_scale, self.max_scale)
    }

    pub fn world_to_screen(&self, p: WorldPoint) -> ScreenPoint {
        ScreenPoint::new(p.x * self.scale + self.offset.x, p.y * self.scale + self.offset.y)
    }

    /// Pointer position → world position.
    pub fn screen_to_world(&self, p: ScreenPoint) -> WorldPoint {
        WorldPoint::new((p.x - self.offset.x) / self.scale, (p.y - self.offset.y) / self.scale)
    }

    pub fn screen_vector_to_world(&self, v: ScreenVector) -> WorldVector {
        WorldVector::new(v.x / self.scale, v.y / self.scale)
    }

    pub fn world_vector_to_screen(&self, v: WorldVector) -> ScreenVector {
        ScreenVector::new(v.x * self.scale, v.y * self.scale)
    }

    pub fn world_rect_to_screen(&self, r: &WorldRect) -> ScreenRect {
        ScreenRect::new(
            self.world_to_screen(r.origin),
            ScreenSize::new(r.size.width * self.scale, r.size.height * self.scale),
        )
    }

    pub fn screen_rect_to_world(&self, r: &ScreenRect) -> WorldRect {
        WorldRect::new(
            self.screen_to_world(r.origin),
            WorldSize::new(r.size.width / self.scale, r.size.height / self.scale),
        )
    }

    pub fn pan(&mut self, delta: ScreenVector) {
        self.offset += delta;
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = self.clamp_scale(scale);
    }

    /// Zoom to `new_scale` (clamped) while keeping `pivot` visually fixed.
    pub fn zoom_at(&mut self, pivot: ScreenPoint, new_scale: f32) {
        let anchor = self.screen_to_world(pivot);
        self.scale = self.clamp_scale(new_scale);
        self.offset = ScreenVector::new(pivot.x - anchor.x * self.scale, pivot.y - anchor.y * self.scale);
    }

    /// Replace the zoom bounds and re-clamp the current scale.
    pub fn set_scale_bounds(&mut self, min: f32, max: f32) {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.min_scale = lo.max(f32::EPSILON);
        self.max_scale = hi.max(self.min_scale);
        self.scale = self.scale.clamp(self.min_scale, self.max_scale);
    }

    /// Scale and offset that frame `bounds` inside a `screen` of the given
    /// size with `margin` pixels on every side, clamped to the zoom bounds.
    pub fn fit_rect(&self, bounds: &WorldRect, screen: ScreenSize, margin: f32) -> (f32, ScreenVector) {
        let avail_w = (screen.width - 2.0 * margin).max(1.0);
        let avail_h = (screen.height - 2.0 * margin).max(1.0);
        let w = bounds.size.width.max(1.0);
        let h = bounds.size.height.max(1.0);
        let scale = self.clamp_scale((avail_w / w).min(avail_h / h));
        let c = bounds.center();
        let offset = ScreenVector::new(screen.width / 2.0 - c.x * scale, screen.height / 2.0 - c.y * scale);
        (scale, offset)
    }
}

// ─── Animation ────────────────────────────────────────────────────────────

/// Ease-out cubic: fast start, gentle landing.
pub fn ease_out_cubic(p: f32) -> f32 {
    1.0 - (1.0 - p).powi(3)
}

/// An in-flight transition of scale and offset. Starting a new one simply
/// replaces the old value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportAnimation {
    from_scale: f32,
    from_offset: ScreenVector,
    to_scale: f32,
    to_offset: ScreenVector,
    start_ms: u64,
    duration_ms: u64,
}

impl ViewportAnimation {
    pub fn new(from: &Viewport, to_scale: f32, to_offset: ScreenVector, start_ms: u64, duration_ms: u64) -> Self {
        Self {
            from_scale: from.scale,
            from_offset: from.offset,
            to_scale: from.clamp_scale(to_scale),
            to_offset,
            start_ms,
            duration_ms,
        }
    }

    pub fn progress(&self, now_ms: u64) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.start_ms) as f32;
        (elapsed / self.duration_ms as f32).min(1.0)
    }

    /// Write the interpolated state into `viewport`. Returns `true` once
    /// progress has reached 1.
    pub fn sample(&self, viewport: &mut Viewport, now_ms: u64) -> bool {
        let p = self.progress(now_ms);
        let e = ease_out_cubic(p);
        viewport.set_scale(self.from_scale + (self.to_scale - self.from_scale) * e);
        viewport.offset = self.from_offset.lerp(self.to_offset, e);
        p >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn transform_roundtrip() {
        let vp = Viewport {
            scale: 2.0,
            offset: ScreenVector::new(10.0, -20.0),
            ..Default::default()
        };
        let s = vp.world_to_screen(WorldPoint::new(5.0, 5.0));
        assert_eq!(s, ScreenPoint::new(20.0, -10.0));
        assert_eq!(vp.screen_to_world(s), WorldPoint::new(5.0, 5.0));
    }

    #[test]
    fn zoom_keeps_pivot_fixed() {
        let mut vp = Viewport::default();
        vp.pan(ScreenVector::new(30.0, 40.0));
        let pivot = ScreenPoint::new(200.0, 100.0);
        let before = vp.screen_to_world(pivot);
        vp.zoom_at(pivot, 2.5);
        let after = vp.screen_to_world(pivot);
        assert!((before - after).length() < 1e-3);
        assert_eq!(vp.scale, 2.5);
    }

    #[test]
    fn scale_is_clamped() {
        let mut vp = Viewport::new(0.5, 2.0);
        vp.set_scale(10.0);
        assert_eq!(vp.scale, 2.0);
        vp.zoom_at(ScreenPoint::origin(), 0.01);
        assert_eq!(vp.scale, 0.5);
    }

    #[test]
    fn animation_eases_and_finishes() {
        let mut vp = Viewport::default();
        let anim = ViewportAnimation::new(&vp, 2.0, ScreenVector::new(100.0, 0.0), 1000, 200);

        assert!(!anim.sample(&mut vp, 1100));
        // ease_out_cubic(0.5) = 0.875
        assert!((vp.scale - 1.875).abs() < 1e-4);
        assert!((vp.offset.x - 87.5).abs() < 1e-3);

        assert!(anim.sample(&mut vp, 1300));
        assert_eq!(vp.scale, 2.0);
        assert_eq!(vp.offset, ScreenVector::new(100.0, 0.0));
    }

    #[test]
    fn fit_rect_centers_bounds() {
        let vp = Viewport::default();
        let (scale, offset) = vp.fit_rect(&world_rect(0.0, 0.0, 400.0, 200.0), ScreenSize::new(840.0, 640.0), 20.0);
        assert_eq!(scale, 2.0);
        let framed = Viewport { scale, offset, ..vp };
        assert_eq!(framed.world_to_screen(WorldPoint::new(200.0, 100.0)), ScreenPoint::new(420.0, 320.0));
    }
}
