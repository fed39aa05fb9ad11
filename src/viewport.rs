/// Interactive viewport state for the poster canvas
///
/// Pan offset and zoom scale for the displayed poster, driven by wheel and
/// pointer input. The state is explicit and owned here; the canvas widget
/// only translates iced events into calls on this struct.
///
/// Lifecycle: reset whenever the displayed poster changes identity, mutated
/// only by the handlers below while that poster stays on screen.

use cgmath::Vector2;

/// Zoom bounds. `scale` never leaves this range.
pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 4.0;

/// Scale change per pixel of wheel travel.
pub const WHEEL_SENSITIVITY: f32 = 0.001;

/// Pan gesture state. A gesture starts on pointer-down over the poster and
/// ends on pointer-up or when the pointer leaves the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PanGesture {
    Idle,
    /// `anchor` is pointer position minus offset at gesture start; keeping
    /// it fixed while the pointer moves produces the drag.
    Panning { anchor: Vector2<f32> },
}

/// Pan/zoom transform applied to the displayed poster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Zoom level (1.0 = 100%), clamped to [MIN_SCALE, MAX_SCALE]
    pub scale: f32,
    /// Pan offset in canvas pixels. Unclamped: the poster may be dragged
    /// arbitrarily far off-view.
    pub offset: Vector2<f32>,
    gesture: PanGesture,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vector2::new(0.0, 0.0),
            gesture: PanGesture::Idle,
        }
    }
}

impl Viewport {
    /// Back to `{scale: 1, offset: (0, 0)}`, gesture cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply a wheel event. `delta_y` is positive when scrolling down
    /// (zoom out); `cursor` is the pointer position relative to the canvas
    /// origin. The point under the cursor stays visually fixed.
    pub fn wheel_zoom(&mut self, delta_y: f32, cursor: Vector2<f32>) {
        let new_scale = (self.scale - delta_y * WHEEL_SENSITIVITY).clamp(MIN_SCALE, MAX_SCALE);

        // Solve for the offset that keeps `cursor` over the same image
        // point, independently per axis.
        self.offset = cursor - (cursor - self.offset) * (new_scale / self.scale);
        self.scale = new_scale;
    }

    /// Pointer-down on the poster: begin panning.
    pub fn begin_pan(&mut self, pointer: Vector2<f32>) {
        self.gesture = PanGesture::Panning {
            anchor: pointer - self.offset,
        };
    }

    /// Pointer-move: follow the pointer while a gesture is active,
    /// otherwise do nothing.
    pub fn pan_to(&mut self, pointer: Vector2<f32>) {
        if let PanGesture::Panning { anchor } = self.gesture {
            self.offset = pointer - anchor;
        }
    }

    /// Pointer-up or pointer-leave: end the gesture. Scale and offset keep
    /// their current values.
    pub fn end_pan(&mut self) {
        self.gesture = PanGesture::Idle;
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, PanGesture::Panning { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec2(x: f32, y: f32) -> Vector2<f32> {
        Vector2::new(x, y)
    }

    #[test]
    fn test_scale_stays_clamped_under_extreme_deltas() {
        let mut viewport = Viewport::default();
        let cursor = vec2(100.0, 100.0);

        for delta in [-100_000.0, -0.5, 0.0, 3.0, 100_000.0, f32::MAX / 1e6] {
            viewport.wheel_zoom(delta, cursor);
            assert!(
                (MIN_SCALE..=MAX_SCALE).contains(&viewport.scale),
                "scale {} escaped bounds after delta {}",
                viewport.scale,
                delta
            );
        }
    }

    #[test]
    fn test_zoom_keeps_cursor_point_fixed() {
        let mut viewport = Viewport::default();
        viewport.offset = vec2(30.0, -12.0);
        viewport.scale = 1.5;
        let cursor = vec2(220.0, 140.0);

        // Image-space point currently under the cursor.
        let before = (cursor - viewport.offset) / viewport.scale;
        viewport.wheel_zoom(-400.0, cursor);
        let after = (cursor - viewport.offset) / viewport.scale;

        assert!((before.x - after.x).abs() < 1e-3);
        assert!((before.y - after.y).abs() < 1e-3);
        assert!(viewport.scale > 1.5);
    }

    #[test]
    fn test_pan_gesture_tracks_pointer() {
        let mut viewport = Viewport::default();
        viewport.begin_pan(vec2(50.0, 60.0));
        assert!(viewport.is_panning());

        viewport.pan_to(vec2(80.0, 45.0));
        assert_eq!(viewport.offset, vec2(30.0, -15.0));

        viewport.pan_to(vec2(10.0, 10.0));
        assert_eq!(viewport.offset, vec2(-40.0, -50.0));

        viewport.end_pan();
        assert!(!viewport.is_panning());

        // Moves after the gesture ended change nothing.
        viewport.pan_to(vec2(500.0, 500.0));
        assert_eq!(viewport.offset, vec2(-40.0, -50.0));
    }

    #[test]
    fn test_offset_is_never_clamped() {
        let mut viewport = Viewport::default();
        viewport.begin_pan(vec2(0.0, 0.0));
        viewport.pan_to(vec2(1e6, -1e6));
        assert_eq!(viewport.offset, vec2(1e6, -1e6));
    }

    #[test]
    fn test_reset_restores_identity_transform() {
        let mut viewport = Viewport::default();
        viewport.begin_pan(vec2(5.0, 5.0));
        viewport.pan_to(vec2(400.0, 300.0));
        viewport.wheel_zoom(-2000.0, vec2(10.0, 10.0));

        viewport.reset();
        assert_eq!(viewport.scale, 1.0);
        assert_eq!(viewport.offset, vec2(0.0, 0.0));
        assert!(!viewport.is_panning());
    }

    #[test]
    fn test_zoom_at_lower_clamp_keeps_offset_stable() {
        let mut viewport = Viewport::default();
        let cursor = vec2(64.0, 64.0);
        viewport.wheel_zoom(10_000.0, cursor);
        assert_eq!(viewport.scale, MIN_SCALE);
        let offset = viewport.offset;

        // Already at the floor: another zoom-out must not drift the view.
        viewport.wheel_zoom(10_000.0, cursor);
        assert_eq!(viewport.scale, MIN_SCALE);
        assert_eq!(viewport.offset, offset);
    }
}
