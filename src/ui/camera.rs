/// Camera: eases toward the player and shakes on request.
///
/// Position is the centre of the view in world units. The follow target is
/// clamped so the view never shows past the level floor or left edge; the
/// right edge is open because the level keeps doubling as the player runs.

use crate::sim::hostile::Viewport;

/// Speed per unit of distance to the target, per second.
const FOLLOW_SPEED: f32 = 2.0;
/// Below this the camera counts as settled.
const SETTLE: f32 = 0.01;
/// A single axis stops easing below this distance.
const DEAD_ZONE: f32 = 0.1;

pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub view_w: f32,
    pub view_h: f32,
    shake_tick: f32,
    shake_magnitude: f32,
    rng: fastrand::Rng,
}

impl Camera {
    pub fn new(rng: fastrand::Rng) -> Self {
        Camera { x: 0.0, y: 0.0, view_w: 0.0, view_h: 0.0, shake_tick: 0.0, shake_magnitude: 0.0, rng }
    }

    pub fn resize(&mut self, view_w: f32, view_h: f32) {
        self.view_w = view_w.max(1.0);
        self.view_h = view_h.max(1.0);
    }

    fn clamp_target(&self, x: f32, y: f32, level_h: f32) -> (f32, f32) {
        (x.max(self.view_w / 2.0), y.min(level_h - self.view_h / 2.0))
    }

    /// Jump straight to the target (level start, restart).
    pub fn snap_to(&mut self, x: f32, y: f32, level_h: f32) {
        let (tx, ty) = self.clamp_target(x, y, level_h);
        self.x = tx;
        self.y = ty;
    }

    pub fn shake(&mut self, duration: f32, magnitude: f32) {
        self.shake_tick = duration;
        self.shake_magnitude = magnitude;
    }

    #[cfg(test)]
    pub fn is_shaking(&self) -> bool {
        self.shake_tick > 0.0
    }

    /// Ease toward the target. Both axes step by the same speed, scaled by
    /// the straight-line distance, and never overshoot. Shake only plays
    /// while the camera is moving.
    pub fn follow(&mut self, target_x: f32, target_y: f32, dt: f32, level_h: f32) {
        let (tx, ty) = self.clamp_target(target_x, target_y, level_h);
        let dx = tx - self.x;
        let dy = ty - self.y;
        if dx.abs() <= SETTLE && dy.abs() <= SETTLE {
            return;
        }

        let speed = dx.hypot(dy) * dt * FOLLOW_SPEED;
        if dx.abs() > DEAD_ZONE {
            self.x = step_toward(self.x, tx, speed);
        }
        if dy.abs() > DEAD_ZONE {
            self.y = step_toward(self.y, ty, speed);
        }

        if self.shake_tick > 0.0 {
            self.shake_tick -= dt;
            self.x += self.jitter();
            self.y += self.jitter();
        }
    }

    fn jitter(&mut self) -> f32 {
        (self.rng.f32() * 2.0 - 1.0) / 100.0 * self.shake_magnitude
    }

    /// Horizontal extent, for hostile spawning.
    pub fn viewport(&self) -> Viewport {
        Viewport { start_x: self.x - self.view_w / 2.0, end_x: self.x + self.view_w / 2.0 }
    }

    /// Visible rectangle `(x0, y0, x1, y1)`.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let (hw, hh) = (self.view_w / 2.0, self.view_h / 2.0);
        (self.x - hw, self.y - hh, self.x + hw, self.y + hh)
    }
}

/// Move `from` toward `to` by `speed`, stopping on the target.
fn step_toward(from: f32, to: f32, speed: f32) -> f32 {
    if from < to {
        (from + speed).min(to)
    } else {
        (from - speed).max(to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        let mut cam = Camera::new(fastrand::Rng::with_seed(3));
        cam.resize(20.0, 10.0);
        cam
    }

    #[test]
    fn snap_clamps_to_left_edge_and_floor() {
        let mut cam = camera();
        cam.snap_to(2.0, 27.0, 28.0);
        assert_eq!(cam.x, 10.0);
        assert_eq!(cam.y, 23.0);
        let (x0, _, _, y1) = cam.rect();
        assert_eq!(x0, 0.0);
        assert_eq!(y1, 28.0);
    }

    #[test]
    fn follow_eases_proportionally() {
        let mut cam = camera();
        cam.snap_to(10.0, 10.0, 100.0);
        cam.follow(20.0, 10.0, 0.1, 100.0);
        assert!((cam.x - 12.0).abs() < 1e-5);
        assert_eq!(cam.y, 10.0);
    }

    #[test]
    fn both_axes_step_by_straight_line_speed() {
        let mut cam = camera();
        cam.snap_to(10.0, 10.0, 100.0);
        // Distance 5: each axis moves 5 * 0.1 * 2 = 1.
        cam.follow(13.0, 14.0, 0.1, 100.0);
        assert!((cam.x - 11.0).abs() < 1e-5);
        assert!((cam.y - 11.0).abs() < 1e-5);
    }

    #[test]
    fn follow_never_overshoots() {
        let mut cam = camera();
        cam.snap_to(10.0, 10.0, 100.0);
        cam.follow(14.0, 10.5, 1.0, 100.0);
        assert_eq!(cam.x, 14.0);
        assert_eq!(cam.y, 10.5);
    }

    #[test]
    fn small_offsets_are_ignored() {
        let mut cam = camera();
        cam.snap_to(10.0, 10.0, 100.0);
        cam.follow(10.05, 10.005, 0.1, 100.0);
        assert_eq!(cam.x, 10.0);
        assert_eq!(cam.y, 10.0);
    }

    #[test]
    fn shake_runs_out_while_moving() {
        let mut cam = camera();
        cam.snap_to(10.0, 10.0, 100.0);
        cam.shake(0.3, 1.0);
        assert!(cam.is_shaking());
        for _ in 0..4 {
            cam.follow(30.0, 10.0, 0.1, 100.0);
        }
        assert!(!cam.is_shaking());
    }

    #[test]
    fn shake_waits_for_movement() {
        let mut cam = camera();
        cam.snap_to(10.0, 10.0, 100.0);
        cam.shake(0.3, 1.0);
        cam.follow(10.0, 10.0, 0.1, 100.0);
        assert!(cam.is_shaking());
        assert_eq!(cam.x, 10.0);
    }

    #[test]
    fn viewport_spans_view_width() {
        let mut cam = camera();
        cam.snap_to(30.0, 5.0, 100.0);
        let v = cam.viewport();
        assert_eq!(v.start_x, 20.0);
        assert_eq!(v.end_x, 40.0);
    }
}
