/// Kinematic body: an axis-aligned box moving through the tile grid.
///
/// ## Velocity decay
///
/// Velocity here is an impulse, not a steady speed. Each tick a nonzero
/// component `v` is spent:
///
/// ```text
///   step = clamp(max(|v| * 4 * dt, dt / 2), 0, |v|)
///   |v' | = |v| - step
///   pos  += sign(v) * step
/// ```
///
/// so knockback and slide recoil fade out smoothly instead of stopping dead.
/// Walking does not go through here: the controller moves `x` directly.
///
/// One `update` = integrate, then resolve against the grid
/// (see `collision.rs`).

use std::collections::{BTreeMap, BTreeSet};

use super::collision::{self, WallContact};
use super::grid::{SideMask, TileGrid};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// -1 for Left, +1 for Right.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Plain rectangle (top-left + extents).
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Aabb { x, y, w, h }
    }

    /// Unit tile at grid coordinates.
    pub fn tile(x: i32, y: i32) -> Self {
        Aabb { x: x as f32, y: y as f32, w: 1.0, h: 1.0 }
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Strict overlap: touching edges do not count.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

#[derive(Clone, Debug)]
pub struct KinematicBody {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub on_ground: bool,
    pub ledge_hanging: bool,
    pub facing: Facing,
    pub crouching: bool,
    /// Any masked tile face touched during the last update.
    pub colliding: bool,
    /// Cell index → faces touched during the last update.
    pub contact_tiles: BTreeMap<usize, SideMask>,
}

impl KinematicBody {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        KinematicBody {
            x, y, w, h,
            velocity_x: 0.0,
            velocity_y: 0.0,
            on_ground: false,
            ledge_hanging: false,
            facing: Facing::Left,
            crouching: false,
            colliding: false,
            contact_tiles: BTreeMap::new(),
        }
    }

    // ── Edges ──

    #[cfg(test)]
    #[inline] pub fn left(&self) -> f32 { self.x }
    #[cfg(test)]
    #[inline] pub fn right(&self) -> f32 { self.x + self.w }
    #[inline] pub fn top(&self) -> f32 { self.y }
    #[inline] pub fn bottom(&self) -> f32 { self.y + self.h }

    #[cfg(test)]
    #[inline] pub fn set_right(&mut self, right: f32) { self.x = right - self.w; }
    #[inline] pub fn set_top(&mut self, top: f32) { self.y = top; }
    #[inline] pub fn set_bottom(&mut self, bottom: f32) { self.y = bottom - self.h; }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        self.aabb().center()
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.w, self.h)
    }

    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.aabb().overlaps(other)
    }

    /// Spend velocity on both axes for `dt` seconds.
    pub fn integrate(&mut self, dt: f32) {
        let (vx, dx) = decay(self.velocity_x, dt);
        self.velocity_x = vx;
        self.x += dx;

        let (vy, dy) = decay(self.velocity_y, dt);
        self.velocity_y = vy;
        self.y += dy;
    }

    /// Blocked cells near the box, sampled on a 0.4-unit lattice one cell
    /// beyond each edge. Oversampling keeps thin or fast bodies from
    /// slipping through single-cell gaps; the set dedupes.
    pub fn candidate_cells(&self, grid: &TileGrid) -> BTreeSet<usize> {
        const STEP: f32 = 0.4;
        let x0 = self.x.floor() - 1.0;
        let x1 = (self.x + self.w).floor() + 1.0;
        let y0 = self.y.floor() - 1.0;
        let y1 = (self.y + self.h).floor() + 1.0;

        let nx = ((x1 - x0) / STEP + 1e-3).floor() as i32;
        let ny = ((y1 - y0) / STEP + 1e-3).floor() as i32;

        let mut cells = BTreeSet::new();
        for i in 0..=nx {
            let cx = (x0 + i as f32 * STEP).floor() as i32;
            for j in 0..=ny {
                let cy = (y0 + j as f32 * STEP).floor() as i32;
                if grid.is_blocked(cx, cy) {
                    if let Some(index) = grid.index(cx, cy) {
                        cells.insert(index);
                    }
                }
            }
        }
        cells
    }

    /// Integrate velocity, then resolve against the grid.
    /// Returns the wall contact that was applied this tick, if any.
    pub fn update(&mut self, dt: f32, grid: &TileGrid) -> Option<WallContact> {
        self.integrate(dt);
        collision::resolve(self, grid)
    }
}

/// One axis of the decay model. Returns (new velocity, displacement).
fn decay(v: f32, dt: f32) -> (f32, f32) {
    if v == 0.0 || dt <= 0.0 {
        return (v, 0.0);
    }
    let magnitude = v.abs();
    let step = (magnitude * 4.0 * dt).max(dt / 2.0).min(magnitude);
    let remaining = (magnitude - step).max(0.0);
    (remaining.copysign(v), step.copysign(v))
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
