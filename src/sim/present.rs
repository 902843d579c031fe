/// Core → renderer boundary.
///
/// The core supplies geometry in world units; the renderer decides how
/// a sprite name or a shade actually looks. Nothing here knows about
/// terminals or image files.

use crate::domain::body::KinematicBody;
use crate::domain::grid::{SideMask, TileGrid};

/// Nominal width/height ratio of a player sprite box.
pub const NOMINAL_ASPECT: f32 = 1.0 / 0.875;

/// One sprite frame placed in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteDraw {
    pub sprite: &'static str,
    pub frame: u16,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// Mirror horizontally (sheets face right).
    pub flip: bool,
}

impl SpriteDraw {
    /// Does the box deviate from the sheet's nominal aspect (to 2 decimals)?
    pub fn aspect_mismatch(&self) -> bool {
        if self.h <= 0.0 {
            return true;
        }
        let round = |v: f32| (v * 100.0).round() as i64;
        round(self.w / self.h) != round(NOMINAL_ASPECT)
    }
}

/// Flat-colour roles for rectangles.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Shade {
    /// Player hitbox while grounded (debug).
    BodyGrounded,
    /// Player hitbox while airborne (debug).
    BodyAirborne,
    Hostile,
    /// Exposed tile face (debug).
    MaskEdge,
    /// Face touched this tick (debug).
    Contact,
}

pub trait Canvas {
    fn draw_sprite(&mut self, sprite: &SpriteDraw);
    fn draw_rect(&mut self, x: f32, y: f32, w: f32, h: f32, shade: Shade);
}

// ── Debug overlay ──

const EDGE: f32 = 0.025;
const CONTACT_EDGE: f32 = 0.05;

/// Thin rectangles on one tile's faces.
fn draw_faces(canvas: &mut impl Canvas, x: f32, y: f32, mask: SideMask, width: f32, shade: Shade) {
    if mask.contains(SideMask::LEFT) {
        canvas.draw_rect(x, y, width, 1.0, shade);
    }
    if mask.contains(SideMask::RIGHT) {
        canvas.draw_rect(x + 1.0 - width, y, width, 1.0, shade);
    }
    if mask.contains(SideMask::TOP) {
        canvas.draw_rect(x, y, 1.0, width, shade);
    }
    if mask.contains(SideMask::BOTTOM) {
        canvas.draw_rect(x, y + 1.0 - width, 1.0, width, shade);
    }
}

/// Exposed faces inside `[x0, x1) × [y0, y1)`, then the body's contacts.
pub fn draw_collision_overlay(
    canvas: &mut impl Canvas,
    grid: &TileGrid,
    body: &KinematicBody,
    view: (f32, f32, f32, f32),
) {
    let (x0, y0, x1, y1) = view;
    for i in 0..grid.cells().len() {
        let mask = grid.side_mask(i);
        if mask.is_empty() {
            continue;
        }
        let (x, y) = grid.coords(i);
        let (fx, fy) = (x as f32, y as f32);
        if fx + 1.0 > x0 && fy + 1.0 > y0 && fx <= x1 && fy <= y1 {
            draw_faces(canvas, fx, fy, mask, EDGE, Shade::MaskEdge);
        }
    }
    for (&index, &mask) in &body.contact_tiles {
        let (x, y) = grid.coords(index);
        draw_faces(canvas, x as f32, y as f32, mask, CONTACT_EDGE, Shade::Contact);
    }
}
