/// Collision resolution: body vs. tile grid.
///
/// ## Side classification
///
/// For an overlapping body/tile pair the dominant side is picked with a
/// cross-product test on centre deltas:
///
/// ```text
///   dx, dy = body centre - tile centre
///   hw, hh = half combined extents
///   cw = hw * dy,  ch = hh * dx
///
///   cw >  ch:  cw > -ch ? Bottom : Left
///   cw <= ch:  cw > -ch ? Right  : Top
/// ```
///
/// The side names the tile face the body hit: `Top` means the body is
/// standing on the tile, `Left` means the body pushes against its left face.
///
/// ## Top override
///
/// A standing body that walks into a step would classify `Top` against the
/// step's corner. Unless crouching, the body's bottom 0.1 sliver is tested
/// again; if the sliver isn't `Top` too, the hit becomes a wall hit.
///
/// ## Mask gate
///
/// Corrections only happen through exposed faces (see `grid.rs`). A hit on
/// a buried face is ignored, which is what lets a body slide along a flat
/// floor made of many tiles without snagging on the seams.

use super::body::{Aabb, Facing, KinematicBody};
use super::grid::{SideMask, TileGrid};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    #[inline]
    pub fn mask(self) -> SideMask {
        match self {
            Side::Left => SideMask::LEFT,
            Side::Right => SideMask::RIGHT,
            Side::Top => SideMask::TOP,
            Side::Bottom => SideMask::BOTTOM,
        }
    }
}

/// A horizontal correction that was applied this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct WallContact {
    pub side: Side,
    pub tile_x: i32,
    pub tile_y: i32,
}

impl WallContact {
    /// Facing that pushes into this wall.
    pub fn facing_into(&self) -> Facing {
        match self.side {
            Side::Left => Facing::Right,
            _ => Facing::Left,
        }
    }
}

/// Dominant side of `tile` hit by `body`, or None if the centres are
/// further apart than the combined half extents.
pub fn overlap_side(body: &Aabb, tile: &Aabb) -> Option<Side> {
    let (bx, by) = body.center();
    let (tx, ty) = tile.center();
    let dx = bx - tx;
    let dy = by - ty;
    let hw = (body.w + tile.w) / 2.0;
    let hh = (body.h + tile.h) / 2.0;

    if dx.abs() > hw || dy.abs() > hh {
        return None;
    }

    let cw = hw * dy;
    let ch = hh * dx;
    let side = if cw > ch {
        if cw > -ch { Side::Bottom } else { Side::Left }
    } else if cw > -ch {
        Side::Right
    } else {
        Side::Top
    };
    Some(side)
}

/// Classify one hit, applying the top override.
fn classify(body: &KinematicBody, tile: &Aabb) -> Option<Side> {
    let side = overlap_side(&body.aabb(), tile)?;
    if side != Side::Top || body.crouching {
        return Some(side);
    }
    let sliver = Aabb::new(body.x, body.bottom() - 0.1, body.w, 0.1);
    if overlap_side(&sliver, tile) == Some(Side::Top) {
        Some(Side::Top)
    } else if body.x < tile.x {
        Some(Side::Left)
    } else {
        Some(Side::Right)
    }
}

/// Resolve `body` against every nearby blocked tile.
///
/// Vertical corrections apply immediately. Horizontal ones are deferred:
/// only the last candidate survives, and it is dropped if it sits on a row
/// the body is standing on (a seam in the floor, not a wall).
///
/// Resets and refills `on_ground`, `colliding`, `contact_tiles`.
pub fn resolve(body: &mut KinematicBody, grid: &TileGrid) -> Option<WallContact> {
    body.on_ground = false;
    body.colliding = false;
    body.contact_tiles.clear();

    let mut ground_rows: Vec<i32> = Vec::new();
    let mut wall: Option<(f32, WallContact)> = None;

    for index in body.candidate_cells(grid) {
        let (tx, ty) = grid.coords(index);
        let tile = Aabb::tile(tx, ty);
        if !body.overlaps(&tile) {
            continue;
        }
        let Some(side) = classify(body, &tile) else { continue };
        if !grid.side_mask(index).contains(side.mask()) {
            continue;
        }

        body.colliding = true;
        match side {
            Side::Top => {
                body.on_ground = true;
                ground_rows.push(ty);
                if body.bottom() > tile.y {
                    body.set_bottom(tile.y + 0.01);
                }
            }
            Side::Bottom => {
                if body.top() < tile.y + 1.0 {
                    body.set_top(tile.y + 1.0);
                }
            }
            Side::Left => {
                wall = Some((tile.x - body.w, WallContact { side, tile_x: tx, tile_y: ty }));
            }
            Side::Right => {
                wall = Some((tile.x + tile.w, WallContact { side, tile_x: tx, tile_y: ty }));
            }
        }
        body.contact_tiles.insert(index, side.mask());
    }

    let (x, contact) = wall?;
    if ground_rows.contains(&contact.tile_y) {
        return None;
    }
    body.x = x;
    Some(contact)
}

/// Can `body` hang from the ledge it just hit?
///
/// Airborne, facing the wall, open cell above the blocking tile, and
/// either near the top of its own cell or with solid ground under the
/// blocking tile. `ignores_ledges` covers states that pass under ledges
/// (crawling, rolling).
pub fn ledge_grip(
    body: &KinematicBody,
    wall: &WallContact,
    grid: &TileGrid,
    ignores_ledges: bool,
) -> bool {
    !body.on_ground
        && !ignores_ledges
        && body.facing == wall.facing_into()
        && grid.is_open(wall.tile_x, wall.tile_y - 1)
        && (body.y - body.y.floor() < 0.3 || grid.is_blocked(wall.tile_x, wall.tile_y + 1))
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
