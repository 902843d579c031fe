/// Hostiles: small projectiles that fly across the view at the player.
///
/// Stored in an arena keyed by a monotonically increasing id. A hostile
/// that hits an exposed tile face or the player is marked; `sweep` removes
/// marked ones after the update pass, so nothing is removed mid-iteration.

use std::collections::BTreeMap;

use log::debug;

use crate::config::PhysicsConfig;
use crate::domain::animation::AnimKey;
use crate::domain::body::{Facing, KinematicBody};
use crate::domain::grid::TileGrid;

use super::event::GameEvent;
use super::player::Player;

pub const HOSTILE_SIZE: f32 = 0.1;
/// Spawn distance outside the viewport edge.
const SPAWN_MARGIN: f32 = 2.0;
/// How far past the grid a hostile may fly before it is dropped.
const ESCAPE_MARGIN: f32 = 4.0;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct HostileId(pub u64);

impl std::fmt::Display for HostileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Hostile {
    pub id: HostileId,
    pub body: KinematicBody,
    /// -1.0 travels left, +1.0 right.
    pub direction: f32,
    pub marked_for_deletion: bool,
    /// Left the grid heading outward; dropped silently by the sweep.
    pub escaped: bool,
}

impl Hostile {
    pub fn new(id: HostileId, x: f32, y: f32, direction: f32) -> Self {
        Hostile {
            id,
            body: KinematicBody::new(x, y, HOSTILE_SIZE, HOSTILE_SIZE),
            direction,
            marked_for_deletion: false,
            escaped: false,
        }
    }

    fn update(&mut self, dt: f32, grid: &TileGrid, player: &mut Player, cfg: &PhysicsConfig, events: &mut Vec<GameEvent>) {
        self.body.x += dt * self.direction * cfg.hostile_speed;
        self.body.update(dt, grid);

        if player.body.overlaps(&self.body.aabb()) {
            match player.anim() {
                AnimKey::Attack1 => {
                    self.direction = player.body.facing.sign();
                    events.push(GameEvent::Particles { x: self.body.x, y: self.body.y, count: 6, size_scale: 0.5 });
                    events.push(GameEvent::default_shake());
                    events.push(GameEvent::HostileDeflected { id: self.id });
                }
                AnimKey::GroundSlam => {
                    self.body.colliding = true;
                    events.push(GameEvent::default_shake());
                }
                _ => {
                    // Turn to face where it came from.
                    player.body.facing = if self.direction < 0.0 { Facing::Right } else { Facing::Left };
                    player.knockback(cfg);
                    self.body.colliding = true;
                    events.push(GameEvent::PlayerHit);
                }
            }
        }

        if self.body.colliding {
            self.marked_for_deletion = true;
            events.push(GameEvent::Particles { x: self.body.x, y: self.body.y, count: 5, size_scale: 0.3 });
        } else if self.is_off_grid(grid) {
            self.escaped = true;
        }
    }

    /// Past a grid edge and still moving away from it. A hostile that
    /// spawned outside the left edge and flies inward is kept.
    fn is_off_grid(&self, grid: &TileGrid) -> bool {
        let (w, h) = (grid.width() as f32, grid.height() as f32);
        let x = self.body.x;
        let y = self.body.y;
        (x < -ESCAPE_MARGIN && self.direction < 0.0)
            || (x > w + ESCAPE_MARGIN && self.direction > 0.0)
            || y < -ESCAPE_MARGIN
            || y > h + ESCAPE_MARGIN
    }
}

/// Horizontal extent of the visible area, in world units.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Viewport {
    pub start_x: f32,
    pub end_x: f32,
}

#[derive(Default)]
pub struct Hostiles {
    next_id: u64,
    items: BTreeMap<HostileId, Hostile>,
    spawn_timer: f32,
}

impl Hostiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, id: HostileId) -> Option<&Hostile> {
        self.items.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hostile> {
        self.items.values()
    }

    /// Place a hostile; returns its id.
    pub fn insert(&mut self, x: f32, y: f32, direction: f32) -> HostileId {
        let id = HostileId(self.next_id);
        self.next_id += 1;
        self.items.insert(id, Hostile::new(id, x, y, direction));
        id
    }

    /// Accumulate `dt`; once past the interval, spawn one hostile just
    /// outside the view, travelling into it.
    pub fn tick_spawn(
        &mut self,
        dt: f32,
        cfg: &PhysicsConfig,
        view: Viewport,
        player_y: f32,
        rng: &mut fastrand::Rng,
        events: &mut Vec<GameEvent>,
    ) {
        self.spawn_timer += dt;
        if self.spawn_timer <= cfg.spawn_interval {
            return;
        }
        self.spawn_timer = 0.0;

        let mut direction = if rng.bool() { -1.0 } else { 1.0 };
        if view.start_x <= 0.0 {
            direction = 1.0;
        }
        let x = if direction < 0.0 { view.end_x + SPAWN_MARGIN } else { view.start_x - SPAWN_MARGIN };
        let y = player_y + rng.i32(-2..=1) as f32;

        let id = self.insert(x, y, direction);
        debug!("hostile {id} spawned at ({x:.2}, {y:.2}) heading {direction}");
        events.push(GameEvent::HostileSpawned { id });
    }

    /// Move every hostile and handle player hits. Marks, never removes.
    pub fn update_all(
        &mut self,
        dt: f32,
        grid: &TileGrid,
        player: &mut Player,
        cfg: &PhysicsConfig,
        events: &mut Vec<GameEvent>,
    ) {
        for hostile in self.items.values_mut() {
            hostile.update(dt, grid, player, cfg, events);
        }
    }

    /// Drop marked and escaped hostiles. Only marked ones count as destroyed.
    pub fn sweep(&mut self, events: &mut Vec<GameEvent>) {
        self.items.retain(|&id, h| {
            if h.escaped {
                debug!("hostile {id} left the grid at x {:.2}", h.body.x);
                false
            } else if h.marked_for_deletion {
                debug!("hostile {id} destroyed");
                events.push(GameEvent::HostileDestroyed { id });
                false
            } else {
                true
            }
        });
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
