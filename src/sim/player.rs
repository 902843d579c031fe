/// Player: kinematic body + animation state + movement bookkeeping.
///
/// ## Update order (per tick)
///
///   1. Wall-clock cooldowns (slide lockout, delayed knockback recoil)
///   2. Body update: decay integration, grid resolution
///   3. Ledge grab / release
///   4. Gravity (skipped while grounded or hanging)
///   5. Slide friction
///   6. Landing (first grounded tick on a new row)
///   7. Clamp to level bounds
///
/// Animation advances separately, at render time (`advance_animation`).
///
/// ## Hitbox resizing
///
/// States may override the hitbox size. A switch keeps the bottom-centre
/// of the box fixed, so crouching shrinks toward the floor and standing
/// up grows away from it.

use std::time::Duration;

use log::trace;

use crate::config::PhysicsConfig;
use crate::domain::animation::{AnimKey, AnimationSet, AnimationState, Animator};
use crate::domain::body::{Facing, KinematicBody};
use crate::domain::collision::{self, WallContact};
use crate::domain::grid::TileGrid;
use crate::domain::timer::{Countdown, Tick};

use super::event::GameEvent;
use super::present::SpriteDraw;

pub const DEFAULT_SIZE: (f32, f32) = (0.55, 0.95);

/// Sprite box scale relative to the default hitbox.
const SPRITE_SCALE: f32 = 4.3;
const SPRITE_ASPECT: f32 = 0.875;

pub struct Player {
    pub body: KinematicBody,
    pub default_size: (f32, f32),
    anims: AnimationSet,
    animator: Animator,
    pub running: bool,
    pub double_jumped: bool,
    gravity: f32,
    friction: u32,
    last_land_y: Option<i32>,
    slide_cooldown: Countdown,
    knockback_recoil: Countdown,
}

impl Player {
    pub fn new(x: f32, y: f32, anims: AnimationSet) -> Self {
        let (w, h) = DEFAULT_SIZE;
        Player {
            body: KinematicBody::new(x, y, w, h),
            default_size: DEFAULT_SIZE,
            anims,
            animator: Animator::new(AnimKey::Idle),
            running: false,
            double_jumped: false,
            gravity: 0.0,
            friction: 0,
            last_land_y: None,
            slide_cooldown: Countdown::default(),
            knockback_recoil: Countdown::default(),
        }
    }

    // ── Queries ──

    #[inline]
    pub fn anim(&self) -> AnimKey {
        self.animator.key
    }

    #[inline]
    pub fn state(&self) -> &AnimationState {
        self.anims.get(self.animator.key)
    }

    /// Movement, jump and attack are ignored while this holds.
    #[inline]
    pub fn controller_locked(&self) -> bool {
        self.state().disables_controller
    }

    #[cfg(test)]
    pub fn slide_ready(&self) -> bool {
        !self.slide_cooldown.is_running()
    }

    // ── State changes ──

    /// Enter `key`: reset elapsed time, apply the size override, and
    /// release a held crouch unless the new state is a crouched one.
    pub fn set_animation(&mut self, key: AnimKey) {
        if !key.is_crouched() {
            self.set_crouch(false);
        }

        let (old_w, old_h) = (self.body.w, self.body.h);
        let (new_w, new_h) = self.anims.get(key).size.unwrap_or(self.default_size);
        self.body.w = new_w;
        self.body.h = new_h;
        self.body.x += (old_w - new_w) / 2.0;
        self.body.y += old_h - new_h;

        self.animator.switch(key);
    }

    pub fn set_crouch(&mut self, value: bool) {
        if !self.body.crouching && value {
            self.set_animation(AnimKey::Crouch);
            self.body.crouching = true;
        } else if self.body.crouching && !value {
            self.body.crouching = false;
            self.set_animation(AnimKey::Idle);
        }
    }

    /// Ground jump, or a roll as the one air jump. Hanging re-arms it.
    pub fn jump(&mut self, cfg: &PhysicsConfig, events: &mut Vec<GameEvent>) {
        if self.double_jumped && !self.body.ledge_hanging {
            return;
        }
        self.gravity = 0.0;
        self.body.velocity_x = 0.0;
        self.last_land_y = None;

        events.push(self.dust(4));

        if !self.body.on_ground {
            self.set_animation(AnimKey::Roll);
            self.body.ledge_hanging = false;
            self.double_jumped = true;
            self.body.velocity_y = -cfg.double_jump_velocity;
            events.push(GameEvent::Jumped { double: true });
        } else {
            self.set_animation(AnimKey::Jump);
            self.body.velocity_y = -cfg.jump_velocity;
            events.push(GameEvent::Jumped { double: false });
        }
    }

    /// Start a slide unless the cooldown from the last one is still running.
    pub fn slide(&mut self, cfg: &PhysicsConfig, events: &mut Vec<GameEvent>) {
        if self.slide_cooldown.is_running() {
            return;
        }
        self.slide_cooldown.start(Duration::from_millis(cfg.slide_cooldown_ms));
        self.set_animation(AnimKey::Slide);
        events.push(GameEvent::Slid);
    }

    /// Stagger; a small recoil away from facing follows after a delay.
    pub fn knockback(&mut self, cfg: &PhysicsConfig) {
        self.set_animation(AnimKey::Knockback);
        self.knockback_recoil.start(Duration::from_millis(cfg.knockback_delay_ms));
    }

    pub fn attack(&mut self, events: &mut Vec<GameEvent>) {
        events.push(GameEvent::CameraShake { duration: 0.15, magnitude: 0.8 });
        self.set_animation(AnimKey::Attack1);
        events.push(GameEvent::Attacked);
    }

    pub fn ground_slam(&mut self) {
        self.set_animation(AnimKey::GroundSlam);
    }

    // ── Tick ──

    pub fn update(&mut self, tick: Tick, grid: &TileGrid, cfg: &PhysicsConfig, events: &mut Vec<GameEvent>) {
        let dt = tick.dt;

        self.slide_cooldown.tick(tick.wall);
        if self.knockback_recoil.tick(tick.wall) {
            self.body.velocity_x = cfg.knockback_recoil * -self.body.facing.sign();
        }

        let was_on_ground = self.body.on_ground;
        let wall = self.body.update(dt, grid);
        self.apply_ledge(wall, grid);

        // Gravity
        if !self.body.on_ground && !self.body.ledge_hanging {
            self.gravity += dt;
            self.body.y += (self.gravity / 5.0).min(dt * 10.0);
        } else {
            self.gravity = 0.0;
        }

        // Slide friction
        if self.anim().is_slide() {
            let speed = (3.0 - 0.07 * self.friction as f32).max(0.0).sqrt();
            self.body.velocity_x = speed * self.body.facing.sign();
            self.friction += 1;
        } else {
            self.friction = 0;
        }

        // Landing
        if self.body.on_ground {
            self.double_jumped = false;
            if !was_on_ground {
                self.land(events);
            }
        }

        // Level bounds
        let max_x = (grid.width() as f32 - self.body.w).max(0.0);
        let max_y = (grid.height() as f32 - self.body.h).max(0.0);
        self.body.x = self.body.x.clamp(0.0, max_x);
        self.body.y = self.body.y.clamp(0.0, max_y);
    }

    fn apply_ledge(&mut self, wall: Option<WallContact>, grid: &TileGrid) {
        match wall {
            Some(contact) => {
                if collision::ledge_grip(&self.body, &contact, grid, self.anim().ignores_ledges()) {
                    self.body.ledge_hanging = true;
                    if !matches!(self.anim(), AnimKey::LedgeHang | AnimKey::WallJump) {
                        trace!("ledge grab at ({}, {})", contact.tile_x, contact.tile_y);
                        self.set_animation(AnimKey::LedgeHang);
                    }
                }
            }
            None => {
                if self.body.ledge_hanging {
                    self.body.ledge_hanging = false;
                    self.set_animation(AnimKey::Fall);
                }
            }
        }
    }

    fn land(&mut self, events: &mut Vec<GameEvent>) {
        let row = self.body.y.floor() as i32;
        if self.last_land_y == Some(row) {
            return;
        }
        self.last_land_y = Some(row);

        events.push(self.dust(5));
        if self.body.velocity_y < 0.0 {
            self.body.velocity_y = 0.0;
        }

        if matches!(self.anim(), AnimKey::GroundSlam | AnimKey::Knockback) {
            events.push(GameEvent::CameraShake { duration: 0.1, magnitude: 4.0 });
        } else {
            self.set_animation(AnimKey::Land);
            events.push(GameEvent::Landed);
        }
    }

    /// Dust at the feet.
    fn dust(&self, count: u32) -> GameEvent {
        let (cx, _) = self.body.center();
        GameEvent::Particles { x: cx, y: self.body.bottom() - 0.1, count, size_scale: 0.3 }
    }

    // ── Render-time animation ──

    /// Advance the animation clock by `dt`, return this frame's sprite, then
    /// run the completion / locomotion / air-ground triggers.
    pub fn advance_animation(&mut self, dt: f32, rng: &mut fastrand::Rng, look_up_chance: f32) -> SpriteDraw {
        let (frame, done) = self.animator.advance(&self.anims, dt);
        let draw = self.sprite_draw(frame);

        if done {
            let next = self.anims.completion_target(self.anim(), rng, look_up_chance);
            self.set_animation(next);
        }
        if let Some(next) = self.anims.locomotion_target(self.anim(), self.running) {
            self.set_animation(next);
        }
        if let Some(next) = self.anims.air_target(self.anim(), self.body.on_ground, self.body.ledge_hanging) {
            self.set_animation(next);
        }

        draw
    }

    /// Sprite box for `frame` of the current state. Sized from the default
    /// hitbox so it doesn't jump when a state resizes the body.
    pub fn sprite_draw(&self, frame: u16) -> SpriteDraw {
        let state = self.state();
        let (dw, dh) = self.default_size;
        let w = dw * dh * SPRITE_SCALE;
        SpriteDraw {
            sprite: state.sprite,
            frame,
            x: self.body.x - dw * 1.55 + state.offset_x.for_facing(self.body.facing),
            y: self.body.y - dh * 1.05 + state.offset_y,
            w,
            h: w * SPRITE_ASPECT,
            flip: self.body.facing == Facing::Left,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
