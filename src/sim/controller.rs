/// Player controller: maps logical input onto the player each tick.
///
/// ## Rules
///   - Horizontal: moves `x` directly when exactly one of left/right is held
///     and the current state doesn't lock the controller. Speed is the
///     ground or air speed, divided down for walk and crouch.
///   - Down: descends while hanging, slides (or keeps crouching) while
///     moving on the ground, crouches while standing.
///   - Jump, attack, knockback, info toggle: edge-triggered. Presses are
///     always consumed, even while locked, so nothing fires late.
///   - Level wrap once the player passes `width / wrap_divisor`.

use crate::domain::animation::AnimKey;
use crate::domain::body::Facing;
use crate::domain::timer::Tick;

use super::event::GameEvent;
use super::input::{Action, InputSource};
use super::world::World;

pub struct PlayerController<I: InputSource> {
    input: I,
}

impl<I: InputSource> PlayerController<I> {
    pub fn new(input: I) -> Self {
        PlayerController { input }
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn update(&mut self, world: &mut World, tick: Tick, events: &mut Vec<GameEvent>) {
        let dt = tick.dt;
        let cfg = &world.physics;
        let player = &mut world.player;
        let locked = player.controller_locked();

        // ── Horizontal ──
        let mut speed = (if player.body.on_ground { cfg.ground_speed } else { cfg.air_speed }) * dt;
        if self.input.is_down(Action::Walk) {
            speed /= cfg.walk_divisor;
        }
        if player.body.crouching {
            speed /= cfg.crouch_divisor;
        }

        let left = self.input.is_down(Action::Left);
        let right = self.input.is_down(Action::Right);
        let moving = (left ^ right) && !locked;
        if moving {
            if left {
                player.body.x -= speed;
                player.body.facing = Facing::Left;
            } else {
                player.body.x += speed;
                player.body.facing = Facing::Right;
            }
        }
        player.running = moving;

        // ── Down ──
        let mut crouch = false;
        if self.input.is_down(Action::Down) {
            if player.body.ledge_hanging {
                player.body.y += dt;
            } else if player.body.on_ground {
                if moving {
                    if player.body.crouching {
                        crouch = true;
                    } else {
                        player.slide(cfg, events);
                    }
                } else {
                    crouch = matches!(player.anim(), AnimKey::Crouch | AnimKey::Crawl) || player.state().idle;
                }
            }
        }
        player.set_crouch(crouch);

        // ── Edge-triggered ──
        let jump = self.input.is_pressed(Action::Jump);
        let attack = self.input.is_pressed(Action::Attack);
        let knockback = self.input.is_pressed(Action::Knockback);
        let toggle_info = self.input.is_pressed(Action::ToggleInfo);

        if jump && !player.controller_locked() {
            player.jump(cfg, events);
        }
        if !player.controller_locked() {
            if attack {
                if player.body.on_ground {
                    player.attack(events);
                } else {
                    player.ground_slam();
                }
            }
            if knockback {
                player.knockback(cfg);
            }
            if toggle_info {
                world.show_info = !world.show_info;
            }
        }

        // ── Level wrap ──
        if world.wrap_due() {
            world.wrap_level(events);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::domain::grid::TileGrid;
    use crate::sim::input::ScriptedInput;
    use crate::sim::level::LevelDef;

    const DT: f32 = 1.0 / 60.0;

    /// Wide flat level: floor on the last row, player grounded on it.
    fn setup() -> (World, PlayerController<ScriptedInput>) {
        let (w, h) = (200, 6);
        let mut cells = vec![0; w * h];
        for x in 0..w {
            cells[(h - 1) * w + x] = 5;
        }
        let def = LevelDef {
            name: "flat".into(),
            cells,
            width: w,
            height: h,
            spawn: Some((10.0, 5.0 - 0.95 + 0.01)),
        };
        let mut world = World::new(&def, PhysicsConfig::default()).unwrap();
        let mut events = vec![];
        world.player.update(Tick::fixed(DT), &world.grid, &world.physics, &mut events);
        world.player.set_animation(AnimKey::Idle);
        assert!(world.player.body.on_ground);
        (world, PlayerController::new(ScriptedInput::new()))
    }

    fn step(world: &mut World, ctl: &mut PlayerController<ScriptedInput>) -> Vec<GameEvent> {
        let mut events = vec![];
        ctl.update(world, Tick::fixed(DT), &mut events);
        events
    }

    #[test]
    fn right_moves_at_ground_speed() {
        let (mut world, mut ctl) = setup();
        ctl.input_mut().hold(Action::Right);
        let x = world.player.body.x;
        step(&mut world, &mut ctl);
        assert!((world.player.body.x - (x + 6.0 * DT)).abs() < 1e-5);
        assert_eq!(world.player.body.facing, Facing::Right);
        assert!(world.player.running);
    }

    #[test]
    fn walk_divides_speed() {
        let (mut world, mut ctl) = setup();
        ctl.input_mut().hold(Action::Left);
        ctl.input_mut().hold(Action::Walk);
        let x = world.player.body.x;
        step(&mut world, &mut ctl);
        assert!((world.player.body.x - (x - 6.0 * DT / 5.0)).abs() < 1e-5);
        assert_eq!(world.player.body.facing, Facing::Left);
    }

    #[test]
    fn both_directions_cancel() {
        let (mut world, mut ctl) = setup();
        ctl.input_mut().hold(Action::Left);
        ctl.input_mut().hold(Action::Right);
        let x = world.player.body.x;
        step(&mut world, &mut ctl);
        assert_eq!(world.player.body.x, x);
        assert!(!world.player.running);
    }

    #[test]
    fn locked_state_blocks_movement_and_jump() {
        let (mut world, mut ctl) = setup();
        world.player.attack(&mut vec![]);
        ctl.input_mut().hold(Action::Right);
        ctl.input_mut().press(Action::Jump);
        let x = world.player.body.x;
        let events = step(&mut world, &mut ctl);
        assert_eq!(world.player.body.x, x);
        assert_eq!(world.player.anim(), AnimKey::Attack1);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Jumped { .. })));
        // The press was consumed, not deferred.
        assert!(!ctl.input_mut().is_pressed(Action::Jump));
    }

    #[test]
    fn jump_press_jumps_once() {
        let (mut world, mut ctl) = setup();
        ctl.input_mut().press(Action::Jump);
        let events = step(&mut world, &mut ctl);
        assert!(events.contains(&GameEvent::Jumped { double: false }));
        assert_eq!(world.player.anim(), AnimKey::Jump);
        let events = step(&mut world, &mut ctl);
        assert!(events.is_empty());
    }

    #[test]
    fn down_while_still_crouches() {
        let (mut world, mut ctl) = setup();
        ctl.input_mut().hold(Action::Down);
        step(&mut world, &mut ctl);
        assert_eq!(world.player.anim(), AnimKey::Crouch);
        assert!(world.player.body.crouching);
        step(&mut world, &mut ctl);
        assert!(world.player.body.crouching);

        ctl.input_mut().release(Action::Down);
        step(&mut world, &mut ctl);
        assert!(!world.player.body.crouching);
        assert_eq!(world.player.anim(), AnimKey::Idle);
    }

    #[test]
    fn crouched_movement_is_slow() {
        let (mut world, mut ctl) = setup();
        ctl.input_mut().hold(Action::Down);
        step(&mut world, &mut ctl);
        ctl.input_mut().hold(Action::Right);
        let x = world.player.body.x;
        step(&mut world, &mut ctl);
        assert!((world.player.body.x - (x + 6.0 * DT / 5.0)).abs() < 1e-5);
        assert!(world.player.body.crouching);
    }

    #[test]
    fn down_while_moving_slides() {
        let (mut world, mut ctl) = setup();
        ctl.input_mut().hold(Action::Right);
        ctl.input_mut().hold(Action::Down);
        let events = step(&mut world, &mut ctl);
        assert!(events.contains(&GameEvent::Slid));
        assert_eq!(world.player.anim(), AnimKey::Slide);
        assert!(!world.player.slide_ready());
    }

    #[test]
    fn down_while_hanging_descends() {
        let (mut world, mut ctl) = setup();
        world.player.body.on_ground = false;
        world.player.body.ledge_hanging = true;
        ctl.input_mut().hold(Action::Down);
        let y = world.player.body.y;
        step(&mut world, &mut ctl);
        assert!((world.player.body.y - (y + DT)).abs() < 1e-6);
    }

    #[test]
    fn attack_on_ground_and_slam_in_air() {
        let (mut world, mut ctl) = setup();
        ctl.input_mut().press(Action::Attack);
        let events = step(&mut world, &mut ctl);
        assert_eq!(world.player.anim(), AnimKey::Attack1);
        assert!(events.contains(&GameEvent::Attacked));

        let (mut world, mut ctl) = setup();
        world.player.body.on_ground = false;
        ctl.input_mut().press(Action::Attack);
        step(&mut world, &mut ctl);
        assert_eq!(world.player.anim(), AnimKey::GroundSlam);
    }

    #[test]
    fn info_toggle_flips_overlay() {
        let (mut world, mut ctl) = setup();
        ctl.input_mut().press(Action::ToggleInfo);
        step(&mut world, &mut ctl);
        assert!(world.show_info);
        ctl.input_mut().press(Action::ToggleInfo);
        step(&mut world, &mut ctl);
        assert!(!world.show_info);
    }

    #[test]
    fn walking_past_fifth_wraps_level() {
        let (mut world, mut ctl) = setup();
        world.player.body.x = 41.0;
        let events = step(&mut world, &mut ctl);
        assert_eq!(world.grid.width(), 400);
        assert!(events.contains(&GameEvent::LevelWrapped { width: 400 }));
        let grid: &TileGrid = &world.grid;
        assert!(grid.is_blocked(399, 5));
    }
}
