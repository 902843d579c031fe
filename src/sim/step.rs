/// The step functions: advance the world by one tick, then draw it.
///
/// `update` processing order:
///   1. Hostile spawn timer
///   2. Player controller (input → movement, actions, level wrap)
///   3. Hostile movement and hits, then the sweep
///   4. Player body: integration, collision, ledge, gravity, landing
///
/// `render` advances the animation clock. The animation runs at render
/// time, so a state can finish between two updates.
///
/// A tick with `dt <= 0` is a no-op. Larger deltas are clamped to
/// `max_delta` before use; wall-clock cooldowns still see the real time.

use log::warn;

use crate::domain::timer::Tick;

use super::controller::PlayerController;
use super::event::GameEvent;
use super::hostile::Viewport;
use super::input::InputSource;
use super::present::{self, Canvas, Shade};
use super::world::World;

// ══════════════════════════════════════════════════════════════
// Update
// ══════════════════════════════════════════════════════════════

pub fn update<I: InputSource>(
    world: &mut World,
    controller: &mut PlayerController<I>,
    tick: Tick,
    view: Viewport,
) -> Vec<GameEvent> {
    // Also rejects NaN.
    if !(tick.dt > 0.0) {
        return vec![];
    }
    let tick = Tick { dt: tick.dt.min(world.physics.max_delta), wall: tick.wall };
    let dt = tick.dt;

    let mut events: Vec<GameEvent> = Vec::new();

    let player_y = world.player.body.y;
    world.hostiles.tick_spawn(dt, &world.physics, view, player_y, &mut world.rng, &mut events);

    controller.update(world, tick, &mut events);

    world.hostiles.update_all(dt, &world.grid, &mut world.player, &world.physics, &mut events);
    world.hostiles.sweep(&mut events);

    world.player.update(tick, &world.grid, &world.physics, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Render
// ══════════════════════════════════════════════════════════════

/// Draw the world. `view` is the visible rectangle `(x0, y0, x1, y1)`,
/// used to cull the debug overlay.
pub fn render(world: &mut World, dt: f32, canvas: &mut impl Canvas, view: (f32, f32, f32, f32)) {
    let body = &world.player.body;
    if world.show_info {
        let shade = if body.on_ground { Shade::BodyGrounded } else { Shade::BodyAirborne };
        canvas.draw_rect(body.x, body.y, body.w, body.h, shade);
    }

    let draw = world.player.advance_animation(dt.max(0.0), &mut world.rng, world.physics.look_up_chance);
    if draw.aspect_mismatch() {
        warn!(
            "sprite {} frame {} drawn at {:.2}x{:.2}, off the sheet's aspect",
            draw.sprite, draw.frame, draw.w, draw.h
        );
    }
    canvas.draw_sprite(&draw);

    for h in world.hostiles.iter() {
        canvas.draw_rect(h.body.x, h.body.y, h.body.w, h.body.h, Shade::Hostile);
    }

    if world.show_info {
        present::draw_collision_overlay(canvas, &world.grid, &world.player.body, view);
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::domain::animation::AnimKey;
    use crate::domain::body::Facing;
    use crate::sim::input::{Action, ScriptedInput};
    use crate::sim::level::{self, LevelDef};
    use crate::sim::present::testing::RecordingCanvas;

    const DT: f32 = 1.0 / 60.0;
    const VIEW: Viewport = Viewport { start_x: 0.0, end_x: 16.0 };

    fn grid_level(rows: &[&str], spawn: (f32, f32)) -> LevelDef {
        let cells = rows
            .iter()
            .flat_map(|r| r.chars().map(|c| if c == '#' { 5 } else { 0 }))
            .collect();
        LevelDef {
            name: "test".into(),
            cells,
            width: rows[0].len(),
            height: rows.len(),
            spawn: Some(spawn),
        }
    }

    fn seeded() -> PhysicsConfig {
        PhysicsConfig { seed: Some(11), wrap_divisor: 1.0, ..PhysicsConfig::default() }
    }

    fn world_on_floor() -> (World, PlayerController<ScriptedInput>) {
        let def = grid_level(
            &[
                "                    ",
                "                    ",
                "                    ",
                "                    ",
                "####################",
            ],
            (8.0, 4.0 - 0.95 + 0.01),
        );
        let world = World::new(&def, seeded()).unwrap();
        (world, PlayerController::new(ScriptedInput::new()))
    }

    #[test]
    fn zero_tick_changes_nothing() {
        let (mut world, mut ctl) = world_on_floor();
        world.player.body.velocity_x = -2.0;
        ctl.input_mut().hold(Action::Right);
        let before = world.player.body.clone();
        let anim = world.player.anim();
        let events = update(&mut world, &mut ctl, Tick::fixed(0.0), VIEW);
        assert!(events.is_empty());
        assert_eq!(world.player.body.x, before.x);
        assert_eq!(world.player.body.y, before.y);
        assert_eq!(world.player.body.velocity_x, before.velocity_x);
        assert_eq!(world.player.anim(), anim);
        assert!(world.hostiles.is_empty());
    }

    #[test]
    fn nan_tick_is_ignored() {
        let (mut world, mut ctl) = world_on_floor();
        let x = world.player.body.x;
        assert!(update(&mut world, &mut ctl, Tick::fixed(f32::NAN), VIEW).is_empty());
        assert_eq!(world.player.body.x, x);
    }

    #[test]
    fn body_rests_on_floor_for_ten_ticks() {
        let (mut world, mut ctl) = world_on_floor();
        update(&mut world, &mut ctl, Tick::fixed(DT), VIEW);
        let y = world.player.body.y;
        for _ in 0..10 {
            update(&mut world, &mut ctl, Tick::fixed(DT), VIEW);
            assert!(world.player.body.on_ground);
            assert!((world.player.body.y - y).abs() < 1e-5);
        }
    }

    #[test]
    fn long_stall_is_clamped() {
        let (mut world, mut ctl) = world_on_floor();
        update(&mut world, &mut ctl, Tick::fixed(DT), VIEW);
        ctl.input_mut().hold(Action::Right);
        let x = world.player.body.x;
        update(&mut world, &mut ctl, Tick::fixed(3.0), VIEW);
        // Moved by ground_speed * max_delta, not * 3s.
        assert!((world.player.body.x - (x + 6.0 * 0.25)).abs() < 1e-4);
    }

    #[test]
    fn hostile_spawns_after_interval() {
        let (mut world, mut ctl) = world_on_floor();
        let mut spawned = 0;
        for _ in 0..130 {
            let events = update(&mut world, &mut ctl, Tick::fixed(DT), VIEW);
            spawned += events.iter().filter(|e| matches!(e, GameEvent::HostileSpawned { .. })).count();
        }
        // 130 ticks ≈ 2.17s: exactly one spawn, from the left edge.
        assert_eq!(spawned, 1);
    }

    #[test]
    fn hostile_hit_knocks_back_in_same_step() {
        let (mut world, mut ctl) = world_on_floor();
        update(&mut world, &mut ctl, Tick::fixed(DT), VIEW);
        let (px, py) = world.player.body.center();
        world.hostiles.insert(px + 0.1, py, -1.0);
        let events = update(&mut world, &mut ctl, Tick::fixed(DT), VIEW);
        assert!(events.contains(&GameEvent::PlayerHit));
        assert!(events.iter().any(|e| matches!(e, GameEvent::HostileDestroyed { .. })));
        assert!(world.hostiles.is_empty());
        assert_eq!(world.player.anim(), AnimKey::Knockback);
        assert_eq!(world.player.body.facing, Facing::Right);
    }

    #[test]
    fn airborne_body_grabs_ledge_instead_of_falling() {
        let def = grid_level(
            &[
                "      ",
                "      ",
                "   ###",
                "   ###",
                "   ###",
                "######",
            ],
            (2.5, 2.02),
        );
        let mut world = World::new(&def, seeded()).unwrap();
        world.player.body.facing = Facing::Right;
        world.player.set_animation(AnimKey::Fall);
        let mut ctl = PlayerController::new(ScriptedInput::new());
        update(&mut world, &mut ctl, Tick::fixed(DT), Viewport { start_x: 0.0, end_x: 6.0 });
        assert!(world.player.body.ledge_hanging);
        assert_eq!(world.player.anim(), AnimKey::LedgeHang);
    }

    #[test]
    fn spent_air_jump_is_a_no_op() {
        let (mut world, _) = world_on_floor();
        world.player.body.y = 1.0;
        world.player.body.on_ground = false;
        world.player.double_jumped = true;
        world.player.set_animation(AnimKey::Roll);
        world.player.body.velocity_y = -0.5;
        let mut events = vec![];
        world.player.jump(&world.physics, &mut events);
        assert!(events.is_empty());
        assert_eq!(world.player.body.velocity_y, -0.5);
        assert_eq!(world.player.anim(), AnimKey::Roll);
    }

    #[test]
    fn wrap_doubles_level_in_step() {
        let (mut world, mut ctl) = world_on_floor();
        // wrap_divisor 1: wraps once x passes the full width.
        world.player.body.x = 20.5;
        let events = update(&mut world, &mut ctl, Tick::fixed(DT), VIEW);
        assert!(events.contains(&GameEvent::LevelWrapped { width: 40 }));
        assert_eq!(world.grid.width(), 40);
    }

    // ── Render ──

    #[test]
    fn render_draws_sprite_and_hostiles() {
        let (mut world, _) = world_on_floor();
        world.hostiles.insert(3.0, 3.0, 1.0);
        let mut canvas = RecordingCanvas::default();
        render(&mut world, DT, &mut canvas, (0.0, 0.0, 16.0, 5.0));
        assert_eq!(canvas.sprites.len(), 1);
        assert_eq!(canvas.sprites[0].sprite, "player_idle");
        assert_eq!(canvas.rects.len(), 1);
        assert_eq!(canvas.rects[0].4, Shade::Hostile);
    }

    #[test]
    fn info_overlay_adds_hitbox_and_mask() {
        let (mut world, mut ctl) = world_on_floor();
        update(&mut world, &mut ctl, Tick::fixed(DT), VIEW);
        world.show_info = true;
        let mut canvas = RecordingCanvas::default();
        render(&mut world, DT, &mut canvas, (0.0, 0.0, 16.0, 5.0));
        assert_eq!(canvas.rects[0].4, Shade::BodyGrounded);
        assert!(canvas.rects.iter().any(|r| r.4 == Shade::MaskEdge));
        assert!(canvas.rects.iter().any(|r| r.4 == Shade::Contact));
    }

    #[test]
    fn builtin_level_runs_for_a_while() {
        let def = level::builtin().unwrap();
        let mut world = World::new(&def, seeded()).unwrap();
        let mut ctl = PlayerController::new(ScriptedInput::new());
        let mut canvas = RecordingCanvas::default();
        for i in 0..600 {
            if i % 90 == 0 {
                ctl.input_mut().press(Action::Jump);
            }
            update(&mut world, &mut ctl, Tick::fixed(DT), VIEW);
            render(&mut world, DT, &mut canvas, (0.0, 13.0, 16.0, 21.0));
            let b = &world.player.body;
            assert!(b.x.is_finite() && b.y.is_finite());
            assert!(b.y >= 0.0 && b.bottom() <= world.grid.height() as f32 + 1e-4);
        }
    }
}
