/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant};

use log::{error, info, warn};

use config::GameConfig;
use domain::timer::Tick;
use sim::controller::PlayerController;
use sim::event::GameEvent;
use sim::level::{self, LevelDef};
use sim::step;
use sim::world::World;
use ui::camera::Camera;
use ui::gamepad::GamepadState;
use ui::input::Controls;
use ui::particles::Particles;
use ui::renderer::{Hud, Renderer};
use ui::sound::SoundEngine;

fn main() {
    let config = GameConfig::load();
    init_logging(&config);
    for w in &config.warnings {
        warn!("{w}");
    }

    let (def, world) = match level::load(&config).and_then(|def| {
        let world = World::new(&def, config.physics.clone())?;
        Ok((def, world))
    }) {
        Ok(pair) => pair,
        Err(e) => {
            error!("{e}");
            eprintln!("ledgerunner: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        std::process::exit(1);
    }

    let sound = SoundEngine::new();
    if sound.is_none() {
        info!("no audio output, sound disabled");
    }

    let result = game_loop(&def, world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!("{e}");
        eprintln!("ledgerunner: {e}");
        std::process::exit(1);
    }
}

/// The terminal belongs to the renderer, so logs go to a file.
fn init_logging(config: &GameConfig) {
    let env = env_logger::Env::default().default_filter_or(config.general.log_level.as_str());
    let mut builder = env_logger::Builder::from_env(env);
    match File::create(&config.general.log_file) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("cannot open log file {}: {e}", config.general.log_file.display());
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn game_loop(
    def: &LevelDef,
    mut world: World,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut gamepad = GamepadState::new();
    gamepad.load_button_config(&config.gamepad);
    let mut controller = PlayerController::new(Controls::new(gamepad));

    let mut camera = Camera::new(fastrand::Rng::new());
    let mut particles = Particles::new(fastrand::Rng::new());
    reset_view(&mut camera, renderer, &world);

    let frame_sleep = Duration::from_millis(config.general.frame_ms);
    let mut last_frame = Instant::now();

    loop {
        controller.input_mut().poll();
        if controller.input().quit_requested() {
            break;
        }
        if controller.input().restart_requested() {
            info!("restarting {}", def.name);
            world = World::new(def, config.physics.clone())?;
            controller.input_mut().clear();
            particles.clear();
            reset_view(&mut camera, renderer, &world);
            last_frame = Instant::now();
        }

        let elapsed = last_frame.elapsed();
        last_frame = Instant::now();
        let tick = Tick { dt: elapsed.as_secs_f32().min(world.physics.max_delta), wall: elapsed };

        let events = step::update(&mut world, &mut controller, tick, camera.viewport());
        process_events(&events, &mut camera, &mut particles, sound);

        let (cx, cy) = world.player.body.center();
        camera.follow(cx, cy, tick.dt, world.grid.height() as f32);
        particles.update(tick.dt);

        renderer.begin_frame(&mut camera)?;
        renderer.draw_tiles(&world.grid);
        step::render(&mut world, tick.dt, renderer, camera.rect());
        renderer.draw_particles(&particles);
        renderer.draw_hud(&Hud {
            level: &world.level_name,
            state: world.player.anim().as_str(),
            hostiles: world.hostiles.len(),
            show_info: world.show_info,
        });
        renderer.end_frame()?;

        std::thread::sleep(frame_sleep);
    }

    Ok(())
}

fn reset_view(camera: &mut Camera, renderer: &Renderer, world: &World) {
    let (vw, vh) = renderer.view_size();
    camera.resize(vw, vh);
    let (cx, cy) = world.player.body.center();
    camera.snap_to(cx, cy, world.grid.height() as f32);
}

fn process_events(
    events: &[GameEvent],
    camera: &mut Camera,
    particles: &mut Particles,
    sound: Option<&SoundEngine>,
) {
    for event in events {
        match event {
            GameEvent::Particles { x, y, count, size_scale } => particles.spawn(*x, *y, *count, *size_scale),
            GameEvent::CameraShake { duration, magnitude } => camera.shake(*duration, *magnitude),
            _ => {}
        }
        let Some(sfx) = sound else { continue };
        match event {
            GameEvent::Jumped { double } => sfx.play_jump(*double),
            GameEvent::Landed => sfx.play_land(),
            GameEvent::Slid => sfx.play_slide(),
            GameEvent::Attacked => sfx.play_attack(),
            GameEvent::PlayerHit => sfx.play_hit(),
            GameEvent::HostileDeflected { .. } | GameEvent::HostileDestroyed { .. } => sfx.play_pop(),
            _ => {}
        }
    }
}
