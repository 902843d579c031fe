/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// The logger isn't up yet while this runs (its file path comes from here),
/// so problems are collected in `warnings` and logged by `main` afterwards.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub gamepad: GamepadConfig,
    pub general: GeneralConfig,
    pub levels_dir: PathBuf,
    pub warnings: Vec<String>,
}

/// Movement and timing constants. Speeds are world units per second.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub max_delta: f32,
    pub ground_speed: f32,
    pub air_speed: f32,
    pub walk_divisor: f32,
    pub crouch_divisor: f32,
    pub jump_velocity: f32,
    pub double_jump_velocity: f32,
    pub slide_cooldown_ms: u64,
    pub knockback_delay_ms: u64,
    pub knockback_recoil: f32,
    pub spawn_interval: f32,
    pub hostile_speed: f32,
    pub wrap_divisor: f32,
    pub look_up_chance: f32,
    pub seed: Option<u64>,
    /// Per-animation frame duration overrides, keyed by state name.
    pub frame_ms: BTreeMap<String, f32>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub attack: Vec<String>,
    pub walk: Vec<String>,
    pub knockback: Vec<String>,
    pub debug: Vec<String>,
    pub restart: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct GeneralConfig {
    /// Level file stem under `levels_dir`, or "builtin".
    pub level: String,
    pub frame_ms: u64,
    pub log_file: PathBuf,
    pub log_level: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_max_delta")]
    max_delta: f32,
    #[serde(default = "default_ground_speed")]
    ground_speed: f32,
    #[serde(default = "default_air_speed")]
    air_speed: f32,
    #[serde(default = "default_divisor")]
    walk_divisor: f32,
    #[serde(default = "default_divisor")]
    crouch_divisor: f32,
    #[serde(default = "default_jump_velocity")]
    jump_velocity: f32,
    #[serde(default = "default_double_jump_velocity")]
    double_jump_velocity: f32,
    #[serde(default = "default_slide_cooldown")]
    slide_cooldown_ms: u64,
    #[serde(default = "default_knockback_delay")]
    knockback_delay_ms: u64,
    #[serde(default = "default_knockback_recoil")]
    knockback_recoil: f32,
    #[serde(default = "default_spawn_interval")]
    spawn_interval: f32,
    #[serde(default = "default_hostile_speed")]
    hostile_speed: f32,
    #[serde(default = "default_wrap_divisor")]
    wrap_divisor: f32,
    #[serde(default = "default_look_up_chance")]
    look_up_chance: f32,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    frame_ms: BTreeMap<String, f32>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_attack")]
    attack: Vec<String>,
    #[serde(default = "default_pad_walk")]
    walk: Vec<String>,
    #[serde(default = "default_pad_knockback")]
    knockback: Vec<String>,
    #[serde(default = "default_pad_debug")]
    debug: Vec<String>,
    #[serde(default = "default_pad_restart")]
    restart: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_level")]
    level: String,
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

// ── Defaults ──

fn default_max_delta() -> f32 { 0.25 }
fn default_ground_speed() -> f32 { 6.0 }
fn default_air_speed() -> f32 { 5.5 }
fn default_divisor() -> f32 { 5.0 }
fn default_jump_velocity() -> f32 { 5.0 }
fn default_double_jump_velocity() -> f32 { 4.85 }
fn default_slide_cooldown() -> u64 { 1500 }
fn default_knockback_delay() -> u64 { 100 }
fn default_knockback_recoil() -> f32 { 0.1 }
fn default_spawn_interval() -> f32 { 2.0 }
fn default_hostile_speed() -> f32 { 3.0 }
fn default_wrap_divisor() -> f32 { 5.0 }
fn default_look_up_chance() -> f32 { 0.5 }

fn default_pad_jump() -> Vec<String> { vec!["A".into()] }
fn default_pad_attack() -> Vec<String> { vec!["X".into(), "R1".into()] }
fn default_pad_walk() -> Vec<String> { vec!["L1".into()] }
fn default_pad_knockback() -> Vec<String> { vec!["Y".into()] }
fn default_pad_debug() -> Vec<String> { vec!["Select".into()] }
fn default_pad_restart() -> Vec<String> { vec!["Start".into()] }
fn default_pad_quit() -> Vec<String> { vec![] }

fn default_levels_dir() -> String { "levels".into() }
fn default_level() -> String { "builtin".into() }
fn default_frame_ms() -> u64 { 16 }
fn default_log_file() -> String { "ledgerunner.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            max_delta: default_max_delta(),
            ground_speed: default_ground_speed(),
            air_speed: default_air_speed(),
            walk_divisor: default_divisor(),
            crouch_divisor: default_divisor(),
            jump_velocity: default_jump_velocity(),
            double_jump_velocity: default_double_jump_velocity(),
            slide_cooldown_ms: default_slide_cooldown(),
            knockback_delay_ms: default_knockback_delay(),
            knockback_recoil: default_knockback_recoil(),
            spawn_interval: default_spawn_interval(),
            hostile_speed: default_hostile_speed(),
            wrap_divisor: default_wrap_divisor(),
            look_up_chance: default_look_up_chance(),
            seed: None,
            frame_ms: BTreeMap::new(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            attack: default_pad_attack(),
            walk: default_pad_walk(),
            knockback: default_pad_knockback(),
            debug: default_pad_debug(),
            restart: default_pad_restart(),
            quit: default_pad_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            level: default_level(),
            frame_ms: default_frame_ms(),
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

impl From<TomlPhysics> for PhysicsConfig {
    fn from(t: TomlPhysics) -> Self {
        PhysicsConfig {
            max_delta: t.max_delta.max(0.0),
            ground_speed: t.ground_speed,
            air_speed: t.air_speed,
            walk_divisor: t.walk_divisor.max(1.0),
            crouch_divisor: t.crouch_divisor.max(1.0),
            jump_velocity: t.jump_velocity,
            double_jump_velocity: t.double_jump_velocity,
            slide_cooldown_ms: t.slide_cooldown_ms,
            knockback_delay_ms: t.knockback_delay_ms,
            knockback_recoil: t.knockback_recoil,
            spawn_interval: t.spawn_interval,
            hostile_speed: t.hostile_speed,
            wrap_divisor: t.wrap_divisor.max(1.0),
            look_up_chance: t.look_up_chance.clamp(0.0, 1.0),
            seed: t.seed,
            frame_ms: t.frame_ms,
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        TomlPhysics::default().into()
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) XDG data home.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = Vec::new();

        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        Self::resolve(toml_cfg, &search_dirs, warnings)
    }

    /// Parse a config document directly (no file lookup).
    #[cfg(test)]
    fn parse(text: &str) -> Self {
        let mut warnings = Vec::new();
        let cfg = parse_toml(text, "config.toml", &mut warnings);
        Self::resolve(cfg, &[PathBuf::from(".")], warnings)
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf], warnings: Vec<String>) -> Self {
        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            physics: toml_cfg.physics.into(),
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                attack: toml_cfg.gamepad.attack,
                walk: toml_cfg.gamepad.walk,
                knockback: toml_cfg.gamepad.knockback,
                debug: toml_cfg.gamepad.debug,
                restart: toml_cfg.gamepad.restart,
                quit: toml_cfg.gamepad.quit,
            },
            general: GeneralConfig {
                level: toml_cfg.general.level,
                frame_ms: toml_cfg.general.frame_ms.max(1),
                log_file: PathBuf::from(toml_cfg.general.log_file),
                log_level: toml_cfg.general.log_level,
            },
            levels_dir,
            warnings,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/ledgerunner)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/ledgerunner");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text, &path.display().to_string(), warnings),
                Err(e) => warnings.push(format!("could not read {}: {e}", path.display())),
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str, origin: &str, warnings: &mut Vec<String>) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warnings.push(format!("{origin} parse error, using default settings: {e}"));
            TomlConfig::default()
        }
    }
}
