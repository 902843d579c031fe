/// World: the complete snapshot of a running game.
///
/// Owns the tile grid, the player, the hostile arena and the seeded RNG
/// that drives spawns and the idle detour. Built from a `LevelDef`;
/// restarting a level means building a fresh `World` from the same def.
///
/// ## Level wrap
///
/// Once the player walks past `width / wrap_divisor`, every row is
/// repeated (`r ++ r`) and the side mask rebuilt, so the level keeps
/// extending to the right.

use log::debug;

use crate::config::PhysicsConfig;
use crate::domain::animation::AnimationSet;
use crate::domain::error::ConfigError;
use crate::domain::grid::TileGrid;

use super::event::GameEvent;
use super::hostile::Hostiles;
use super::level::LevelDef;
use super::player::Player;

pub struct World {
    pub grid: TileGrid,
    pub player: Player,
    pub hostiles: Hostiles,
    pub physics: PhysicsConfig,
    pub rng: fastrand::Rng,
    /// Debug overlay: hitbox and collision mask.
    pub show_info: bool,
    pub level_name: String,
}

impl World {
    pub fn new(def: &LevelDef, physics: PhysicsConfig) -> Result<Self, ConfigError> {
        let grid = TileGrid::new(def.cells.clone(), def.width, def.height)?;
        let anims = AnimationSet::player()?.with_frame_ms(&physics.frame_ms)?;
        let (x, y) = def.spawn_point();
        let rng = match physics.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };

        Ok(World {
            grid,
            player: Player::new(x, y, anims),
            hostiles: Hostiles::new(),
            physics,
            rng,
            show_info: false,
            level_name: def.name.clone(),
        })
    }

    /// Should the level extend this tick?
    pub fn wrap_due(&self) -> bool {
        self.player.body.x > self.grid.width() as f32 / self.physics.wrap_divisor
    }

    /// Double the level horizontally.
    pub fn wrap_level(&mut self, events: &mut Vec<GameEvent>) {
        self.grid = self.grid.doubled();
        let width = self.grid.width();
        debug!("level wrapped, width now {width}");
        events.push(GameEvent::LevelWrapped { width });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level;

    #[test]
    fn builds_from_builtin_level() {
        let def = level::builtin().unwrap();
        let world = World::new(&def, PhysicsConfig::default()).unwrap();
        assert_eq!(world.grid.width(), 15);
        assert_eq!(world.player.body.x, 5.0);
        assert_eq!(world.player.body.y, 16.0);
        assert!(world.hostiles.is_empty());
        assert!(!world.show_info);
    }

    #[test]
    fn bad_frame_override_fails_construction() {
        let def = level::builtin().unwrap();
        let mut physics = PhysicsConfig::default();
        physics.frame_ms.insert("moonwalk".into(), 90.0);
        assert!(matches!(
            World::new(&def, physics),
            Err(ConfigError::UnknownAnimation(name)) if name == "moonwalk"
        ));
    }

    #[test]
    fn wrap_doubles_width_and_keeps_rows() {
        let def = level::builtin().unwrap();
        let mut world = World::new(&def, PhysicsConfig::default()).unwrap();
        assert!(world.wrap_due()); // x=5 > 15/5
        let mut events = vec![];
        world.wrap_level(&mut events);
        assert_eq!(world.grid.width(), 30);
        assert_eq!(world.grid.height(), 28);
        assert_eq!(world.grid.tile(3, 1), world.grid.tile(18, 1));
        assert_eq!(events, vec![GameEvent::LevelWrapped { width: 30 }]);
        assert!(!world.wrap_due());
    }

    #[test]
    fn seeded_worlds_share_rng_stream() {
        let def = level::builtin().unwrap();
        let mut physics = PhysicsConfig::default();
        physics.seed = Some(42);
        let mut a = World::new(&def, physics.clone()).unwrap();
        let mut b = World::new(&def, physics).unwrap();
        assert_eq!(a.rng.u64(..), b.rng.u64(..));
    }
}
