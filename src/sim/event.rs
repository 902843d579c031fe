/// Events emitted during a simulation step.
/// The presentation layer consumes these for particles, camera shake and sound.

use super::hostile::HostileId;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// Dust/debris burst at a world position.
    Particles { x: f32, y: f32, count: u32, size_scale: f32 },
    CameraShake { duration: f32, magnitude: f32 },
    Jumped { double: bool },
    Landed,
    Slid,
    Attacked,
    PlayerHit,
    HostileSpawned { id: HostileId },
    HostileDeflected { id: HostileId },
    HostileDestroyed { id: HostileId },
    LevelWrapped { width: usize },
}

impl GameEvent {
    /// Camera shake with the default strength used for hostile hits.
    pub fn default_shake() -> Self {
        GameEvent::CameraShake { duration: 0.3, magnitude: 1.0 }
    }
}
