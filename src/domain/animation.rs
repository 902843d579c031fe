/// Animation state machine.
///
/// An `AnimationSet` is a fixed table of named states, validated once:
/// every `AnimKey` present, every successor resolvable. The player owns
/// an `Animator` (active key + elapsed ms) over that table and calls the
/// trigger functions below in order after each render advance:
///
/// ```text
///   1. completion   elapsed > frame_ms * frames  →  next (or restart)
///   2. locomotion   running/idle ↔ run, crouch ↔ crawl
///   3. air/ground   airborne idle → fall, grounded fall → idle
/// ```
///
/// Size overrides and crouch release belong to whoever applies a switch
/// (`sim::player`); this module only decides which key comes next.

use std::collections::BTreeMap;
use std::str::FromStr;

use super::body::Facing;
use super::error::ConfigError;

// ══════════════════════════════════════════════════════════════
// Keys
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum AnimKey {
    Idle,
    LookUp,
    Run,
    Jump,
    Fall,
    Land,
    Slide,
    SlideTransition,
    Roll,
    Attack1,
    Attack2,
    Attack3,
    Attack4,
    GroundSlam,
    GroundSlamTransition,
    Knockback,
    LedgeClimb,
    LedgeHang,
    WallJump,
    Crouch,
    Crawl,
}

impl AnimKey {
    pub const ALL: [AnimKey; 21] = [
        AnimKey::Idle,
        AnimKey::LookUp,
        AnimKey::Run,
        AnimKey::Jump,
        AnimKey::Fall,
        AnimKey::Land,
        AnimKey::Slide,
        AnimKey::SlideTransition,
        AnimKey::Roll,
        AnimKey::Attack1,
        AnimKey::Attack2,
        AnimKey::Attack3,
        AnimKey::Attack4,
        AnimKey::GroundSlam,
        AnimKey::GroundSlamTransition,
        AnimKey::Knockback,
        AnimKey::LedgeClimb,
        AnimKey::LedgeHang,
        AnimKey::WallJump,
        AnimKey::Crouch,
        AnimKey::Crawl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnimKey::Idle => "idle",
            AnimKey::LookUp => "look_up",
            AnimKey::Run => "run",
            AnimKey::Jump => "jump",
            AnimKey::Fall => "fall",
            AnimKey::Land => "land",
            AnimKey::Slide => "slide",
            AnimKey::SlideTransition => "slide_transition",
            AnimKey::Roll => "roll",
            AnimKey::Attack1 => "attack1",
            AnimKey::Attack2 => "attack2",
            AnimKey::Attack3 => "attack3",
            AnimKey::Attack4 => "attack4",
            AnimKey::GroundSlam => "ground_slam",
            AnimKey::GroundSlamTransition => "ground_slam_transition",
            AnimKey::Knockback => "knockback",
            AnimKey::LedgeClimb => "ledge_climb",
            AnimKey::LedgeHang => "ledge_hang",
            AnimKey::WallJump => "wall_jump",
            AnimKey::Crouch => "crouch",
            AnimKey::Crawl => "crawl",
        }
    }

    /// Either slide state; slide friction runs while this holds.
    #[inline]
    pub fn is_slide(self) -> bool {
        matches!(self, AnimKey::Slide | AnimKey::SlideTransition)
    }

    /// States that keep the crouched hitbox.
    #[inline]
    pub fn is_crouched(self) -> bool {
        matches!(self, AnimKey::Crouch | AnimKey::Crawl)
    }

    /// States that pass under ledges instead of grabbing them.
    #[inline]
    pub fn ignores_ledges(self) -> bool {
        matches!(self, AnimKey::Crawl | AnimKey::Roll)
    }
}

impl FromStr for AnimKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnimKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownAnimation(s.to_string()))
    }
}

impl std::fmt::Display for AnimKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ══════════════════════════════════════════════════════════════
// States
// ══════════════════════════════════════════════════════════════

/// Horizontal sprite offset: one value, or one per facing.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum OffsetX {
    Uniform(f32),
    PerFacing { left: f32, right: f32 },
}

impl OffsetX {
    pub fn for_facing(self, facing: Facing) -> f32 {
        match self {
            OffsetX::Uniform(x) => x,
            OffsetX::PerFacing { left, right } => match facing {
                Facing::Left => left,
                Facing::Right => right,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationState {
    pub sprite: &'static str,
    pub frames: Vec<u16>,
    pub frame_ms: f32,
    /// Successor on completion; None restarts the state.
    pub next: Option<AnimKey>,
    /// Counts as "idle" for locomotion and air/ground triggers.
    pub idle: bool,
    pub disables_controller: bool,
    /// Hitbox override while active; None uses the default size.
    pub size: Option<(f32, f32)>,
    pub offset_x: OffsetX,
    pub offset_y: f32,
}

impl AnimationState {
    fn new(sprite: &'static str, frames: &[u16], frame_ms: f32) -> Self {
        AnimationState {
            sprite,
            frames: frames.to_vec(),
            frame_ms,
            next: None,
            idle: false,
            disables_controller: false,
            size: None,
            offset_x: OffsetX::Uniform(0.0),
            offset_y: 0.0,
        }
    }

    fn then(mut self, next: AnimKey) -> Self {
        self.next = Some(next);
        self
    }

    fn idle(mut self) -> Self {
        self.idle = true;
        self
    }

    fn locks_controller(mut self) -> Self {
        self.disables_controller = true;
        self
    }

    fn sized(mut self, w: f32, h: f32) -> Self {
        self.size = Some((w, h));
        self
    }

    fn offset(mut self, x: OffsetX, y: f32) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    /// Whole-state duration in ms.
    #[inline]
    pub fn duration_ms(&self) -> f32 {
        self.frame_ms * self.frames.len() as f32
    }

    /// Frame at `elapsed_ms`, clamped to the last frame.
    pub fn frame_at(&self, elapsed_ms: f32) -> u16 {
        let last = self.frames.len().saturating_sub(1);
        let index = if self.frame_ms > 0.0 {
            ((elapsed_ms / self.frame_ms).floor().max(0.0) as usize).min(last)
        } else {
            last
        };
        self.frames.get(index).copied().unwrap_or(0)
    }

    #[inline]
    pub fn is_done(&self, elapsed_ms: f32) -> bool {
        elapsed_ms > self.duration_ms()
    }
}

// ══════════════════════════════════════════════════════════════
// Set
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct AnimationSet {
    states: BTreeMap<AnimKey, AnimationState>,
}

impl AnimationSet {
    /// Validate a state table: every key present, no empty frame lists.
    pub fn new(states: BTreeMap<AnimKey, AnimationState>) -> Result<Self, ConfigError> {
        for key in AnimKey::ALL {
            match states.get(&key) {
                None => return Err(ConfigError::IncompleteAnimationSet(key.as_str())),
                Some(s) if s.frames.is_empty() => {
                    return Err(ConfigError::IncompleteAnimationSet(key.as_str()))
                }
                Some(_) => {}
            }
        }
        Ok(AnimationSet { states })
    }

    /// The player's 21-state table.
    pub fn player() -> Result<Self, ConfigError> {
        use AnimKey::*;
        let per_facing = |left, right| OffsetX::PerFacing { left, right };
        let table = [
            (Idle, AnimationState::new("player_idle", &[0, 1, 2, 3, 4, 5, 6], 140.0).then(Idle).idle()),
            (
                LookUp,
                AnimationState::new("player_look_up", &[0, 1, 2, 2, 2, 2, 2, 2, 2, 2, 1, 0], 200.0)
                    .then(Idle)
                    .idle(),
            ),
            (Run, AnimationState::new("player_run", &[0, 1, 2, 3, 4, 5, 7], 120.0)),
            (Jump, AnimationState::new("player_jump", &[0], 110.0).then(Fall)),
            (Fall, AnimationState::new("player_jump", &[1, 2], 250.0).then(Fall)),
            (Land, AnimationState::new("player_land", &[0, 1], 100.0).then(Idle).idle()),
            (
                Slide,
                AnimationState::new("player_slide", &[0, 1, 2], 90.0)
                    .then(SlideTransition)
                    .sized(1.0, 0.6)
                    .offset(per_facing(0.3, 0.2), -0.4),
            ),
            (SlideTransition, AnimationState::new("player_slide", &[3], 100.0).then(Idle).idle()),
            (
                Roll,
                AnimationState::new("player_front_flip", &[5, 6, 7, 8, 9, 10, 11, 12], 60.0)
                    .then(Fall)
                    .sized(0.55, 0.6)
                    .offset(OffsetX::Uniform(0.0), -0.15),
            ),
            (
                Attack1,
                AnimationState::new("player_combat_combo_01_attack_01", &[0, 1, 2, 3, 4, 5], 100.0)
                    .then(Idle)
                    .locks_controller(),
            ),
            (
                Attack2,
                AnimationState::new("player_combat_combo_01_attack_02", &[0, 1, 2, 3, 4], 100.0)
                    .then(Idle)
                    .locks_controller(),
            ),
            (
                Attack3,
                AnimationState::new("player_combat_combo_01_attack_03", &[0, 1, 2, 3], 100.0)
                    .then(Idle)
                    .locks_controller(),
            ),
            (
                Attack4,
                AnimationState::new("player_combat_combo_01_attack_04", &[0, 1, 2, 3, 4, 5, 6, 7, 8], 100.0)
                    .then(Idle)
                    .locks_controller(),
            ),
            (
                GroundSlam,
                AnimationState::new("player_combat_ground_slam", &[0, 1, 2, 3, 4, 5, 6], 100.0)
                    .then(GroundSlamTransition)
                    .locks_controller(),
            ),
            (
                GroundSlamTransition,
                AnimationState::new("player_combat_ground_slam", &[7, 8, 9], 100.0).then(Idle).idle(),
            ),
            (
                Knockback,
                AnimationState::new("player_knockback", &[0, 1, 2, 4, 4, 4, 4, 4, 4, 4, 5], 100.0)
                    .then(Idle)
                    .locks_controller(),
            ),
            (
                LedgeClimb,
                AnimationState::new("player_ledge_climb", &[0, 1, 2, 3, 4, 5, 6, 7], 100.0)
                    .then(LedgeClimb)
                    .offset(per_facing(0.3, -0.3), 0.9),
            ),
            (
                LedgeHang,
                AnimationState::new("player_ledge_hang", &[0, 1, 2, 3, 4, 5], 100.0)
                    .then(LedgeHang)
                    .offset(per_facing(-0.1, 0.11), 0.0),
            ),
            (
                WallJump,
                AnimationState::new("player_wall_jump", &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10], 100.0).then(Fall),
            ),
            (
                Crouch,
                AnimationState::new("player_crouch", &[0, 1, 2, 3, 4, 5], 100.0)
                    .then(Crouch)
                    .sized(0.55, 0.6)
                    .offset(OffsetX::Uniform(0.0), -0.4),
            ),
            (
                Crawl,
                AnimationState::new("player_crawl", &[0, 1, 2, 3, 4, 5, 6, 7], 120.0)
                    .then(Crawl)
                    .sized(0.55, 0.6)
                    .offset(OffsetX::Uniform(0.0), -0.4),
            ),
        ];
        AnimationSet::new(table.into_iter().collect())
    }

    /// Per-state frame duration overrides, keyed by state name.
    pub fn with_frame_ms(mut self, overrides: &BTreeMap<String, f32>) -> Result<Self, ConfigError> {
        for (name, &ms) in overrides {
            let key: AnimKey = name.parse()?;
            if let Some(state) = self.states.get_mut(&key) {
                state.frame_ms = ms.max(1.0);
            }
        }
        Ok(self)
    }

    /// Every key is present after `new`, so lookup cannot miss.
    pub fn get(&self, key: AnimKey) -> &AnimationState {
        &self.states[&key]
    }

    #[cfg(test)]
    pub fn states(&self) -> impl Iterator<Item = (AnimKey, &AnimationState)> {
        self.states.iter().map(|(k, s)| (*k, s))
    }

    // ── Triggers ──

    /// Where a finished state goes. Leaving `idle` may detour to `look_up`
    /// with probability `look_up_chance`.
    pub fn completion_target(&self, key: AnimKey, rng: &mut fastrand::Rng, look_up_chance: f32) -> AnimKey {
        match self.get(key).next {
            Some(next) => {
                if key == AnimKey::Idle && look_up_chance > 0.0 && rng.f32() < look_up_chance {
                    AnimKey::LookUp
                } else {
                    next
                }
            }
            None => key,
        }
    }

    /// Run/idle and crawl/crouch swaps driven by the running flag.
    /// Up to two switches can fire (idle → run never chains into crawl).
    pub fn locomotion_target(&self, key: AnimKey, running: bool) -> Option<AnimKey> {
        if running {
            if self.get(key).idle {
                return Some(AnimKey::Run);
            }
            if key == AnimKey::Crouch {
                return Some(AnimKey::Crawl);
            }
        } else {
            if key == AnimKey::Run {
                return Some(AnimKey::Idle);
            }
            if key == AnimKey::Crawl {
                return Some(AnimKey::Crouch);
            }
        }
        None
    }

    /// Fall when airborne in an idle state (or a hang that let go);
    /// stop falling once grounded.
    pub fn air_target(&self, key: AnimKey, on_ground: bool, ledge_hanging: bool) -> Option<AnimKey> {
        if !on_ground {
            if self.get(key).idle || (!ledge_hanging && key == AnimKey::LedgeHang) {
                return Some(AnimKey::Fall);
            }
        } else if key == AnimKey::Fall {
            return Some(AnimKey::Idle);
        }
        None
    }
}

// ══════════════════════════════════════════════════════════════
// Animator
// ══════════════════════════════════════════════════════════════

/// Active key and time spent in it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animator {
    pub key: AnimKey,
    pub elapsed_ms: f32,
}

impl Animator {
    pub fn new(key: AnimKey) -> Self {
        Animator { key, elapsed_ms: 0.0 }
    }

    pub fn switch(&mut self, key: AnimKey) {
        self.key = key;
        self.elapsed_ms = 0.0;
    }

    /// Advance by `dt` seconds. Returns (frame, done).
    pub fn advance(&mut self, set: &AnimationSet, dt: f32) -> (u16, bool) {
        self.elapsed_ms += dt.max(0.0) * 1000.0;
        let state = set.get(self.key);
        (state.frame_at(self.elapsed_ms), state.is_done(self.elapsed_ms))
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> AnimationSet {
        AnimationSet::player().unwrap()
    }

    #[test]
    fn player_table_is_complete() {
        let s = set();
        assert_eq!(s.states().count(), AnimKey::ALL.len());
        for (_, state) in s.states() {
            assert!(!state.frames.is_empty());
        }
    }

    #[test]
    fn every_successor_is_a_known_state() {
        let s = set();
        for (_, state) in s.states() {
            if let Some(next) = state.next {
                assert_eq!(s.get(next).sprite.is_empty(), false);
            }
        }
    }

    #[test]
    fn missing_state_is_rejected() {
        let mut states: BTreeMap<_, _> = set().states().map(|(k, s)| (k, s.clone())).collect();
        states.remove(&AnimKey::Crawl);
        assert_eq!(
            AnimationSet::new(states).unwrap_err(),
            ConfigError::IncompleteAnimationSet("crawl")
        );
    }

    #[test]
    fn names_roundtrip_and_unknown_fails() {
        for k in AnimKey::ALL {
            assert_eq!(k.as_str().parse::<AnimKey>().unwrap(), k);
        }
        assert_eq!(
            "moonwalk".parse::<AnimKey>().unwrap_err(),
            ConfigError::UnknownAnimation("moonwalk".into())
        );
    }

    #[test]
    fn frame_override_rejects_unknown_name() {
        let mut o = BTreeMap::new();
        o.insert("run".to_string(), 80.0);
        let s = set().with_frame_ms(&o).unwrap();
        assert_eq!(s.get(AnimKey::Run).frame_ms, 80.0);

        o.insert("sprint".to_string(), 80.0);
        assert!(set().with_frame_ms(&o).is_err());
    }

    #[test]
    fn frame_index_clamps_to_last() {
        let s = set();
        let jump = s.get(AnimKey::Jump);
        assert_eq!(jump.frame_at(0.0), 0);
        assert_eq!(jump.frame_at(5000.0), 0);
        let fall = s.get(AnimKey::Fall);
        assert_eq!(fall.frame_at(0.0), 1);
        assert_eq!(fall.frame_at(260.0), 2);
        assert_eq!(fall.frame_at(9999.0), 2);
    }

    #[test]
    fn jump_completes_after_its_duration() {
        let s = set();
        let mut a = Animator::new(AnimKey::Jump);
        let (_, done) = a.advance(&s, 0.1);
        assert!(!done);
        let (_, done) = a.advance(&s, 0.02);
        assert!(done);
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(s.completion_target(a.key, &mut rng, 0.5), AnimKey::Fall);
    }

    #[test]
    fn state_without_successor_restarts_itself() {
        let s = set();
        assert_eq!(s.get(AnimKey::Run).next, None);
        let mut a = Animator::new(AnimKey::Run);
        let (_, done) = a.advance(&s, 1.0);
        assert!(done);
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(s.completion_target(AnimKey::Run, &mut rng, 1.0), AnimKey::Run);
    }

    #[test]
    fn idle_detour_follows_chance() {
        let s = set();
        let mut rng = fastrand::Rng::with_seed(7);
        assert_eq!(s.completion_target(AnimKey::Idle, &mut rng, 0.0), AnimKey::Idle);
        assert_eq!(s.completion_target(AnimKey::Idle, &mut rng, 1.0), AnimKey::LookUp);
        let mut saw_idle = false;
        let mut saw_look = false;
        for _ in 0..200 {
            match s.completion_target(AnimKey::Idle, &mut rng, 0.5) {
                AnimKey::Idle => saw_idle = true,
                AnimKey::LookUp => saw_look = true,
                other => panic!("unexpected {other}"),
            }
        }
        assert!(saw_idle && saw_look);
    }

    #[test]
    fn run_is_not_idle_so_it_does_not_fall_through() {
        let s = set();
        assert_eq!(s.locomotion_target(AnimKey::Idle, true), Some(AnimKey::Run));
        assert_eq!(s.locomotion_target(AnimKey::Land, true), Some(AnimKey::Run));
        assert_eq!(s.locomotion_target(AnimKey::Run, true), None);
        assert_eq!(s.locomotion_target(AnimKey::Run, false), Some(AnimKey::Idle));
        assert_eq!(s.locomotion_target(AnimKey::Crouch, true), Some(AnimKey::Crawl));
        assert_eq!(s.locomotion_target(AnimKey::Crawl, false), Some(AnimKey::Crouch));
        assert_eq!(s.locomotion_target(AnimKey::Attack1, true), None);
    }

    #[test]
    fn air_and_ground_triggers() {
        let s = set();
        assert_eq!(s.air_target(AnimKey::Idle, false, false), Some(AnimKey::Fall));
        assert_eq!(s.air_target(AnimKey::LedgeHang, false, true), None);
        assert_eq!(s.air_target(AnimKey::LedgeHang, false, false), Some(AnimKey::Fall));
        assert_eq!(s.air_target(AnimKey::Fall, true, false), Some(AnimKey::Idle));
        assert_eq!(s.air_target(AnimKey::Roll, false, false), None);
    }

    #[test]
    fn per_facing_offsets() {
        let s = set();
        let hang = s.get(AnimKey::LedgeHang);
        assert_eq!(hang.offset_x.for_facing(Facing::Left), -0.1);
        assert_eq!(hang.offset_x.for_facing(Facing::Right), 0.11);
        assert_eq!(s.get(AnimKey::Idle).offset_x.for_facing(Facing::Left), 0.0);
    }

    #[test]
    fn disabled_states_match_table() {
        let s = set();
        let locked: Vec<_> = s.states().filter(|(_, st)| st.disables_controller).map(|(k, _)| k).collect();
        assert_eq!(
            locked,
            vec![
                AnimKey::Attack1,
                AnimKey::Attack2,
                AnimKey::Attack3,
                AnimKey::Attack4,
                AnimKey::GroundSlam,
                AnimKey::Knockback,
            ]
        );
    }
}
