/// Keyboard tracker and the merged input source the controller reads.
///
/// `KeyboardState` tracks which keys are currently held down, enabling:
///   - Continuous movement while a key is held
///   - Edge-triggered jump / attack (only fire on initial press)
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.
///
/// `Controls` merges keyboard and gamepad into an `InputSource`. Presses
/// are latched until the simulation consumes them, so a press that lands
/// on a frame without an update is not lost.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::sim::input::{Action, InputSource};

use super::gamepad::GamepadState;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key bindings ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_JUMP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W'), KeyCode::Char(' ')];
const KEYS_ATTACK: &[KeyCode] = &[KeyCode::Char('j'), KeyCode::Char('J'), KeyCode::Char('k'), KeyCode::Char('K')];
const KEYS_WALK: &[KeyCode] = &[KeyCode::Char('z'), KeyCode::Char('Z')];
const KEYS_KNOCKBACK: &[KeyCode] = &[KeyCode::Char('f'), KeyCode::Char('F')];
const KEYS_INFO: &[KeyCode] = &[KeyCode::Char('g'), KeyCode::Char('G')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

fn keys_for(action: Action) -> &'static [KeyCode] {
    match action {
        Action::Left => KEYS_LEFT,
        Action::Right => KEYS_RIGHT,
        Action::Down => KEYS_DOWN,
        Action::Jump => KEYS_JUMP,
        Action::Attack => KEYS_ATTACK,
        Action::Walk => KEYS_WALK,
        Action::Knockback => KEYS_KNOCKBACK,
        Action::ToggleInfo => KEYS_INFO,
    }
}

/// Actions that fire on press rather than while held.
const EDGE_ACTIONS: [Action; 4] = [Action::Jump, Action::Attack, Action::Knockback, Action::ToggleInfo];

// ══════════════════════════════════════════════════════════════
// Keyboard
// ══════════════════════════════════════════════════════════════

pub struct KeyboardState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl+C handling.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl KeyboardState {
    pub fn new() -> Self {
        KeyboardState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn apply(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Not trusted without enhancement; timeout handles it.
            }
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

// ══════════════════════════════════════════════════════════════
// Merged source
// ══════════════════════════════════════════════════════════════

pub struct Controls {
    pub keyboard: KeyboardState,
    pub gamepad: GamepadState,
    latched: BTreeSet<Action>,
}

impl Controls {
    pub fn new(gamepad: GamepadState) -> Self {
        Controls { keyboard: KeyboardState::new(), gamepad, latched: BTreeSet::new() }
    }

    /// Poll both devices and latch this frame's presses.
    pub fn poll(&mut self) {
        self.keyboard.drain_events();
        self.gamepad.update();
        self.latch();
    }

    fn latch(&mut self) {
        for action in EDGE_ACTIONS {
            if self.keyboard.any_pressed(keys_for(action)) || self.gamepad.action_pressed(action) {
                self.latched.insert(action);
            }
        }
    }

    /// Drop latched presses (level restart).
    pub fn clear(&mut self) {
        self.latched.clear();
    }

    pub fn quit_requested(&self) -> bool {
        self.keyboard.ctrl_c_pressed() || self.keyboard.any_pressed(KEYS_QUIT) || self.gamepad.quit_pressed()
    }

    pub fn restart_requested(&self) -> bool {
        self.keyboard.any_pressed(KEYS_RESTART) || self.gamepad.restart_pressed()
    }
}

impl InputSource for Controls {
    fn is_down(&self, action: Action) -> bool {
        self.keyboard.any_held(keys_for(action)) || self.gamepad.action_held(action)
    }

    fn is_pressed(&mut self, action: Action) -> bool {
        self.latched.remove(&action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(kb: &mut KeyboardState, code: KeyCode) {
        kb.apply(KeyEvent::new(code, KeyModifiers::NONE), Instant::now());
    }

    #[test]
    fn first_press_is_fresh_repeat_is_not() {
        let mut kb = KeyboardState::new();
        press(&mut kb, KeyCode::Char('w'));
        assert!(kb.any_pressed(KEYS_JUMP));
        assert!(kb.any_held(KEYS_JUMP));
        kb.fresh_presses.clear();
        press(&mut kb, KeyCode::Char('w'));
        assert!(!kb.any_pressed(KEYS_JUMP));
        assert!(kb.any_held(KEYS_JUMP));
    }

    #[test]
    fn stale_key_is_released_by_timeout() {
        let mut kb = KeyboardState::new();
        let old = Instant::now() - Duration::from_millis(500);
        kb.apply(KeyEvent::new(KeyCode::Left, KeyModifiers::NONE), old);
        assert!(!kb.is_held(KeyCode::Left));
    }

    #[test]
    fn latched_press_survives_until_consumed() {
        let mut c = Controls::new(GamepadState::new());
        press(&mut c.keyboard, KeyCode::Char(' '));
        c.latch();
        c.keyboard.fresh_presses.clear();
        c.latch();
        assert!(c.is_down(Action::Jump));
        assert!(c.is_pressed(Action::Jump));
        assert!(!c.is_pressed(Action::Jump));
    }

    #[test]
    fn ctrl_c_quits() {
        let mut c = Controls::new(GamepadState::new());
        c.keyboard.apply(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(c.quit_requested());
        assert!(!c.restart_requested());
    }
}
