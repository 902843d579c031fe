/// Logical input consumed by the player controller.
///
/// The core never sees keys or buttons, only `Action`s. A source answers
/// two questions:
///   - `is_down`   : held right now (movement, walk modifier, down)
///   - `is_pressed`: pressed since last asked; consumes the press
///
/// Tests drive the controller through `ScriptedInput`.

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum Action {
    Left,
    Right,
    Down,
    Jump,
    Attack,
    /// Walk modifier: slows horizontal movement.
    Walk,
    /// Debug: trigger a knockback.
    Knockback,
    /// Debug: toggle the collision overlay.
    ToggleInfo,
}

pub trait InputSource {
    fn is_down(&self, action: Action) -> bool;
    fn is_pressed(&mut self, action: Action) -> bool;
}

/// Held actions and queued presses, set directly by the caller.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    held: std::collections::BTreeSet<Action>,
    pressed: std::collections::BTreeSet<Action>,
}

#[cfg(test)]
impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(&mut self, action: Action) {
        self.held.insert(action);
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(&action);
    }

    /// Queue one press; the next `is_pressed(action)` consumes it.
    pub fn press(&mut self, action: Action) {
        self.pressed.insert(action);
    }

}

#[cfg(test)]
impl InputSource for ScriptedInput {
    fn is_down(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    fn is_pressed(&mut self, action: Action) -> bool {
        self.pressed.remove(&action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_is_consumed_once() {
        let mut input = ScriptedInput::new();
        input.press(Action::Jump);
        assert!(input.is_pressed(Action::Jump));
        assert!(!input.is_pressed(Action::Jump));
    }

    #[test]
    fn hold_persists_until_release() {
        let mut input = ScriptedInput::new();
        input.hold(Action::Left);
        assert!(input.is_down(Action::Left));
        assert!(input.is_down(Action::Left));
        assert!(!input.is_pressed(Action::Left));
        input.release(Action::Left);
        assert!(!input.is_down(Action::Left));
    }
}
