/// Frame time and wall-clock cooldowns.
///
/// Two clocks drive a tick:
///   - `dt`  : simulation delta in seconds, already clamped by the loop.
///   - `wall`: real elapsed time since the previous tick, unclamped.
///
/// Cooldowns (slide lockout, delayed knockback recoil) run on `wall`, so a
/// slide started just before a stall still unlocks after the same real time.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    pub dt: f32,
    pub wall: Duration,
}

impl Tick {
    /// A tick whose wall time matches its simulation delta.
    #[cfg(test)]
    pub fn fixed(dt: f32) -> Self {
        Tick { dt, wall: Duration::from_secs_f32(dt.max(0.0)) }
    }
}

/// A countdown on the wall clock. Idle when `remaining` is zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Countdown {
    remaining: Duration,
}

impl Countdown {
    pub fn start(&mut self, duration: Duration) {
        self.remaining = duration;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        !self.remaining.is_zero()
    }

    /// Advance by `elapsed`. Returns true exactly once, on the tick it expires.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if self.remaining.is_zero() {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        self.remaining.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_fires_once() {
        let mut c = Countdown::default();
        assert!(!c.is_running());
        c.start(Duration::from_millis(100));
        assert!(c.is_running());
        assert!(!c.tick(Duration::from_millis(60)));
        assert!(c.tick(Duration::from_millis(60)));
        assert!(!c.is_running());
        assert!(!c.tick(Duration::from_millis(60)));
    }

    #[test]
    fn countdown_ignores_simulation_clamp() {
        // One 2s stall expires a 1.5s cooldown even if dt was clamped to 0.25.
        let mut c = Countdown::default();
        c.start(Duration::from_millis(1500));
        let tick = Tick { dt: 0.25, wall: Duration::from_secs(2) };
        assert!(c.tick(tick.wall));
    }
}
