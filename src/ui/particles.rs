/// Dust and debris bursts.
///
/// Each particle fades in, drifts for two seconds, then shrinks and fades
/// out. Purely cosmetic: nothing in the simulation reads them.

use std::f32::consts::TAU;

/// Seconds before a particle starts dying.
const LIFETIME: f32 = 2.0;
const GONE: f32 = 0.0001;

#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    vx: f32,
    vy: f32,
    pub size: f32,
    pub alpha: f32,
    ticks: f32,
}

pub struct Particles {
    items: Vec<Particle>,
    rng: fastrand::Rng,
}

impl Particles {
    pub fn new(rng: fastrand::Rng) -> Self {
        Particles { items: Vec::with_capacity(64), rng }
    }

    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.rng.f32() * (hi - lo)
    }

    /// Roughly `count` particles (±10%) bursting out from `(x, y)`.
    pub fn spawn(&mut self, x: f32, y: f32, count: u32, size_scale: f32) {
        let n = if count == 1 {
            1
        } else {
            let c = count as f32;
            self.range(0.9 * c, 1.1 * c).floor() as u32
        };

        for _ in 0..n {
            let angle = self.range(0.0, TAU);
            let speed = self.range(0.1, 6.0) / 100.0;
            let offset = self.range(3.0, 5.0) / 100.0;
            let size = self.range(3.0, 6.0 * size_scale) / 100.0;
            let ticks = self.range(0.0, 1.0);
            let alpha = self.range(0.0, 0.1);
            self.items.push(Particle {
                x: x + angle.cos() * offset,
                y: y + angle.sin() * offset,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                size,
                alpha,
                ticks,
            });
        }
    }

    pub fn update(&mut self, dt: f32) {
        for p in &mut self.items {
            p.x += p.vx * dt;
            p.y += p.vy * dt;
            p.ticks += dt;
            if p.ticks > LIFETIME {
                p.size -= dt / 200.0;
                p.alpha -= dt / 2.0;
            } else if p.alpha < 1.0 {
                p.alpha = (p.alpha + 3.0 * dt).min(1.0);
            }
        }
        self.items.retain(|p| p.size >= GONE && p.alpha >= GONE);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.items.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particles() -> Particles {
        Particles::new(fastrand::Rng::with_seed(5))
    }

    #[test]
    fn single_particle_is_exact() {
        let mut ps = particles();
        ps.spawn(1.0, 1.0, 1, 0.5);
        assert_eq!(ps.len(), 1);
    }

    #[test]
    fn burst_count_stays_within_ten_percent() {
        let mut ps = particles();
        ps.spawn(0.0, 0.0, 20, 1.0);
        assert!((18..=22).contains(&ps.len()));
    }

    #[test]
    fn particles_start_near_origin() {
        let mut ps = particles();
        ps.spawn(4.0, 2.0, 10, 1.0);
        for p in ps.iter() {
            assert!((p.x - 4.0).abs() <= 0.05 + 1e-6);
            assert!((p.y - 2.0).abs() <= 0.05 + 1e-6);
            assert!(p.alpha < 0.1);
        }
    }

    #[test]
    fn particles_fade_in_then_die() {
        let mut ps = particles();
        ps.spawn(0.0, 0.0, 10, 1.0);
        ps.update(0.5);
        assert!(ps.iter().all(|p| p.alpha == 1.0));
        // Past the lifetime, alpha drops by dt/2 per update.
        for _ in 0..40 {
            ps.update(0.1);
        }
        assert_eq!(ps.len(), 0);
    }
}
