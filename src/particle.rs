use crate::band::{Band, Variant};
use crate::params::FieldParams;

const BASE_PULL: f32 = 0.001;
const LEVEL_PULL: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Index into the current band snapshot. Revalidated on every step.
    pub target: Option<usize>,
    pub variant: Variant,
}

impl Particle {
    pub fn new(x: f32, y: f32, vx: f32, vy: f32, variant: Variant) -> Self {
        Self {
            x,
            y,
            vx,
            vy,
            target: None,
            variant,
        }
    }

    /// Random position inside the spawn area, velocity in `[-1, 1)` per axis.
    pub fn spawn(rng: &mut fastrand::Rng, params: &FieldParams, variant: Variant) -> Self {
        Self::new(
            rng.f32() * params.spawn_width,
            rng.f32() * params.spawn_height,
            rng.f32() * 2.0 - 1.0,
            rng.f32() * 2.0 - 1.0,
            variant,
        )
    }

    pub fn speed(&self) -> f32 {
        self.vx.hypot(self.vy)
    }

    /// Advance one simulation step toward the current target band.
    ///
    /// An empty snapshot leaves the particle untouched. A missing or stale
    /// target is replaced with a random band before integrating.
    pub fn step(&mut self, bands: &[Band], params: &FieldParams, rng: &mut fastrand::Rng) {
        if bands.is_empty() {
            return;
        }

        let idx = match self.target.filter(|&i| i < bands.len()) {
            Some(i) => i,
            None => {
                let i = rng.usize(..bands.len());
                self.target = Some(i);
                i
            }
        };

        let target = &bands[idx];
        if !target.has_finite_position() {
            return;
        }

        let pull = BASE_PULL + target.level(self.variant) * LEVEL_PULL;
        let dx = target.x - self.x;
        let dy = target.y - self.y;

        // Arrival only retargets; this step still integrates toward `target`.
        if dx.hypot(dy) < params.switch_distance {
            self.target = Some(pick_other(rng, idx, bands.len()));
        }

        self.vx = (self.vx + dx * pull) * params.friction;
        self.vy = (self.vy + dy * pull) * params.friction;

        let speed = self.speed();
        if speed > params.max_speed {
            let k = params.max_speed / speed;
            self.vx *= k;
            self.vy *= k;
        }

        self.x += self.vx;
        self.y += self.vy;
    }
}

/// Uniform pick among `0..len` excluding `current`. With one band, keeps it.
fn pick_other(rng: &mut fastrand::Rng, current: usize, len: usize) -> usize {
    if len <= 1 {
        return current;
    }
    let pick = rng.usize(..len - 1);
    if pick >= current { pick + 1 } else { pick }
}

/// Both particle populations, created together and never resized.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSystem {
    pub primary: Vec<Particle>,
    pub shadow: Vec<Particle>,
}

impl ParticleSystem {
    pub fn spawn(rng: &mut fastrand::Rng, params: &FieldParams) -> Self {
        let n = params.particle_count;
        let primary = (0..n)
            .map(|_| Particle::spawn(rng, params, Variant::Primary))
            .collect();
        let shadow = (0..n)
            .map(|_| Particle::spawn(rng, params, Variant::Shadow))
            .collect();
        Self { primary, shadow }
    }

    pub fn population(&self, variant: Variant) -> &[Particle] {
        match variant {
            Variant::Primary => &self.primary,
            Variant::Shadow => &self.shadow,
        }
    }

    pub fn step_all(&mut self, bands: &[Band], params: &FieldParams, rng: &mut fastrand::Rng) {
        for p in self.primary.iter_mut().chain(self.shadow.iter_mut()) {
            p.step(bands, params, rng);
        }
    }
}

/// Flattens positions as `x, y` pairs in population order.
pub fn flatten_positions(particles: &[Particle]) -> Vec<f32> {
    let mut out = Vec::with_capacity(particles.len() * 2);
    for p in particles {
        out.push(p.x);
        out.push(p.y);
    }
    out
}
