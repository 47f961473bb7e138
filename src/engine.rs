use crate::band::{Band, Variant};
use crate::grid::{connections, LINE_STRIDE};
use crate::params::FieldParams;
use crate::particle::{flatten_positions, ParticleSystem};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("tick requested before initialize")]
    Uninitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Ready,
}

/// Buffers for one frame. Freshly allocated per tick; the engine keeps no
/// handle to them once returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickResult {
    /// `x, y` per primary particle.
    pub particle_coords: Vec<f32>,
    /// `x, y` per shadow particle.
    pub shadow_particle_coords: Vec<f32>,
    /// Primary connections, `LINE_STRIDE` floats each.
    pub lines: Vec<f32>,
    pub shadow_lines: Vec<f32>,
}

impl TickResult {
    pub fn line_count(&self) -> usize {
        self.lines.len() / LINE_STRIDE
    }

    pub fn shadow_line_count(&self) -> usize {
        self.shadow_lines.len() / LINE_STRIDE
    }
}

/// Owns both particle populations and runs one tick per band snapshot.
pub struct FieldEngine {
    params: FieldParams,
    rng: fastrand::Rng,
    system: Option<ParticleSystem>,
    ticks: u64,
}

impl FieldEngine {
    pub fn new(params: FieldParams) -> Self {
        Self::with_rng(params, fastrand::Rng::new())
    }

    pub fn with_seed(params: FieldParams, seed: u64) -> Self {
        Self::with_rng(params, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(params: FieldParams, rng: fastrand::Rng) -> Self {
        Self {
            params,
            rng,
            system: None,
            ticks: 0,
        }
    }

    pub fn state(&self) -> EngineState {
        if self.system.is_some() {
            EngineState::Ready
        } else {
            EngineState::Uninitialized
        }
    }

    pub fn system(&self) -> Option<&ParticleSystem> {
        self.system.as_ref()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Respawns both populations. Safe to call at any time.
    pub fn initialize(&mut self) {
        self.system = Some(ParticleSystem::spawn(&mut self.rng, &self.params));
        self.ticks = 0;
        info!(
            particles = self.params.particle_count,
            cell_size = self.params.cell_size,
            "particle field initialized"
        );
    }

    pub fn tick(&mut self, bands: &[Band]) -> Result<TickResult, EngineError> {
        let system = self.system.as_mut().ok_or(EngineError::Uninitialized)?;
        system.step_all(bands, &self.params, &mut self.rng);
        self.ticks += 1;

        let cell = self.params.cell_size;
        let primary = system.population(Variant::Primary);
        let shadow = system.population(Variant::Shadow);
        let result = TickResult {
            particle_coords: flatten_positions(primary),
            shadow_particle_coords: flatten_positions(shadow),
            lines: connections(primary, Variant::Primary, bands, cell),
            shadow_lines: connections(shadow, Variant::Shadow, bands, cell),
        };

        debug!(
            tick = self.ticks,
            bands = bands.len(),
            lines = result.line_count(),
            shadow_lines = result.shadow_line_count(),
            "tick"
        );
        Ok(result)
    }
}
