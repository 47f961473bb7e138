use crate::band::Band;
use crate::config::{Config, RunMode};
use crate::engine::FieldEngine;
use crate::params::FieldParams;
use crate::protocol;
use crate::worker::FieldWorker;
use anyhow::Context;
use std::collections::VecDeque;
use std::io::{self, BufWriter};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let params = cfg
        .field_params()
        .with_context(|| format!("load field params ({:?})", cfg.params))?;

    match cfg.mode {
        RunMode::Serve => serve_stdio(params, cfg.seed),
        RunMode::Demo => run_demo(&cfg, params),
    }
}

fn serve_stdio(params: FieldParams, seed: Option<u64>) -> anyhow::Result<()> {
    let mut engine = match seed {
        Some(seed) => FieldEngine::with_seed(params, seed),
        None => FieldEngine::new(params),
    };
    info!(particles = params.particle_count, "serving on stdio");
    let stdin = io::stdin();
    let stdout = BufWriter::new(io::stdout());
    protocol::serve(&mut engine, stdin.lock(), stdout)?;
    Ok(())
}

fn run_demo(cfg: &Config, params: FieldParams) -> anyhow::Result<()> {
    let worker = FieldWorker::spawn(params, cfg.seed)?;
    worker.init().context("initialize worker")?;

    let frame_budget = if cfg.fps == 0 {
        None
    } else {
        Some(Duration::from_secs_f64(1.0 / cfg.fps as f64))
    };
    let dt = 1.0 / cfg.fps.max(1) as f32;
    let band_count = cfg.bands as usize;

    let mut stats = TickStats::new();
    let mut lines_total = 0usize;
    let start = Instant::now();

    for frame in 0..cfg.frames {
        let frame_start = Instant::now();
        let bands = synth_bands(frame as f32 * dt, band_count, &params);

        let tick_start = Instant::now();
        let result = worker.update(bands).context("tick")?;
        let tick_ms = tick_start.elapsed().as_secs_f32() * 1000.0;
        stats.record(tick_ms);
        lines_total += result.line_count() + result.shadow_line_count();

        if frame % 60 == 59 {
            info!(
                frame = frame + 1,
                lines = result.line_count(),
                shadow_lines = result.shadow_line_count(),
                tick_ms = format_args!("{tick_ms:.3}"),
                avg_ms = format_args!("{:.3}", stats.mean_ms()),
                p95_ms = format_args!("{:.3}", stats.p95_ms()),
                "demo progress"
            );
        }

        if let Some(budget) = frame_budget {
            let spent = frame_start.elapsed();
            if spent < budget {
                std::thread::sleep(budget - spent);
            }
        }
    }

    info!(
        frames = cfg.frames,
        elapsed_s = format_args!("{:.2}", start.elapsed().as_secs_f32()),
        avg_tick_ms = format_args!("{:.3}", stats.mean_ms()),
        p95_tick_ms = format_args!("{:.3}", stats.p95_ms()),
        avg_lines = lines_total / cfg.frames.max(1) as usize,
        "demo finished"
    );
    Ok(())
}

/// Bands orbiting the spawn-area center with sine-driven levels.
///
/// Stand-in for the equalizer feed so the field can be driven without audio.
pub fn synth_bands(t: f32, count: usize, params: &FieldParams) -> Vec<Band> {
    let cx = params.spawn_width * 0.5;
    let cy = params.spawn_height * 0.5;
    let radius = params.spawn_width.min(params.spawn_height) * 0.35;

    (0..count)
        .map(|i| {
            let phase = i as f32 / count.max(1) as f32 * std::f32::consts::TAU;
            let orbit = t * (0.25 + i as f32 * 0.03) + phase;
            let wobble = (t * 1.7 + phase * 2.0).sin() * 0.15;
            let r = radius * (1.0 + wobble);
            let wet = ((t * (1.9 + i as f32 * 0.4) + phase).sin() * 0.5 + 0.5).powf(1.15);
            let dry = ((t * 0.8 + phase * 0.5).sin() * 0.5 + 0.5) * 0.6;
            Band::new(
                cx + orbit.cos() * r,
                cy + orbit.sin() * r,
                dry.clamp(0.0, 1.0),
                wet.clamp(0.0, 1.0),
            )
        })
        .collect()
}

/// Tick durations in milliseconds over the most recent frames.
struct TickStats {
    window: VecDeque<f32>,
}

impl TickStats {
    const WINDOW: usize = 240;

    fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(Self::WINDOW),
        }
    }

    fn record(&mut self, ms: f32) {
        if self.window.len() == Self::WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(ms);
    }

    fn mean_ms(&self) -> f32 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<f32>() / self.window.len() as f32
    }

    fn p95_ms(&self) -> f32 {
        let mut sorted: Vec<f32> = self.window.iter().copied().collect();
        sorted.sort_by(f32::total_cmp);
        match sorted.len() {
            0 => 0.0,
            n => sorted[(n - 1) * 95 / 100],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_stats_keep_a_bounded_window() {
        let mut stats = TickStats::new();
        assert_eq!(stats.mean_ms(), 0.0);
        assert_eq!(stats.p95_ms(), 0.0);

        for _ in 0..TickStats::WINDOW {
            stats.record(100.0);
        }
        for i in 0..TickStats::WINDOW {
            stats.record(i as f32);
        }
        assert_eq!(stats.window.len(), TickStats::WINDOW);
        assert!((stats.mean_ms() - 119.5).abs() < 1e-3);
        assert_eq!(stats.p95_ms(), 227.0);
    }
}
