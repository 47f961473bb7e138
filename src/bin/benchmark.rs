use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use band_field::app::synth_bands;
use band_field::band::Variant;
use band_field::engine::FieldEngine;
use band_field::grid::{connections, connections_exhaustive, LINE_STRIDE};
use band_field::params::FieldParams;
use band_field::particle::ParticleSystem;
use clap::Parser;

const DEFAULT_SEED: u64 = 0xF15D_2026;

#[derive(Parser, Debug, Clone)]
#[command(name = "benchmark", about = "Tick and neighbor-search timings for the particle field")]
struct Args {
    #[arg(long, default_value_t = 600)]
    frames: usize,

    #[arg(long, default_value_t = 8)]
    bands: usize,

    /// Population sizes for the grid-vs-exhaustive comparison.
    #[arg(long, value_delimiter = ',', default_values_t = [20usize, 200, 1000, 2000])]
    sizes: Vec<usize>,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Fail when the average engine tick exceeds `--max-ms`.
    #[arg(long, default_value_t = false)]
    ci_smoke: bool,

    #[arg(long, default_value_t = 2.0)]
    max_ms: f64,
}

fn bench_engine(args: &Args) -> Result<f64> {
    let params = FieldParams::default();
    let mut engine = FieldEngine::with_seed(params, args.seed);
    engine.initialize();

    let frames = args.frames.max(1);
    let mut total = Duration::ZERO;
    let mut lines = 0usize;
    let mut shadow_lines = 0usize;

    for f in 0..frames {
        let bands = synth_bands(f as f32 / 60.0, args.bands, &params);
        let start = Instant::now();
        let result = engine.tick(&bands)?;
        total += start.elapsed();
        lines += result.line_count();
        shadow_lines += result.shadow_line_count();
    }

    let ms = total.as_secs_f64() * 1000.0 / frames as f64;
    println!(
        "Engine tick: particles={}x2 bands={} frames={}  {:>8.4} ms/tick  lines~{} shadow~{}",
        params.particle_count,
        args.bands,
        frames,
        ms,
        lines / frames,
        shadow_lines / frames,
    );
    Ok(ms)
}

fn bench_search(args: &Args) {
    println!("Neighbor search: grid (3x3 cells) vs exhaustive, after 120 warm-up ticks");
    for &n in &args.sizes {
        let params = FieldParams {
            particle_count: n.max(1),
            ..FieldParams::default()
        };
        let mut rng = fastrand::Rng::with_seed(args.seed);
        let mut system = ParticleSystem::spawn(&mut rng, &params);
        let mut bands = synth_bands(0.0, args.bands, &params);
        for f in 0..120 {
            bands = synth_bands(f as f32 / 60.0, args.bands, &params);
            system.step_all(&bands, &params, &mut rng);
        }

        let reps = (20_000 / params.particle_count).clamp(1, 200);

        let start = Instant::now();
        let mut grid_len = 0usize;
        for _ in 0..reps {
            grid_len = connections(&system.primary, Variant::Primary, &bands, params.cell_size).len();
        }
        let grid_ms = start.elapsed().as_secs_f64() * 1000.0 / reps as f64;

        let start = Instant::now();
        let mut full_len = 0usize;
        for _ in 0..reps {
            full_len = connections_exhaustive(&system.primary, Variant::Primary, &bands).len();
        }
        let full_ms = start.elapsed().as_secs_f64() * 1000.0 / reps as f64;

        let grid_k = grid_len / LINE_STRIDE;
        let full_k = full_len / LINE_STRIDE;
        println!(
            "  n={:>5}  grid {:>9.4} ms ({:>6} lines)  exhaustive {:>9.4} ms ({:>6} lines)  missed={}",
            n,
            grid_ms,
            grid_k,
            full_ms,
            full_k,
            full_k.saturating_sub(grid_k),
        );
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let ms = bench_engine(&args)?;
    bench_search(&args);

    if args.ci_smoke && ms > args.max_ms {
        bail!("avg tick {:.4}ms > limit {:.4}ms", ms, args.max_ms);
    }
    Ok(())
}
