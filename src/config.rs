use crate::params::{FieldParams, ParamsError};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "band_field", version, about = "Audio-reactive particle field worker")]
pub struct Config {
    #[arg(long, value_enum, default_value_t = RunMode::Serve)]
    pub mode: RunMode,

    /// `key=value` params file; missing file means defaults.
    #[arg(long, value_name = "PATH")]
    pub params: Option<PathBuf>,

    /// Overrides `particle_count` from the params file.
    #[arg(long, value_name = "N")]
    pub particles: Option<usize>,

    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..=64))]
    pub bands: u32,

    #[arg(long, default_value_t = 600)]
    pub frames: u32,

    /// Demo pacing; 0 runs unpaced.
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Log filter, e.g. `info` or `band_field=debug`. `RUST_LOG` wins when set.
    #[arg(long, default_value = "info")]
    pub log: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// JSON-lines protocol on stdin/stdout.
    Serve,
    /// Synthetic orbiting bands, stats on stderr.
    Demo,
}

impl Config {
    pub fn field_params(&self) -> Result<FieldParams, ParamsError> {
        let mut params = FieldParams::load(self.params.as_deref())?;
        if let Some(n) = self.particles {
            params.particle_count = n;
            params.validate()?;
        }
        Ok(params)
    }
}
