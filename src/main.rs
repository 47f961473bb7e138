use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cfg = band_field::config::Config::parse();
    band_field::app::init_tracing(&cfg.log);
    band_field::app::run(cfg)
}
