pub mod app;
pub mod band;
pub mod config;
pub mod engine;
pub mod grid;
pub mod params;
pub mod particle;
pub mod protocol;
pub mod stretch;
pub mod worker;
