pub mod cli;
pub mod config;
pub mod framerate;
pub mod probe;
pub mod video;


pub use config::ProbeConfig;
pub use probe::{run_probe, ProbeReport};
