pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::SweepConfig};
pub use core::{
    engine::{FileOutcome, SweepEngine, SweepReport},
    pipeline::SweepPipeline,
};
pub use utils::error::{Result, SweepError};
