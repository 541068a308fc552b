mod app;
mod config;
mod panel;

use anyhow::Result;

use prism_engine::device::GpuInit;
use prism_engine::logging::{init_logging, LoggingConfig};
use prism_engine::window::Runtime;

use crate::app::StudioApp;
use crate::config::{config_path, StudioConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = StudioConfig::load(&config_path(std::env::args()))?;
    let runtime = config.runtime();

    Runtime::run(runtime, GpuInit::default(), StudioApp::new(config))
}
