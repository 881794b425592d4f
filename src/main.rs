use std::path::PathBuf;

use anyhow::Context;
use sway::{app::SwayApp, config::DemoConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => DemoConfig::load(&path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => DemoConfig::default(),
    };

    let app = SwayApp::new(config).context("failed to set up the demo")?;
    app.run().context("render loop stopped")
}
