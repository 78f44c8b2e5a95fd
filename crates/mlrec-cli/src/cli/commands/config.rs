//! Config command handlers.

use anyhow::{Context, Result};
use mlrec_core::config;

pub fn path() {
    println!("{}", config::paths::config_path().display());
}

pub fn init() -> Result<()> {
    let config_path = config::paths::config_path();
    config::Config::init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    Ok(())
}

pub fn show(config: &config::Config) -> Result<()> {
    let toml = config.to_toml()?;
    print!("{toml}");
    Ok(())
}
