use std::fs::{self, File};
use std::sync::Mutex;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Send tracing output to a file under the platform data dir; stdout
/// belongs to the terminal UI. `RUST_LOG` overrides the default filter.
pub fn init() -> Result<()> {
    let dir = dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sweeptui");
    fs::create_dir_all(&dir)?;
    let file = File::create(dir.join("sweeptui.log"))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sweeptui=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
