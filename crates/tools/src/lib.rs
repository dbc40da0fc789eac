//! Configuration and shared setup for the graspdet command-line tools.

pub mod config;

pub use config::ToolConfig;

use std::path::{Path, PathBuf};

/// Overlay output path for a detection file: `<out_dir>/<json stem>.png`.
pub fn overlay_path(out_dir: &Path, detection_file: &Path) -> PathBuf {
    let stem = detection_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "overlay".to_string());
    out_dir.join(format!("{stem}.png"))
}

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
