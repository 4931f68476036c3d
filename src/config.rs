use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Config {
    /// Base segment length in plot units.
    pub segment_len: f64,
    /// Slope clustering tolerance as a fraction of the slope range.
    pub cluster_rel_tol: f64,
    /// Output image dimensions (pixels).
    pub plot_width: u32,
    pub plot_height: u32,
    /// Default half-width of the sampled region.
    pub extent: f64,
    /// Default grid resolution (N points per axis).
    pub steps: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segment_len: 0.25,
            cluster_rel_tol: 0.05,
            plot_width: crate::plot::types::PLOT_WIDTH,
            plot_height: crate::plot::types::PLOT_HEIGHT,
            extent: 10.0,
            steps: 20,
        }
    }
}

/// Get or create the isocline config directory (~/.config/isocline/).
pub fn config_dir() -> Option<PathBuf> {
    let dir = dirs::config_dir()?.join("isocline");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Path to the config file.
pub fn config_path() -> Option<PathBuf> {
    Some(config_dir()?.join("config.toml"))
}

/// Load config from disk, returning defaults if file doesn't exist or is invalid.
pub fn load_config() -> Config {
    let path = match config_path() {
        Some(p) => p,
        None => return Config::default(),
    };
    match std::fs::read_to_string(&path) {
        Ok(content) => toml::from_str(&content).unwrap_or_default(),
        Err(_) => {
            // Create default config file on first run
            let config = Config::default();
            let _ = write_default_config(&path, &config);
            config
        }
    }
}

/// Write a default config file with comments.
fn write_default_config(path: &PathBuf, config: &Config) -> Result<(), String> {
    let content = format!(
        "# isocline configuration\n\
         \n\
         # Base segment length in plot units\n\
         segment_len = {}\n\
         \n\
         # Slope clustering tolerance as a fraction of the slope range\n\
         cluster_rel_tol = {}\n\
         \n\
         # Output image dimensions (pixels)\n\
         plot_width = {}\n\
         plot_height = {}\n\
         \n\
         # Default half-width of the sampled region\n\
         extent = {}\n\
         \n\
         # Default grid resolution (points per axis)\n\
         steps = {}\n",
        config.segment_len,
        config.cluster_rel_tol,
        config.plot_width,
        config.plot_height,
        config.extent,
        config.steps,
    );
    std::fs::write(path, content.as_bytes()).map_err(|e| format!("write error: {}", e))
}
