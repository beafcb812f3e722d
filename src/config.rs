use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================
// Grid Parameters
// ============================================

/// Pixel side length of one cell (pointer coordinates are divided by this)
pub const CELL_SIZE: u32 = 20;

/// Probability that a cell starts alive when the grid is reseeded
pub const INITIAL_DENSITY: f64 = 0.12;

// ============================================
// Simulation Parameters
// ============================================

/// Fixed generation cadence: one generation per second
pub const TICK_INTERVAL_MS: u64 = 1000;

/// Chance that a birth (or a manual revival) picks a palette hue instead of white
pub const COLOR_PROBABILITY: f64 = 0.05;

/// Start running as soon as the grid is seeded
pub const AUTO_PLAY: bool = true;

// ============================================
// Window
// ============================================

pub const DEFAULT_WINDOW_WIDTH: u32 = 1280;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 800;

/// Settings file looked up in the working directory when no path is given
pub const SETTINGS_FILE_NAME: &str = "life-backdrop.json";

/// What `start()` does once the grid has settled into a stable configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayPolicy {
    /// Starting is refused until `reset()` or `clear_all()` is called.
    RequireReset,
    /// Starting reseeds the grid and runs the new game.
    #[default]
    ResetOnStart,
}

/// User-tunable settings, loadable from a JSON file.
///
/// Every field is optional in the file; missing fields take the
/// compile-time defaults above.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cell_size: u32,
    pub initial_density: f64,
    pub tick_interval_ms: u64,
    pub color_probability: f64,
    pub replay_policy: ReplayPolicy,
    pub auto_play: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE,
            initial_density: INITIAL_DENSITY,
            tick_interval_ms: TICK_INTERVAL_MS,
            color_probability: COLOR_PROBABILITY,
            replay_policy: ReplayPolicy::default(),
            auto_play: AUTO_PLAY,
        }
    }
}

impl Settings {
    pub fn default_path() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(SETTINGS_FILE_NAME)
    }

    pub fn load_from_disk(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut settings: Settings = serde_json::from_str(&data)?;
        settings.sanitize();
        Ok(settings)
    }

    pub fn save_to_disk(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Clamp every field into its usable range.
    pub fn sanitize(&mut self) {
        self.cell_size = self.cell_size.max(1);
        self.initial_density = clamp_probability(self.initial_density);
        self.color_probability = clamp_probability(self.color_probability);
        self.tick_interval_ms = self.tick_interval_ms.max(1);
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Grid dimensions (in cells) that fit a surface of the given pixel size.
///
/// Partial cells at the right and bottom edges are dropped; each axis keeps
/// at least one cell so a minimized window still has a valid grid.
pub fn grid_dimensions(pixel_width: u32, pixel_height: u32, cell_size: u32) -> (usize, usize) {
    let cell_size = cell_size.max(1);
    let width = (pixel_width / cell_size).max(1);
    let height = (pixel_height / cell_size).max(1);
    (width as usize, height as usize)
}
