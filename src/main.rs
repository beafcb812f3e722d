mod app;
mod gpu;

use std::path::PathBuf;

use anyhow::Context;
use env_logger::Env;
use winit::event_loop::EventLoop;

use life_backdrop::config::Settings;

use crate::app::App;

/// Settings from the path given as the first argument, else the default file
/// when present, else built-in defaults.
fn load_settings() -> Settings {
    let explicit = std::env::args_os().nth(1).map(PathBuf::from);
    let path = match explicit {
        Some(path) => path,
        None => {
            let path = Settings::default_path();
            if !path.exists() {
                return Settings::default();
            }
            path
        }
    };

    match Settings::load_from_disk(&path) {
        Ok(settings) => {
            log::info!("Loaded settings from {}", path.display());
            settings
        }
        Err(e) => {
            log::warn!("Ignoring settings file {}: {:#}", path.display(), e);
            Settings::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = load_settings();
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = App::new(settings);
    event_loop.run_app(&mut app).context("event loop terminated")?;

    match app.take_init_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
