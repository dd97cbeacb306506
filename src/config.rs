use std::path::PathBuf;
use std::{env, io};

use tracing::debug;

const DEFAULT_ZOOM: u32 = 14;
const DEFAULT_MAX_ZOOM: u32 = 22;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub default_zoom: u32,
    pub max_zoom: u32,
    pub symbol_style_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        load_dotenv_if_applicable();
        let max_zoom = parse_u32("MAP_MAX_ZOOM", DEFAULT_MAX_ZOOM).max(1);
        Self {
            default_zoom: parse_u32("MAP_DEFAULT_ZOOM", DEFAULT_ZOOM).min(max_zoom),
            max_zoom,
            symbol_style_file: env::var("SYMBOL_STYLE_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn clamp_zoom(&self, zoom: u32) -> u32 {
        zoom.clamp(1, self.max_zoom)
    }
}

fn load_dotenv_if_applicable() {
    if !should_load_dotenv() {
        debug!("skipping .env load outside dev mode");
        return;
    }

    if let Err(err) = dotenvy::dotenv() {
        match &err {
            dotenvy::Error::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {}
            _ => debug!(?err, "unable to load .env file"),
        }
    }
}

fn should_load_dotenv() -> bool {
    cfg!(debug_assertions) || parse_bool("ALLOW_DOTENV", false)
}

fn parse_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(default)
}

fn parse_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}
