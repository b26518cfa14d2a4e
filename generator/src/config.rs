//! Runtime configuration for the generator.
//!
//! Every knob has a compiled-in default; `GeneratorConfig::from_env` overrides
//! them from `CERTGEN_*` environment variables. A variable that is absent or
//! fails to parse keeps its default.

use crate::export::raster::MAX_SCALE;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Directory holding the TTF files for every face used on the canvas.
    pub fonts_dir: PathBuf,
    /// Family prefix of the PDF font files (`<family>-Regular.ttf`, ...).
    pub font_family: String,
    /// SQLite file backing the autosave slot.
    pub autosave_db: PathBuf,
    pub storage_key: String,
    /// Where `download` persists exported files.
    pub output_dir: PathBuf,
    pub raster_scale: f32,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub verification_base_url: String,
    pub default_template: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            fonts_dir: PathBuf::from("./fonts"),
            font_family: "DejaVuSans".to_string(),
            autosave_db: PathBuf::from("certificates.sqlite"),
            storage_key: "certificate-data".to_string(),
            output_dir: PathBuf::from("."),
            raster_scale: 2.0,
            rate_limit_max: 10,
            rate_limit_window: Duration::from_millis(60_000),
            verification_base_url: "https://platform.example.com/verify".to_string(),
            default_template: "classic".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            fonts_dir: env::var("CERTGEN_FONTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.fonts_dir),
            font_family: env::var("CERTGEN_FONT_FAMILY").unwrap_or(defaults.font_family),
            autosave_db: env::var("CERTGEN_AUTOSAVE_DB")
                .map(PathBuf::from)
                .unwrap_or(defaults.autosave_db),
            storage_key: env::var("CERTGEN_STORAGE_KEY").unwrap_or(defaults.storage_key),
            output_dir: env::var("CERTGEN_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            raster_scale: parsed("CERTGEN_RASTER_SCALE")
                .filter(|s: &f32| *s > 0.0 && *s <= MAX_SCALE)
                .unwrap_or(defaults.raster_scale),
            rate_limit_max: parsed("CERTGEN_RATE_LIMIT_MAX").unwrap_or(defaults.rate_limit_max),
            rate_limit_window: parsed("CERTGEN_RATE_LIMIT_WINDOW_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.rate_limit_window),
            verification_base_url: env::var("CERTGEN_VERIFY_BASE_URL")
                .unwrap_or(defaults.verification_base_url),
            default_template: env::var("CERTGEN_DEFAULT_TEMPLATE")
                .unwrap_or(defaults.default_template),
        }
    }
}

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
