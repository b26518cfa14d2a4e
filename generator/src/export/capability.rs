use super::pdf::load_family;
use super::raster::{load_font, REQUIRED_FONTS};
use crate::config::GeneratorConfig;
use serde::Serialize;

/// Whether this environment can produce exports, and why not if it can't.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capabilities {
    pub supported: bool,
    pub errors: Vec<String>,
}

/// Checks fonts, the PDF font family and temporary storage.
pub fn capability_check(config: &GeneratorConfig) -> Capabilities {
    let mut errors = Vec::new();

    if !config.fonts_dir.is_dir() {
        errors.push(format!(
            "Fonts directory not found: {}",
            config.fonts_dir.display()
        ));
    } else {
        for name in REQUIRED_FONTS {
            if let Err(e) = load_font(&config.fonts_dir.join(name)) {
                errors.push(format!("Font unavailable: {}", e));
            }
        }
        if let Err(e) = load_family(&config.fonts_dir, &config.font_family) {
            errors.push(format!(
                "PDF font family {} unavailable: {}",
                config.font_family, e
            ));
        }
    }

    if let Err(e) = tempfile::NamedTempFile::new() {
        errors.push(format!("Temporary storage is not writable: {}", e));
    }

    Capabilities {
        supported: errors.is_empty(),
        errors,
    }
}
