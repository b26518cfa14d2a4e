//! Institution logo resolution and loading.
//!
//! The logo comes from the record first, then the template. Sources may be
//! `data:` URIs carrying base64 image data, `file://` URLs or plain paths.
//! Remote URLs are not fetched.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use common::model::certificate::CertificateRecord;
use common::model::template::Template;
use image::{load_from_memory, RgbaImage};
use log::warn;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub const MAX_LOGO_WIDTH: f32 = 120.0;
pub const MAX_LOGO_HEIGHT: f32 = 80.0;

#[derive(Debug, Error)]
pub enum LogoError {
    #[error("remote logo URLs are not supported: {0}")]
    Remote(String),
    #[error("malformed data URI")]
    MalformedDataUri,
    #[error("invalid base64 logo data: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("could not read logo file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not decode logo image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decoded logo pixels; cheap to clone.
#[derive(Debug, Clone)]
pub struct LoadedLogo {
    pub source: String,
    pub pixels: Arc<RgbaImage>,
}

impl LoadedLogo {
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Size on the canvas: fitted into 120×80 keeping the aspect ratio, never enlarged.
    pub fn fitted_size(&self) -> (f32, f32) {
        let (w, h) = self.dimensions();
        let (w, h) = (w.max(1) as f32, h.max(1) as f32);
        let scale = (MAX_LOGO_WIDTH / w).min(MAX_LOGO_HEIGHT / h).min(1.0);
        (w * scale, h * scale)
    }
}

/// The logo source that applies, if any: record URL, else template URL.
pub fn resolve_source<'a>(record: &'a CertificateRecord, template: &'a Template) -> Option<&'a str> {
    [record.institution.logo_url.as_deref(), template.logo_url.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

pub fn load(source: &str) -> Result<LoadedLogo, LogoError> {
    let bytes = if let Some(rest) = source.strip_prefix("data:") {
        let (header, payload) = rest.split_once(',').ok_or(LogoError::MalformedDataUri)?;
        if !header.ends_with(";base64") {
            return Err(LogoError::MalformedDataUri);
        }
        BASE64.decode(payload.trim())?
    } else if source.starts_with("http://") || source.starts_with("https://") {
        return Err(LogoError::Remote(source.to_string()));
    } else {
        let path = source.strip_prefix("file://").unwrap_or(source);
        fs::read(Path::new(path))?
    };

    let pixels = load_from_memory(&bytes)?.to_rgba8();
    Ok(LoadedLogo {
        source: source.to_string(),
        pixels: Arc::new(pixels),
    })
}

/// Resolves and loads the logo for a certificate.
///
/// `None` means the built-in placeholder is drawn, either because no source is
/// configured or because loading failed.
pub fn load_for(record: &CertificateRecord, template: &Template) -> Option<LoadedLogo> {
    let source = resolve_source(record, template)?;
    match load(source) {
        Ok(logo) => Some(logo),
        Err(e) => {
            warn!("Failed to load logo {}: {}", source, e);
            None
        }
    }
}
