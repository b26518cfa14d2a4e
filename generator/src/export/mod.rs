//! Turning a certificate into downloadable bytes.
//!
//! ## Workflow
//!
//! 1. **Compose**: the record and template become a [`Layout`](crate::layout::Layout),
//!    with the logo loaded up front.
//! 2. **Draw**: the layout becomes a display-mode drawing [`Surface`](crate::render::Surface).
//! 3. **Rasterize**: the surface is painted at `ExportOptions::scale`, with the
//!    optional diagonal watermark.
//! 4. **Assemble**: for PDF the raster is embedded, centered, on a page of the
//!    requested format and orientation, followed by a near-invisible
//!    `VERIFY:<code>:<id>` stamp. For PNG the raster is encoded directly.
//! 5. **Metadata**: the PDF info dictionary gets title, author, subject and creator.
//!
//! If any PDF step fails, a text-only certificate is produced instead and the
//! result is flagged `degraded`. Only when that also fails is an error returned.

mod capability;
mod file_name;
mod pdf;
mod png;
pub mod raster;

pub use capability::{capability_check, Capabilities};
pub use file_name::file_name;
pub use raster::{Rasterize, SurfaceRasterizer};

use crate::config::GeneratorConfig;
use crate::error::ExportError;
use crate::layout::{compose, logo, RenderMode};
use crate::render::surface::draw;
use crate::security::{generate_watermark, verification_code};
use common::model::certificate::CertificateRecord;
use common::model::template::Template;
use image::RgbaImage;
use log::{error, info, warn};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageFormat {
    #[default]
    A4,
    Letter,
    A3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    #[default]
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Png,
}

impl DocumentKind {
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Png => "image/png",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub format: PageFormat,
    pub orientation: Orientation,
    /// Device pixels per logical canvas pixel.
    pub scale: f32,
    /// Text tiled diagonally over the raster.
    pub watermark: Option<String>,
    pub include_metadata: bool,
    pub mode: RenderMode,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: PageFormat::default(),
            orientation: Orientation::default(),
            scale: 2.0,
            watermark: None,
            include_metadata: true,
            mode: RenderMode::display(),
        }
    }
}

impl ExportOptions {
    /// Options for a saved download: watermarked with a fresh `CERT-...` mark.
    pub fn download() -> Self {
        Self {
            watermark: Some(generate_watermark()),
            ..Self::default()
        }
    }

    /// Options for an on-screen preview: no watermark.
    pub fn preview() -> Self {
        Self::default()
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub creator: String,
}

impl DocumentMetadata {
    pub fn for_record(record: &CertificateRecord) -> Self {
        Self {
            title: format!("Certificate - {}", record.student.name.trim()),
            author: record.institution.name.trim().to_string(),
            subject: record.course.title.trim().to_string(),
            creator: "Certificate Generator".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub kind: DocumentKind,
    /// Set when the text-only fallback was produced.
    pub degraded: bool,
    pub metadata: DocumentMetadata,
    /// Strings drawn as PDF text (the stamp, or every fallback line).
    pub text_layer: Vec<String>,
}

/// Produces PDF and PNG exports. Generic over the rasterizer so callers can
/// swap in their own.
pub struct Exporter<R = SurfaceRasterizer> {
    fonts_dir: PathBuf,
    font_family: String,
    rasterizer: R,
}

impl Exporter<SurfaceRasterizer> {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self::with_rasterizer(config, SurfaceRasterizer::new(&config.fonts_dir))
    }
}

impl<R: Rasterize> Exporter<R> {
    pub fn with_rasterizer(config: &GeneratorConfig, rasterizer: R) -> Self {
        Self {
            fonts_dir: config.fonts_dir.clone(),
            font_family: config.font_family.clone(),
            rasterizer,
        }
    }

    fn render(
        &self,
        record: &CertificateRecord,
        template: &Template,
        options: &ExportOptions,
    ) -> Result<RgbaImage, ExportError> {
        let logo = logo::load_for(record, template);
        let layout = compose(record, template, options.mode, logo.as_ref());
        let surface = draw(&layout);
        self.rasterizer
            .rasterize(&surface, options.scale, options.watermark.as_deref())
    }

    fn primary_pdf(
        &self,
        record: &CertificateRecord,
        template: &Template,
        options: &ExportOptions,
        metadata: &DocumentMetadata,
        stamp: &str,
    ) -> Result<Vec<u8>, ExportError> {
        let raster = self.render(record, template, options)?;
        let family = pdf::load_family(&self.fonts_dir, &self.font_family)?;
        let page = pdf::page_size_mm(options.format, options.orientation);
        let bytes = pdf::raster_pdf(&raster, family, &metadata.title, stamp, page)?;
        if options.include_metadata {
            pdf::stamp_metadata(&bytes, metadata)
        } else {
            Ok(bytes)
        }
    }

    fn fallback_pdf(
        &self,
        record: &CertificateRecord,
        options: &ExportOptions,
        metadata: &DocumentMetadata,
    ) -> Result<(Vec<u8>, Vec<String>), ExportError> {
        let family = pdf::load_family(&self.fonts_dir, &self.font_family)?;
        let page = pdf::page_size_mm(options.format, options.orientation);
        let (bytes, lines) = pdf::fallback_pdf(record, family, &metadata.title, page)?;
        if !options.include_metadata {
            return Ok((bytes, lines));
        }
        match pdf::stamp_metadata(&bytes, metadata) {
            Ok(stamped) => Ok((stamped, lines)),
            Err(e) => {
                warn!("Fallback PDF left without metadata: {}", e);
                Ok((bytes, lines))
            }
        }
    }

    /// Exports a PDF, degrading to a text-only document when the raster path fails.
    pub fn export_pdf(
        &self,
        record: &CertificateRecord,
        template: &Template,
        options: &ExportOptions,
    ) -> Result<ExportedDocument, ExportError> {
        let metadata = DocumentMetadata::for_record(record);
        let stamp = format!("VERIFY:{}:{}", verification_code(record), record.id);
        let file_name = file_name(record, DocumentKind::Pdf);

        match self.primary_pdf(record, template, options, &metadata, &stamp) {
            Ok(bytes) => {
                info!("Generated PDF {} ({} bytes)", file_name, bytes.len());
                Ok(ExportedDocument {
                    bytes,
                    file_name,
                    kind: DocumentKind::Pdf,
                    degraded: false,
                    metadata,
                    text_layer: vec![stamp],
                })
            }
            Err(primary) => {
                warn!("PDF generation failed, using text-only fallback: {}", primary);
                match self.fallback_pdf(record, options, &metadata) {
                    Ok((bytes, text_layer)) => Ok(ExportedDocument {
                        bytes,
                        file_name,
                        kind: DocumentKind::Pdf,
                        degraded: true,
                        metadata,
                        text_layer,
                    }),
                    Err(fallback) => {
                        error!("Fallback PDF generation also failed: {}", fallback);
                        Err(ExportError::Fallback {
                            primary: Box::new(primary),
                            fallback: Box::new(fallback),
                        })
                    }
                }
            }
        }
    }

    pub fn export_png(
        &self,
        record: &CertificateRecord,
        template: &Template,
        options: &ExportOptions,
    ) -> Result<ExportedDocument, ExportError> {
        let raster = self.render(record, template, options)?;
        let bytes = png::encode_png(&raster)?;
        let file_name = file_name(record, DocumentKind::Png);
        info!("Generated PNG {} ({} bytes)", file_name, bytes.len());
        Ok(ExportedDocument {
            bytes,
            file_name,
            kind: DocumentKind::Png,
            degraded: false,
            metadata: DocumentMetadata::for_record(record),
            text_layer: Vec::new(),
        })
    }
}
