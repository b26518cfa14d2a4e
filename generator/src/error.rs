use thiserror::Error;

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum CertificateError {
    /// The record failed validation; carries every message.
    #[error("Certificate validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Too many requests. Please wait before generating another certificate.")]
    RateLimited,

    /// Fonts, PDF family or temporary storage are unavailable.
    #[error("Export is not supported in this environment: {}", .0.join(", "))]
    Capability(Vec<String>),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Import(#[from] ImportError),

    /// Another export from the same session is still running.
    #[error("A certificate is already being generated")]
    Busy,

    #[error("Unknown certificate field: {0}")]
    UnknownField(String),

    #[error("Invalid value {value:?} for field {field}")]
    InvalidValue { field: String, value: String },

    #[error("Template not found: {0}")]
    UnknownTemplate(String),

    #[error("Course preset not found: {0}")]
    UnknownCoursePreset(String),

    /// Autosave database failure.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while turning a record into PDF or PNG bytes.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Font loading or glyph rendering on the drawing surface failed.
    #[error("Rasterization failed: {0}")]
    Raster(String),

    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    #[error("PDF rendering failed: {0}")]
    Pdf(#[from] genpdf::error::Error),

    #[error("PDF metadata update failed: {0}")]
    Metadata(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking export task panicked or was cancelled.
    #[error("Export worker failed: {0}")]
    Worker(String),

    #[error("PDF generation failed ({primary}); text-only fallback also failed ({fallback})")]
    Fallback {
        primary: Box<ExportError>,
        fallback: Box<ExportError>,
    },
}

/// Errors raised by JSON import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid JSON data: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid certificate data: {}", .0.join(", "))]
    Invalid(Vec<String>),
}
