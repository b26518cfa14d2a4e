//! Certificate generator engine.
//!
//! Takes a [`CertificateRecord`](common::model::certificate::CertificateRecord)
//! and a [`Template`](common::model::template::Template), composes the fixed
//! 1024×768 certificate layout and renders it as an interactive surface, an
//! HTML preview, a PNG image or a PDF document.
//!
//! Most callers only need [`session::CertificateSession`], which wraps editing,
//! validation, autosave and rate-limited export behind one type.

pub mod config;
pub mod dates;
pub mod delivery;
pub mod error;
pub mod export;
pub mod layout;
pub mod record;
pub mod render;
pub mod security;
pub mod session;
pub mod storage;

pub use config::GeneratorConfig;
pub use error::{CertificateError, ExportError, ImportError};
pub use session::CertificateSession;
