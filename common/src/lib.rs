//! Data model shared by the certificate generator crates.
//!
//! Everything here is plain serde data: the certificate record, the template
//! and course-preset catalogs, and the validation report.

pub mod model;
