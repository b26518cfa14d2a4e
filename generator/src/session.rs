//! The editing session around a single certificate.
//!
//! A [`CertificateSession`] owns the record being edited and the selected
//! template, keeps the validation messages from the last check and mirrors
//! every change into the autosave slot when one is attached.
//!
//! ## Export flow
//!
//! `generate_pdf` and `generate_png` run the same gate before any work:
//!
//! 1. **Validate** the record; failures are stored and returned.
//! 2. **Rate limit** on `<email or anonymous>-<action>`.
//! 3. **Capability check** of fonts and temporary storage.
//! 4. **In-flight guard**: a second export while one is running is rejected.
//!
//! The export itself runs on a blocking worker via `tokio::task::spawn_blocking`
//! so rasterization never stalls the async runtime. Generation takes `&self`,
//! so several tasks may share one session; the guard keeps their exports from
//! overlapping.

use crate::config::GeneratorConfig;
use crate::error::{CertificateError, ExportError, ImportError};
use crate::export::{capability_check, DocumentKind, ExportOptions, ExportedDocument, Exporter};
use crate::delivery::download;
use crate::record::{self, apply_field, new_record};
use crate::security::{validate, RateLimiter};
use crate::storage::{export_json, import_json, AutosaveStore, Autosaved};
use chrono::{DateTime, Utc};
use common::model::certificate::CertificateRecord;
use common::model::course;
use common::model::template::{self, Template};
use common::model::validation::ValidationReport;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Marks an export as running; clears the flag when dropped.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CertificateSession {
    config: GeneratorConfig,
    record: CertificateRecord,
    template: Template,
    errors: Mutex<Vec<String>>,
    dirty: bool,
    last_saved: Option<DateTime<Utc>>,
    limiter: Arc<RateLimiter>,
    autosave: Option<AutosaveStore>,
    generating: Arc<AtomicBool>,
    exporter: Arc<Exporter>,
}

impl CertificateSession {
    /// A session with its rate limiter and autosave slot built from `config`.
    pub fn open(config: GeneratorConfig) -> Result<Self, CertificateError> {
        let limiter = Arc::new(RateLimiter::from_config(&config));
        let autosave = AutosaveStore::from_config(&config)?;
        Self::new(config, limiter, Some(autosave))
    }

    /// Starts from the autosaved record when there is a valid one, otherwise
    /// from a fresh record with generated identifiers.
    pub fn new(
        config: GeneratorConfig,
        limiter: Arc<RateLimiter>,
        autosave: Option<AutosaveStore>,
    ) -> Result<Self, CertificateError> {
        let default_template = template::find(&config.default_template)
            .ok_or_else(|| CertificateError::UnknownTemplate(config.default_template.clone()))?;
        let (record, template) = match autosave.as_ref().and_then(AutosaveStore::load) {
            Some(Autosaved {
                record,
                template_id,
            }) => {
                info!("Restored autosaved certificate {}", record.id);
                let template = template::find(&template_id).unwrap_or(default_template);
                (record, template)
            }
            None => (new_record(&config), default_template),
        };
        let exporter = Arc::new(Exporter::new(&config));
        Ok(Self {
            config,
            record,
            template,
            errors: Mutex::new(Vec::new()),
            dirty: false,
            last_saved: None,
            limiter,
            autosave,
            generating: Arc::new(AtomicBool::new(false)),
            exporter,
        })
    }

    pub fn record(&self) -> &CertificateRecord {
        &self.record
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Messages from the last validation, import or export attempt.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_errors(&self, errors: Vec<String>) {
        *self.errors.lock().unwrap_or_else(PoisonError::into_inner) = errors;
    }

    /// True while there are edits the autosave slot has not caught up with.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    fn touch(&mut self) {
        self.dirty = true;
        let Some(store) = &self.autosave else {
            return;
        };
        match store.save(&self.record, &self.template.id) {
            Ok(()) => {
                self.dirty = false;
                self.last_saved = Some(Utc::now());
            }
            Err(e) => warn!("Autosave failed: {}", e),
        }
    }

    pub fn update_field(&mut self, path: &str, value: &str) -> Result<(), CertificateError> {
        apply_field(
            &mut self.record,
            path,
            value,
            &self.config.verification_base_url,
        )?;
        self.set_errors(Vec::new());
        self.touch();
        Ok(())
    }

    pub fn remove_instructor(&mut self, index: usize) -> bool {
        let removed = record::remove_instructor(&mut self.record, index);
        if removed {
            self.touch();
        }
        removed
    }

    /// Switches the visual theme. The record is left as it is; the choice is
    /// saved with the autosave slot.
    pub fn select_template(&mut self, id: &str) -> Result<(), CertificateError> {
        self.template =
            template::find(id).ok_or_else(|| CertificateError::UnknownTemplate(id.to_string()))?;
        self.touch();
        Ok(())
    }

    pub fn apply_course_preset(&mut self, id: &str) -> Result<(), CertificateError> {
        let preset =
            course::find(id).ok_or_else(|| CertificateError::UnknownCoursePreset(id.to_string()))?;
        record::apply_course_preset(&mut self.record, &preset);
        self.touch();
        Ok(())
    }

    pub fn generate_new_ids(&mut self) {
        record::regenerate_ids(&mut self.record, &self.config.verification_base_url);
        self.touch();
    }

    pub fn validate(&self) -> ValidationReport {
        let report = validate(&self.record);
        self.set_errors(report.errors.clone());
        report
    }

    /// Back to a blank record; the autosave slot is emptied.
    pub fn reset(&mut self) -> Result<(), CertificateError> {
        self.record = new_record(&self.config);
        self.set_errors(Vec::new());
        self.dirty = false;
        if let Some(store) = &self.autosave {
            store.clear()?;
        }
        Ok(())
    }

    /// Replaces the record with imported JSON. On failure the current record
    /// is kept and the reason is stored in `errors`.
    pub fn import(&mut self, text: &str) -> Result<(), CertificateError> {
        match import_json(text) {
            Ok(record) => {
                self.record = record;
                self.set_errors(Vec::new());
                self.touch();
                Ok(())
            }
            Err(e) => {
                self.set_errors(match &e {
                    ImportError::Invalid(errors) => errors.clone(),
                    ImportError::Malformed(_) => vec!["Invalid JSON data".to_string()],
                });
                Err(e.into())
            }
        }
    }

    pub fn export(&self) -> Result<String, CertificateError> {
        export_json(&self.record)
    }

    pub fn check_rate(&self, action: &str) -> Result<(), CertificateError> {
        let email = self.record.student.email.trim();
        let who = if email.is_empty() { "anonymous" } else { email };
        if self.limiter.allow(&format!("{}-{}", who, action)) {
            Ok(())
        } else {
            Err(CertificateError::RateLimited)
        }
    }

    /// Watermarked options at the configured raster scale.
    pub fn download_options(&self) -> ExportOptions {
        ExportOptions::download().with_scale(self.config.raster_scale)
    }

    /// Unwatermarked options at the configured raster scale.
    pub fn preview_options(&self) -> ExportOptions {
        ExportOptions::preview().with_scale(self.config.raster_scale)
    }

    /// Writes an exported document into the configured output directory.
    pub fn save_document(&self, document: &ExportedDocument) -> Result<PathBuf, CertificateError> {
        Ok(download(
            &document.bytes,
            &document.file_name,
            &self.config.output_dir,
        )?)
    }

    pub async fn generate_pdf(
        &self,
        options: ExportOptions,
    ) -> Result<ExportedDocument, CertificateError> {
        self.generate(DocumentKind::Pdf, options).await
    }

    pub async fn generate_png(
        &self,
        options: ExportOptions,
    ) -> Result<ExportedDocument, CertificateError> {
        self.generate(DocumentKind::Png, options).await
    }

    async fn generate(
        &self,
        kind: DocumentKind,
        options: ExportOptions,
    ) -> Result<ExportedDocument, CertificateError> {
        let report = self.validate();
        if !report.is_valid {
            return Err(CertificateError::Validation(report.errors));
        }

        let action = match kind {
            DocumentKind::Pdf => "generate-pdf",
            DocumentKind::Png => "generate-png",
        };
        self.check_rate(action)?;

        let capabilities = capability_check(&self.config);
        if !capabilities.supported {
            self.set_errors(capabilities.errors.clone());
            return Err(CertificateError::Capability(capabilities.errors));
        }

        let _guard = InFlight::acquire(&self.generating).ok_or(CertificateError::Busy)?;

        let exporter = Arc::clone(&self.exporter);
        let record = self.record.clone();
        let template = self.template.clone();
        let started = Instant::now();
        let handle = tokio::task::spawn_blocking(move || match kind {
            DocumentKind::Pdf => exporter.export_pdf(&record, &template, &options),
            DocumentKind::Png => exporter.export_png(&record, &template, &options),
        });

        let document = match handle.await {
            Ok(result) => result?,
            Err(e) => return Err(ExportError::Worker(format!("Task join error: {}", e)).into()),
        };
        debug!(
            "{} export finished in {:?}",
            kind.extension(),
            started.elapsed()
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::raster::tests::fonts_dir;
    use crate::record::tests::sample_record;
    use std::time::Duration;

    fn config() -> GeneratorConfig {
        GeneratorConfig {
            fonts_dir: fonts_dir(),
            ..GeneratorConfig::default()
        }
    }

    fn session_with(record: CertificateRecord) -> CertificateSession {
        let store = AutosaveStore::in_memory("certificate-data").unwrap();
        store.save(&record, "classic").unwrap();
        CertificateSession::new(config(), Arc::new(RateLimiter::default()), Some(store)).unwrap()
    }

    #[test]
    fn starts_fresh_without_autosave() {
        let session =
            CertificateSession::new(config(), Arc::new(RateLimiter::default()), None).unwrap();
        assert_eq!(session.record().certificate_title, "Certificate of Completion");
        assert_eq!(session.template().id, "classic");
        assert!(!session.is_dirty());
    }

    #[test]
    fn restores_autosaved_record() {
        let session = session_with(sample_record());
        assert_eq!(session.record(), &sample_record());
    }

    #[test]
    fn invalid_autosave_starts_fresh() {
        let mut half_edited = sample_record();
        half_edited.student.name.clear();
        let session = session_with(half_edited);
        assert_ne!(session.record().id, "CERT-2024-0001");
        assert!(session.record().student.name.is_empty());
        assert_eq!(session.record().course.instructors.len(), 1);
    }

    #[test]
    fn open_wires_config_into_limiter_and_slot() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            autosave_db: dir.path().join("slot.sqlite"),
            storage_key: "wired".into(),
            output_dir: dir.path().to_path_buf(),
            raster_scale: 0.5,
            rate_limit_max: 1,
            ..config()
        };
        let mut session = CertificateSession::open(config.clone()).unwrap();
        session.update_field("student.email", "").unwrap();
        assert!(session.check_rate("generate-pdf").is_ok());
        assert!(session.check_rate("generate-pdf").is_err());
        assert_eq!(session.download_options().scale, 0.5);
        assert_eq!(session.preview_options().watermark, None);

        let store = AutosaveStore::open(&config.autosave_db, "wired").unwrap();
        let pending = sample_record();
        store.save(&pending, "modern").unwrap();
        let reopened = CertificateSession::open(config).unwrap();
        assert_eq!(reopened.record(), &pending);
        assert_eq!(reopened.template().id, "modern");
    }

    #[test]
    fn unknown_default_template_is_rejected() {
        let config = GeneratorConfig {
            default_template: "neon".into(),
            ..config()
        };
        let result = CertificateSession::new(config, Arc::new(RateLimiter::default()), None);
        assert!(matches!(result, Err(CertificateError::UnknownTemplate(_))));
    }

    #[test]
    fn edits_clear_errors_and_autosave() {
        let mut session = session_with(sample_record());
        session.update_field("student.name", "").unwrap();
        assert!(!session.validate().is_valid);
        assert!(!session.errors().is_empty());

        session.update_field("student.name", "Jane Roe").unwrap();
        assert!(session.errors().is_empty());
        assert!(!session.is_dirty());
        assert!(session.last_saved().is_some());
        assert_eq!(
            session.autosave.as_ref().unwrap().load().unwrap().record.student.name,
            "Jane Roe"
        );
    }

    #[test]
    fn template_and_preset_selection() {
        let mut session = session_with(sample_record());
        session.select_template("elegant").unwrap();
        assert_eq!(session.template().name, "Elegant Gold");
        assert!(!session.is_dirty());
        assert_eq!(
            session.autosave.as_ref().unwrap().load().unwrap().template_id,
            "elegant"
        );
        assert!(matches!(
            session.select_template("nope"),
            Err(CertificateError::UnknownTemplate(_))
        ));

        session.apply_course_preset("python-basics").unwrap();
        assert_eq!(session.record().course.title, "Python Programming Fundamentals");
        assert!(matches!(
            session.apply_course_preset("nope"),
            Err(CertificateError::UnknownCoursePreset(_))
        ));
    }

    #[test]
    fn new_ids_follow_into_the_link() {
        let mut session = session_with(sample_record());
        session.generate_new_ids();
        let record = session.record();
        assert_ne!(record.id, "CERT-2024-0001");
        assert!(record.verification_url.ends_with(&record.id));
    }

    #[test]
    fn failed_import_keeps_the_record() {
        let mut session = session_with(sample_record());
        let before = session.record().clone();
        assert!(session.import("not json").is_err());
        assert_eq!(session.errors(), vec!["Invalid JSON data".to_string()]);
        assert_eq!(session.record(), &before);

        let mut other = sample_record();
        other.student.name = "Jane Roe".into();
        session.import(&export_json(&other).unwrap()).unwrap();
        assert_eq!(session.record().student.name, "Jane Roe");
        assert!(session.errors().is_empty());
    }

    #[test]
    fn reset_clears_the_slot() {
        let mut session = session_with(sample_record());
        session.reset().unwrap();
        assert!(session.record().student.name.is_empty());
        assert!(session.autosave.as_ref().unwrap().load().is_none());
    }

    #[test]
    fn rate_is_keyed_by_email_and_action() {
        let limiter = Arc::new(RateLimiter::new(1, Duration::from_secs(60)));
        let mut session = CertificateSession::new(config(), Arc::clone(&limiter), None).unwrap();
        session.update_field("student.email", "").unwrap();
        assert!(session.check_rate("generate-pdf").is_ok());
        assert!(matches!(
            session.check_rate("generate-pdf"),
            Err(CertificateError::RateLimited)
        ));
        assert!(session.check_rate("generate-png").is_ok());
        assert_eq!(limiter.count("anonymous-generate-pdf"), Some(1));
    }

    #[tokio::test]
    async fn generate_validates_first() {
        let mut session = session_with(sample_record());
        session.update_field("course.title", "").unwrap();
        let err = session.generate_pdf(ExportOptions::preview()).await.unwrap_err();
        assert!(matches!(err, CertificateError::Validation(_)));
        assert!(!session.errors().is_empty());
    }

    #[tokio::test]
    async fn generate_png_on_worker_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = AutosaveStore::in_memory("k").unwrap();
        store.save(&sample_record(), "classic").unwrap();
        let config = GeneratorConfig {
            output_dir: dir.path().to_path_buf(),
            ..config()
        };
        let session =
            CertificateSession::new(config, Arc::new(RateLimiter::default()), Some(store)).unwrap();
        let doc = session
            .generate_png(ExportOptions::preview().with_scale(0.5))
            .await
            .unwrap();
        assert_eq!(doc.kind, DocumentKind::Png);
        assert!(!session.is_generating());

        let path = session.save_document(&doc).unwrap();
        assert_eq!(path, dir.path().join(&doc.file_name));
    }

    #[tokio::test]
    async fn overlapping_exports_are_busy() {
        let session = session_with(sample_record());
        let options = ExportOptions::preview().with_scale(0.5);
        let (first, second) = tokio::join!(
            session.generate_png(options.clone()),
            session.generate_png(options.clone())
        );
        assert!(first.is_ok());
        assert!(matches!(second, Err(CertificateError::Busy)));
        assert!(!session.is_generating());
    }

    #[tokio::test]
    async fn held_guard_blocks_export() {
        let session = session_with(sample_record());
        let held = InFlight::acquire(&session.generating).unwrap();
        let err = session
            .generate_png(ExportOptions::preview().with_scale(0.5))
            .await
            .unwrap_err();
        assert!(matches!(err, CertificateError::Busy));
        drop(held);
        assert!(!session.is_generating());
    }

    #[tokio::test]
    async fn missing_fonts_are_a_capability_error() {
        let config = GeneratorConfig {
            fonts_dir: "/nonexistent/fonts".into(),
            ..GeneratorConfig::default()
        };
        let store = AutosaveStore::in_memory("k").unwrap();
        store.save(&sample_record(), "classic").unwrap();
        let session =
            CertificateSession::new(config, Arc::new(RateLimiter::default()), Some(store)).unwrap();
        let err = session.generate_pdf(ExportOptions::preview()).await.unwrap_err();
        assert!(matches!(err, CertificateError::Capability(_)));
    }
}
