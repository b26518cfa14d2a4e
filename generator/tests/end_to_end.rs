mod support;

use generator::export::DocumentKind;
use generator::security::{validate, verification_code, RateLimiter};
use generator::storage::AutosaveStore;
use generator::{CertificateSession, GeneratorConfig};
use std::sync::Arc;

#[tokio::test]
async fn sample_certificate_exports_and_saves() {
    support::init_logging();
    let record = support::record();
    assert!(validate(&record).is_valid);

    let dir = tempfile::tempdir().unwrap();
    let config = GeneratorConfig {
        autosave_db: dir.path().join("certificates.sqlite"),
        output_dir: dir.path().to_path_buf(),
        raster_scale: 1.0,
        ..support::config()
    };
    AutosaveStore::from_config(&config)
        .unwrap()
        .save(&record, "classic")
        .unwrap();
    let session = CertificateSession::open(config).unwrap();
    assert_eq!(session.record(), &record);

    let doc = session
        .generate_pdf(session.download_options())
        .await
        .unwrap();

    assert_eq!(doc.kind, DocumentKind::Pdf);
    assert!(!doc.degraded);
    assert!(doc.bytes.starts_with(b"%PDF"));
    assert_eq!(
        doc.file_name,
        "Certificate_John_Doe_Smith_Advanced_React_Development_Course_2024_08_06.pdf"
    );
    assert_eq!(support::info_entry(&doc.bytes, b"Author"), "Tech Academy Online");
    let stamp = format!("VERIFY:{}:CERT-2024-0001", verification_code(&record));
    assert!(support::shows_text(&doc.bytes, "DejaVuSans-Regular.ttf", &stamp));

    let path = session.save_document(&doc).unwrap();
    assert_eq!(path, dir.path().join(&doc.file_name));
    assert_eq!(std::fs::read(path).unwrap(), doc.bytes);
}

#[tokio::test]
async fn rate_limit_applies_per_action() {
    support::init_logging();
    let limiter = Arc::new(RateLimiter::new(1, std::time::Duration::from_secs(60)));
    let store = AutosaveStore::in_memory("certificate-data").unwrap();
    store.save(&support::record(), "classic").unwrap();
    let session =
        CertificateSession::new(support::config(), Arc::clone(&limiter), Some(store)).unwrap();

    let options = session.preview_options().with_scale(0.25);
    session.generate_png(options.clone()).await.unwrap();
    let err = session.generate_png(options.clone()).await.unwrap_err();
    assert!(matches!(err, generator::CertificateError::RateLimited));

    assert_eq!(
        limiter.count("john.smith@example.com-generate-png"),
        Some(1)
    );
    assert!(limiter.count("john.smith@example.com-generate-pdf").is_none());
}
