mod support;

use generator::export::{ExportOptions, Exporter, Rasterize};
use generator::render::Surface;
use generator::ExportError;
use common::model::template;
use image::RgbaImage;

/// Always fails, to drive the text-only path.
struct BrokenRasterizer;

impl Rasterize for BrokenRasterizer {
    fn rasterize(
        &self,
        _surface: &Surface,
        _scale: f32,
        _watermark: Option<&str>,
    ) -> Result<RgbaImage, ExportError> {
        Err(ExportError::Raster("canvas unavailable".to_string()))
    }
}

#[test]
fn raster_failure_degrades_to_text_pdf() {
    support::init_logging();
    let exporter = Exporter::with_rasterizer(&support::config(), BrokenRasterizer);
    let record = support::record();
    let doc = exporter
        .export_pdf(&record, &template::find("classic").unwrap(), &ExportOptions::preview())
        .unwrap();

    assert!(doc.degraded);
    assert!(doc.bytes.starts_with(b"%PDF"));
    let bold = "DejaVuSans-Bold.ttf";
    let regular = "DejaVuSans-Regular.ttf";
    assert!(support::shows_text(&doc.bytes, bold, "John Doe Smith"));
    assert!(support::shows_text(&doc.bytes, bold, "Advanced React Development Course"));
    assert!(support::shows_text(&doc.bytes, regular, "Issued by: Tech Academy Online"));
    assert!(support::shows_text(&doc.bytes, regular, "Certificate ID: CERT-2024-0001"));
    assert_eq!(support::info_entry(&doc.bytes, b"Author"), "Tech Academy Online");
}

#[test]
fn png_export_does_not_fall_back() {
    support::init_logging();
    let exporter = Exporter::with_rasterizer(&support::config(), BrokenRasterizer);
    let err = exporter
        .export_png(
            &support::record(),
            &template::find("classic").unwrap(),
            &ExportOptions::preview(),
        )
        .unwrap_err();
    assert!(matches!(err, ExportError::Raster(_)));
}
