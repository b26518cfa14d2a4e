//! PDF assembly with genpdf, plus metadata stamping with lopdf.
//!
//! The main path embeds the rasterized certificate as a single image centered
//! on the page, followed by a near-invisible verification stamp. The fallback
//! path lays the essential facts out as plain centered paragraphs.

use super::{DocumentMetadata, Orientation, PageFormat};
use crate::error::ExportError;
use common::model::certificate::CertificateRecord;
use genpdf::elements::{Break, Image as PdfImage, Paragraph};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Color as PdfColor, Style};
use genpdf::{Alignment, Document, Element as _, SimplePageDecorator, Size};
use image::{DynamicImage, RgbaImage};
use lopdf::{Dictionary, Object, StringFormat};
use png::{BitDepth as PngBitDepth, ColorType as PngColorType, Encoder as PngEncoder};
use std::path::Path;
use tempfile::NamedTempFile;

const MARGIN_MM: f64 = 5.0;
/// Vertical room kept free below the image for the stamp line.
const STAMP_ROOM_MM: f64 = 15.0;
const MM_PER_INCH: f64 = 25.4;

impl PageFormat {
    /// Portrait width and height in millimetres.
    fn portrait_mm(self) -> (f64, f64) {
        match self {
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::Letter => (215.9, 279.4),
            PageFormat::A3 => (297.0, 420.0),
        }
    }
}

pub(crate) fn page_size_mm(format: PageFormat, orientation: Orientation) -> (f64, f64) {
    let (w, h) = format.portrait_mm();
    match orientation {
        Orientation::Portrait => (w, h),
        Orientation::Landscape => (h, w),
    }
}

/// Loads `<family>-Regular/Bold/Italic/BoldItalic.ttf` from `fonts_dir`.
pub(crate) fn load_family(
    fonts_dir: &Path,
    family: &str,
) -> Result<FontFamily<FontData>, ExportError> {
    Ok(genpdf::fonts::from_files(fonts_dir, family, None)?)
}

fn configure_document(family: FontFamily<FontData>, title: &str, page: (f64, f64)) -> Document {
    let mut doc = Document::new(family);
    doc.set_title(title);
    doc.set_paper_size(Size::new(page.0, page.1));
    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(5);
    doc.set_page_decorator(decorator);
    doc
}

/// Flattens alpha over white and writes an RGB PNG to a temporary file.
///
/// The returned handle must outlive rendering; dropping it deletes the file.
fn write_temp_png(raster: &RgbaImage) -> Result<NamedTempFile, ExportError> {
    let (w, h) = raster.dimensions();
    let mut background = RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut background, raster, 0, 0);
    let raw = DynamicImage::ImageRgba8(background).to_rgb8().into_raw();

    let mut tmp = tempfile::Builder::new()
        .prefix("certificate-")
        .suffix(".png")
        .tempfile()?;
    {
        let file = tmp.as_file_mut();
        let mut encoder = PngEncoder::new(file, w, h);
        encoder.set_color(PngColorType::Rgb);
        encoder.set_depth(PngBitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&raw)?;
        writer.finish()?;
    }
    Ok(tmp)
}

/// DPI at which `px_w × px_h` fills the printable area without overflowing it.
fn fitting_dpi(px_w: u32, px_h: u32, page: (f64, f64)) -> f64 {
    let avail_w = page.0 - 2.0 * MARGIN_MM;
    let avail_h = page.1 - 2.0 * MARGIN_MM - STAMP_ROOM_MM;
    let by_width = px_w as f64 * MM_PER_INCH / avail_w;
    let by_height = px_h as f64 * MM_PER_INCH / avail_h;
    by_width.max(by_height)
}

/// Renders the raster into a one-page PDF followed by the verification stamp.
pub(crate) fn raster_pdf(
    raster: &RgbaImage,
    family: FontFamily<FontData>,
    title: &str,
    stamp: &str,
    page: (f64, f64),
) -> Result<Vec<u8>, ExportError> {
    let mut doc = configure_document(family, title, page);

    // Kept alive until render returns.
    let tmp = write_temp_png(raster)?;
    let mut img_elem = PdfImage::from_path(tmp.path())?.with_alignment(Alignment::Center);
    let (w, h) = raster.dimensions();
    img_elem.set_dpi(fitting_dpi(w, h, page));
    doc.push(img_elem);

    doc.push(
        Paragraph::new(stamp).styled(
            Style::new()
                .with_font_size(1)
                .with_color(PdfColor::Rgb(254, 254, 254)),
        ),
    );

    let mut out = Vec::new();
    doc.render(&mut out)?;
    drop(tmp);
    Ok(out)
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        placeholder
    } else {
        trimmed
    }
}

/// Text lines of the fallback document with their font size and weight.
pub(crate) fn fallback_lines(record: &CertificateRecord) -> Vec<(String, u8, bool)> {
    let title = or_placeholder(&record.certificate_title, "Certificate of Completion");
    vec![
        (title.to_uppercase(), 20, true),
        ("This certifies that".to_string(), 16, false),
        (or_placeholder(&record.student.name, "Student Name").to_string(), 18, true),
        ("has completed the course".to_string(), 14, false),
        (or_placeholder(&record.course.title, "Course Title").to_string(), 16, true),
        (
            format!(
                "Issued by: {}",
                or_placeholder(&record.institution.name, "Institution")
            ),
            12,
            false,
        ),
        (format!("Date: {}", record.issue_date.trim()), 12, false),
        (format!("Certificate ID: {}", record.id.trim()), 12, false),
    ]
}

/// A text-only certificate. Returns the bytes and the lines drawn.
pub(crate) fn fallback_pdf(
    record: &CertificateRecord,
    family: FontFamily<FontData>,
    title: &str,
    page: (f64, f64),
) -> Result<(Vec<u8>, Vec<String>), ExportError> {
    let mut doc = configure_document(family, title, page);
    doc.push(Break::new(4));

    let lines = fallback_lines(record);
    for (i, (text, size, bold)) in lines.iter().enumerate() {
        let mut style = Style::new().with_font_size(*size);
        if *bold {
            style = style.bold();
        }
        doc.push(
            Paragraph::new(text.as_str())
                .aligned(Alignment::Center)
                .styled(style),
        );
        if i == 0 || i == 4 {
            doc.push(Break::new(1.5));
        } else {
            doc.push(Break::new(0.5));
        }
    }

    let mut out = Vec::new();
    doc.render(&mut out)?;
    Ok((out, lines.into_iter().map(|(text, ..)| text).collect()))
}

/// A PDF text string: literal for ASCII, UTF-16BE with a byte order mark otherwise.
fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::string_literal(value);
    }
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(value.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn fill_info(dict: &mut Dictionary, meta: &DocumentMetadata) {
    dict.set("Title", text_string(&meta.title));
    dict.set("Author", text_string(&meta.author));
    dict.set("Subject", text_string(&meta.subject));
    dict.set("Creator", text_string(&meta.creator));
}

/// Rewrites the document information dictionary of a rendered PDF.
pub(crate) fn stamp_metadata(bytes: &[u8], meta: &DocumentMetadata) -> Result<Vec<u8>, ExportError> {
    let mut doc = lopdf::Document::load_mem(bytes)?;

    let info_ref = doc
        .trailer
        .get(b"Info")
        .and_then(|info| info.as_reference())
        .ok();
    let updated = match info_ref {
        Some(id) => match doc.get_object_mut(id).and_then(|o| o.as_dict_mut()) {
            Ok(dict) => {
                fill_info(dict, meta);
                true
            }
            Err(_) => false,
        },
        None => match doc.trailer.get_mut(b"Info") {
            Ok(Object::Dictionary(dict)) => {
                fill_info(dict, meta);
                true
            }
            _ => false,
        },
    };
    if !updated {
        let mut dict = Dictionary::new();
        fill_info(&mut dict, meta);
        let id = doc.add_object(dict);
        doc.trailer.set("Info", id);
    }

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}
