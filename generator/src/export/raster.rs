//! Software rasterizer for the drawing surface.
//!
//! Shapes are alpha-blended straight into an RGBA buffer; text goes through
//! rusttype using the TTF files from the configured fonts directory. Corner
//! radii are not drawn: borders come out square.

use crate::error::ExportError;
use crate::layout::{Anchor, Color, ElementKind, FontFamily, Stroke, TextStyle};
use crate::render::surface::Surface;
use image::imageops::FilterType;
use image::{GrayImage, Luma, Rgba, RgbaImage};
use log::debug;
use once_cell::sync::OnceCell;
use rusttype::{point, Font, Scale};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Font files the rasterizer needs, relative to the fonts directory.
pub const REQUIRED_FONTS: [&str; 7] = [
    "DejaVuSans-Regular.ttf",
    "DejaVuSans-Bold.ttf",
    "DejaVuSans-Italic.ttf",
    "DejaVuSans-BoldItalic.ttf",
    "DejaVuSerif-Regular.ttf",
    "DejaVuSerif-Bold.ttf",
    "DejaVuSansMono-Regular.ttf",
];

/// Largest accepted device-pixel scale. At 8.0 the buffer is 8192×6144 RGBA
/// (about 200 MB); anything larger is refused before allocating.
pub const MAX_SCALE: f32 = 8.0;

const WATERMARK_SIZE: f32 = 28.0;
const WATERMARK_ANGLE_DEG: f32 = -30.0;
const WATERMARK_OPACITY: f32 = 0.12;
const WATERMARK_COLOR: Color = Color::rgb(128, 128, 128);

/// Turns a surface into pixels.
pub trait Rasterize: Send + Sync {
    /// Paints `surface` at `scale` device pixels per logical pixel, with an
    /// optional diagonal watermark tiled over the result.
    fn rasterize(
        &self,
        surface: &Surface,
        scale: f32,
        watermark: Option<&str>,
    ) -> Result<RgbaImage, ExportError>;
}

pub(crate) fn load_font(path: &Path) -> Result<Font<'static>, ExportError> {
    let bytes = fs::read(path)
        .map_err(|e| ExportError::Raster(format!("cannot read {}: {}", path.display(), e)))?;
    Font::try_from_vec(bytes).ok_or_else(|| {
        ExportError::Raster(format!("{} is not a usable TrueType font", path.display()))
    })
}

struct FontSet {
    sans: [Font<'static>; 4],
    serif: [Font<'static>; 2],
    mono: Font<'static>,
}

impl FontSet {
    fn load(dir: &Path) -> Result<Self, ExportError> {
        let mut fonts = REQUIRED_FONTS
            .iter()
            .map(|name| load_font(&dir.join(name)))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter();
        let mut next = || {
            fonts
                .next()
                .ok_or_else(|| ExportError::Raster("font list exhausted".to_string()))
        };
        Ok(Self {
            sans: [next()?, next()?, next()?, next()?],
            serif: [next()?, next()?],
            mono: next()?,
        })
    }

    fn pick(&self, style: &TextStyle) -> &Font<'static> {
        match style.family {
            FontFamily::Sans => match (style.bold, style.italic) {
                (false, false) => &self.sans[0],
                (true, false) => &self.sans[1],
                (false, true) => &self.sans[2],
                (true, true) => &self.sans[3],
            },
            FontFamily::Serif if style.bold => &self.serif[1],
            FontFamily::Serif => &self.serif[0],
            FontFamily::Mono => &self.mono,
        }
    }
}

/// The production rasterizer. Fonts are loaded on first use and kept.
pub struct SurfaceRasterizer {
    fonts_dir: PathBuf,
    fonts: OnceCell<FontSet>,
}

impl SurfaceRasterizer {
    pub fn new(fonts_dir: impl Into<PathBuf>) -> Self {
        Self {
            fonts_dir: fonts_dir.into(),
            fonts: OnceCell::new(),
        }
    }

    fn fonts(&self) -> Result<&FontSet, ExportError> {
        self.fonts.get_or_try_init(|| FontSet::load(&self.fonts_dir))
    }
}

impl Rasterize for SurfaceRasterizer {
    fn rasterize(
        &self,
        surface: &Surface,
        scale: f32,
        watermark: Option<&str>,
    ) -> Result<RgbaImage, ExportError> {
        if !scale.is_finite() || scale <= 0.0 || scale > MAX_SCALE {
            return Err(ExportError::Raster(format!(
                "invalid scale {} (expected 0 < scale <= {})",
                scale, MAX_SCALE
            )));
        }
        let started = Instant::now();
        let fonts = self.fonts()?;
        let width = (surface.width * scale).round() as u32;
        let height = (surface.height * scale).round() as u32;
        if width == 0 || height == 0 {
            return Err(ExportError::Raster("empty surface".to_string()));
        }

        let bg = surface.background;
        let mut img = RgbaImage::from_pixel(width, height, Rgba([bg.r, bg.g, bg.b, 255]));

        for object in &surface.objects {
            match &object.kind {
                ElementKind::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    stroke,
                    opacity,
                    ..
                } => {
                    let (x0, y0) = (x * scale, y * scale);
                    let (x1, y1) = ((x + width) * scale, (y + height) * scale);
                    if let Some(fill) = fill {
                        fill_rect(&mut img, x0, y0, x1, y1, *fill, *opacity);
                    }
                    if let Some(stroke) = stroke {
                        let s = scaled(stroke, scale);
                        segment(&mut img, x0, y0, x1, y0, &s, *opacity);
                        segment(&mut img, x1, y0, x1, y1, &s, *opacity);
                        segment(&mut img, x1, y1, x0, y1, &s, *opacity);
                        segment(&mut img, x0, y1, x0, y0, &s, *opacity);
                    }
                }
                ElementKind::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    stroke,
                } => segment(
                    &mut img,
                    x1 * scale,
                    y1 * scale,
                    x2 * scale,
                    y2 * scale,
                    &scaled(stroke, scale),
                    1.0,
                ),
                ElementKind::Dot {
                    cx,
                    cy,
                    radius,
                    color,
                    opacity,
                } => fill_circle(&mut img, cx * scale, cy * scale, radius * scale, *color, *opacity),
                ElementKind::Text { x, y, text, style } => {
                    draw_text(&mut img, fonts.pick(style), text, *x, *y, style, scale)
                }
                ElementKind::Image {
                    x,
                    y,
                    width,
                    height,
                    opacity,
                    logo,
                } => {
                    let w = ((width * scale).round() as u32).max(1);
                    let h = ((height * scale).round() as u32).max(1);
                    let resized = image::imageops::resize(&*logo.pixels, w, h, FilterType::Lanczos3);
                    overlay(
                        &mut img,
                        &resized,
                        (x * scale).round() as i32,
                        (y * scale).round() as i32,
                        *opacity,
                    );
                }
                ElementKind::QrPlaceholder {
                    x,
                    y,
                    size,
                    color,
                    opacity,
                    ..
                } => fill_rect(
                    &mut img,
                    x * scale,
                    y * scale,
                    (x + size) * scale,
                    (y + size) * scale,
                    *color,
                    *opacity,
                ),
            }
        }

        if let Some(text) = watermark.filter(|t| !t.trim().is_empty()) {
            apply_watermark(&mut img, &fonts.sans[1], text, scale);
        }

        debug!(
            "rasterized {}x{} surface ({} objects) in {:?}",
            width,
            height,
            surface.objects.len(),
            started.elapsed()
        );
        Ok(img)
    }
}

fn scaled(stroke: &Stroke, scale: f32) -> Stroke {
    Stroke {
        color: stroke.color,
        width: stroke.width * scale,
        dash: stroke.dash.map(|d| d * scale),
    }
}

fn blend(img: &mut RgbaImage, x: i32, y: i32, color: Color, alpha: f32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x >= img.width() || y >= img.height() {
        return;
    }
    let a = alpha.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    let inv = 1.0 - a;
    let dst = img.get_pixel_mut(x, y);
    dst.0[0] = (color.r as f32 * a + dst.0[0] as f32 * inv).round() as u8;
    dst.0[1] = (color.g as f32 * a + dst.0[1] as f32 * inv).round() as u8;
    dst.0[2] = (color.b as f32 * a + dst.0[2] as f32 * inv).round() as u8;
    dst.0[3] = 255;
}

/// Fills the pixel span covering `[x0, x1) × [y0, y1)`, at least one pixel wide.
fn fill_rect(img: &mut RgbaImage, x0: f32, y0: f32, x1: f32, y1: f32, color: Color, alpha: f32) {
    let (left, right) = (x0.min(x1).round() as i32, x0.max(x1).round() as i32);
    let (top, bottom) = (y0.min(y1).round() as i32, y0.max(y1).round() as i32);
    for y in top..bottom.max(top + 1) {
        for x in left..right.max(left + 1) {
            blend(img, x, y, color, alpha);
        }
    }
}

/// Strokes a line centered on the segment. Axis-aligned segments (everything
/// the layout produces) are filled exactly; others are stamped.
fn segment(img: &mut RgbaImage, x1: f32, y1: f32, x2: f32, y2: f32, stroke: &Stroke, alpha: f32) {
    let half = stroke.width / 2.0;
    let length = ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt();
    if length <= f32::EPSILON {
        return;
    }
    let (dx, dy) = ((x2 - x1) / length, (y2 - y1) / length);
    let runs: Vec<(f32, f32)> = match stroke.dash {
        Some(dash) if dash > 0.0 => {
            let mut runs = Vec::new();
            let mut start = 0.0;
            while start < length {
                runs.push((start, (start + dash).min(length)));
                start += dash * 2.0;
            }
            runs
        }
        _ => vec![(0.0, length)],
    };

    let axis_aligned = dx.abs() < 1e-6 || dy.abs() < 1e-6;
    for (from, to) in runs {
        let (ax, ay) = (x1 + dx * from, y1 + dy * from);
        let (bx, by) = (x1 + dx * to, y1 + dy * to);
        if axis_aligned {
            if dy.abs() < 1e-6 {
                fill_rect(img, ax, ay - half, bx, by + half, stroke.color, alpha);
            } else {
                fill_rect(img, ax - half, ay, bx + half, by, stroke.color, alpha);
            }
        } else {
            let steps = ((to - from) * 2.0).ceil() as i32;
            for i in 0..=steps {
                let t = from + (to - from) * i as f32 / steps.max(1) as f32;
                let (cx, cy) = (x1 + dx * t, y1 + dy * t);
                fill_rect(img, cx - half, cy - half, cx + half, cy + half, stroke.color, alpha);
            }
        }
    }
}

fn fill_circle(img: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: Color, alpha: f32) {
    let r2 = radius * radius;
    let (x0, x1) = ((cx - radius).floor() as i32, (cx + radius).ceil() as i32);
    let (y0, y1) = ((cy - radius).floor() as i32, (cy + radius).ceil() as i32);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let (px, py) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
            if px * px + py * py <= r2 {
                blend(img, x, y, color, alpha);
            }
        }
    }
}

fn overlay(base: &mut RgbaImage, top: &RgbaImage, x: i32, y: i32, opacity: f32) {
    for (ox, oy, p) in top.enumerate_pixels() {
        let a = p.0[3] as f32 / 255.0 * opacity;
        let color = Color::rgb(p.0[0], p.0[1], p.0[2]);
        blend(base, x + ox as i32, y + oy as i32, color, a);
    }
}

fn text_width(font: &Font<'static>, scale: Scale, text: &str) -> f32 {
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

fn draw_text(
    img: &mut RgbaImage,
    font: &Font<'static>,
    text: &str,
    x: f32,
    y: f32,
    style: &TextStyle,
    scale: f32,
) {
    let px = Scale::uniform(style.size * scale);
    let v_metrics = font.v_metrics(px);
    let left = match style.anchor {
        Anchor::Start => x * scale,
        Anchor::Center => x * scale - text_width(font, px, text) / 2.0,
    };
    let baseline = y * scale + v_metrics.ascent;

    for glyph in font.layout(text, px, point(left, baseline)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                blend(
                    img,
                    gx as i32 + bb.min.x,
                    gy as i32 + bb.min.y,
                    style.color,
                    coverage * style.opacity,
                );
            });
        }
    }
}

/// Tiles `text` diagonally across the whole image.
///
/// The text is rendered once into a coverage tile; every output pixel is then
/// mapped back into tile space through the inverse rotation.
fn apply_watermark(img: &mut RgbaImage, font: &Font<'static>, text: &str, scale: f32) {
    let px = Scale::uniform(WATERMARK_SIZE * scale);
    let v_metrics = font.v_metrics(px);
    let tile_w = text_width(font, px, text).ceil().max(1.0) as u32;
    let tile_h = (v_metrics.ascent - v_metrics.descent).ceil().max(1.0) as u32;

    let mut tile = GrayImage::new(tile_w, tile_h);
    for glyph in font.layout(text, px, point(0.0, v_metrics.ascent)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                let (x, y) = (gx as i32 + bb.min.x, gy as i32 + bb.min.y);
                if x >= 0 && y >= 0 && (x as u32) < tile_w && (y as u32) < tile_h {
                    tile.put_pixel(x as u32, y as u32, Luma([(coverage * 255.0) as u8]));
                }
            });
        }
    }

    let step_x = tile_w as f32 + 80.0 * scale;
    let step_y = tile_h as f32 * 4.0;
    let (sin, cos) = WATERMARK_ANGLE_DEG.to_radians().sin_cos();
    let (width, height) = img.dimensions();
    for y in 0..height {
        for x in 0..width {
            let (fx, fy) = (x as f32, y as f32);
            let u = (fx * cos + fy * sin).rem_euclid(step_x);
            let row = ((-fx * sin + fy * cos) / step_y).floor();
            // Alternate rows are shifted by half a step.
            let u = (u + if row as i64 % 2 == 0 { 0.0 } else { step_x / 2.0 }).rem_euclid(step_x);
            let v = (-fx * sin + fy * cos).rem_euclid(step_y);
            if u >= tile_w as f32 || v >= tile_h as f32 {
                continue;
            }
            let coverage = tile.get_pixel(u as u32, v as u32).0[0] as f32 / 255.0;
            if coverage > 0.0 {
                blend(img, x as i32, y as i32, WATERMARK_COLOR, coverage * WATERMARK_OPACITY);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::layout::{compose, Field, RenderMode};
    use crate::record::tests::sample_record;
    use crate::render::surface::draw;
    use common::model::template;

    pub(crate) fn fonts_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fonts")
    }

    fn surface() -> Surface {
        draw(&compose(
            &sample_record(),
            &template::find("classic").unwrap(),
            RenderMode::display(),
            None,
        ))
    }

    #[test]
    fn paints_background_border_and_text() {
        let rasterizer = SurfaceRasterizer::new(fonts_dir());
        let img = rasterizer.rasterize(&surface(), 1.0, None).unwrap();
        assert_eq!(img.dimensions(), (1024, 768));

        // Background corner, outside the outer border.
        assert_eq!(img.get_pixel(5, 5), &Rgba([0xf8, 0xfa, 0xfc, 255]));
        // On the 4px outer border (x = 20, centered stroke).
        assert_eq!(img.get_pixel(20, 300), &Rgba([0x25, 0x63, 0xeb, 255]));

        // The recipient name band is not plain background.
        let background = Rgba([0xf8, 0xfa, 0xfc, 255]);
        let inked = (300..720)
            .flat_map(|x| (270..310).map(move |y| (x, y)))
            .filter(|&(x, y)| img.get_pixel(x, y) != &background)
            .count();
        assert!(inked > 500, "name band has only {inked} inked pixels");
    }

    #[test]
    fn scale_multiplies_dimensions() {
        let rasterizer = SurfaceRasterizer::new(fonts_dir());
        let img = rasterizer.rasterize(&surface(), 2.0, None).unwrap();
        assert_eq!(img.dimensions(), (2048, 1536));
    }

    #[test]
    fn watermark_changes_pixels() {
        let rasterizer = SurfaceRasterizer::new(fonts_dir());
        let plain = rasterizer.rasterize(&surface(), 1.0, None).unwrap();
        let marked = rasterizer
            .rasterize(&surface(), 1.0, Some("CERT-ABCDEFGH-2024-08-06"))
            .unwrap();
        assert_ne!(plain.as_raw(), marked.as_raw());
    }

    #[test]
    fn missing_fonts_fail() {
        let rasterizer = SurfaceRasterizer::new("/nonexistent/fonts");
        let err = rasterizer.rasterize(&surface(), 1.0, None).unwrap_err();
        assert!(matches!(err, ExportError::Raster(_)));
    }

    #[test]
    fn rejects_bad_scale() {
        let rasterizer = SurfaceRasterizer::new(fonts_dir());
        assert!(rasterizer.rasterize(&surface(), 0.0, None).is_err());
        assert!(rasterizer.rasterize(&surface(), f32::NAN, None).is_err());
        let err = rasterizer
            .rasterize(&surface(), MAX_SCALE + 0.5, None)
            .unwrap_err();
        assert!(matches!(err, ExportError::Raster(_)));
        assert!(rasterizer.rasterize(&surface(), 100_000.0, None).is_err());
        assert!(surface().objects.iter().any(|o| o.field == Field::Title));
    }
}
