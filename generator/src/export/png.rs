use crate::error::ExportError;
use image::RgbaImage;
use png::{BitDepth, ColorType, Encoder};

/// Encodes an RGBA raster as an 8-bit PNG.
pub(crate) fn encode_png(raster: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let (w, h) = raster.dimensions();
    let mut out = Vec::new();
    {
        let mut encoder = Encoder::new(&mut out, w, h);
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(raster.as_raw())?;
        writer.finish()?;
    }
    Ok(out)
}
