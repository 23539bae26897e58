//! Icon decoding and normalization.
//!
//! Downloaded bodies are decoded as a raster image first and as SVG
//! second, checked against a minimum size, then fitted into a square
//! transparent canvas without distorting the aspect ratio.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use resvg::{tiny_skia, usvg};

use crate::error::FailureReason;

/// Largest intrinsic SVG edge that will be rasterized.
pub const MAX_SVG_SIDE: u32 = 4096;

/// Decode an icon body into an image.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, FailureReason> {
    let raster = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| FailureReason::Decode(e.to_string()))
        .and_then(|reader| reader.decode().map_err(|e| FailureReason::Decode(e.to_string())));

    match raster {
        Ok(img) => Ok(img),
        Err(_) if looks_like_svg(bytes) => rasterize_svg(bytes),
        Err(e) => Err(e),
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    String::from_utf8_lossy(head).contains("<svg")
}

/// Render an SVG document at its intrinsic size.
fn rasterize_svg(bytes: &[u8]) -> Result<DynamicImage, FailureReason> {
    let opt = usvg::Options::default();
    let tree =
        usvg::Tree::from_data(bytes, &opt).map_err(|e| FailureReason::Decode(e.to_string()))?;
    let size = tree.size().to_int_size();
    if size.width() > MAX_SVG_SIDE || size.height() > MAX_SVG_SIDE {
        return Err(FailureReason::TooLarge(format!(
            "svg {}x{} exceeds {}px",
            size.width(),
            size.height(),
            MAX_SVG_SIDE
        )));
    }

    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        FailureReason::Decode(format!("cannot allocate {}x{}", size.width(), size.height()))
    })?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let mut img = RgbaImage::new(size.width(), size.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(DynamicImage::ImageRgba8(img))
}

/// Reject degenerate images smaller than `min` on either side.
pub fn validate(img: &DynamicImage, min: u32) -> Result<(), FailureReason> {
    let (width, height) = (img.width(), img.height());
    if width < min || height < min {
        return Err(FailureReason::TooSmall { width, height, min });
    }
    Ok(())
}

/// Scale `img` to fit inside a `size`×`size` box and centre it on a
/// transparent canvas of exactly that size.
pub fn fit_padded(img: &DynamicImage, size: u32) -> RgbaImage {
    let size = size.max(1);
    let (w, h) = (img.width().max(1), img.height().max(1));
    let scale = (size as f64 / w as f64).min(size as f64 / h as f64);
    let nw = ((w as f64 * scale).round() as u32).clamp(1, size);
    let nh = ((h as f64 * scale).round() as u32).clamp(1, size);

    // Nearest keeps pixel-art edges hard.
    let resized = imageops::resize(&img.to_rgba8(), nw, nh, FilterType::Nearest);

    let mut canvas = RgbaImage::new(size, size);
    let x = (size - nw) / 2;
    let y = (size - nh) / 2;
    imageops::replace(&mut canvas, &resized, x as i64, y as i64);
    canvas
}

/// Encode as PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, color);
    encode_png(&img).unwrap()
}
