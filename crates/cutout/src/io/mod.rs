//! Decoding raw uploads and encoding finished images

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use crate::{
    error::{CutoutError, Result},
    types::RasterImage,
};

/// File extension of encoded output
pub const OUTPUT_EXTENSION: &str = "png";

/// Decode image bytes into an 8-bit RGB or RGBA raster.
///
/// Grayscale becomes RGB, grayscale with alpha becomes RGBA, and deeper sample
/// formats are reduced to 8 bits. Empty or unrecognised input is a
/// [`CutoutError::Decode`].
pub fn decode(bytes: &[u8]) -> Result<RasterImage> {
    if bytes.is_empty() {
        return Err(CutoutError::Decode("input is empty".to_string()));
    }
    let image = image::load_from_memory(bytes).map_err(|e| CutoutError::Decode(e.to_string()))?;
    Ok(from_dynamic(image))
}

/// Normalise any decoded image to the two supported layouts.
pub fn from_dynamic(image: DynamicImage) -> RasterImage {
    match image {
        DynamicImage::ImageRgb8(img) => RasterImage::Rgb(img),
        DynamicImage::ImageRgba8(img) => RasterImage::Rgba(img),
        other if other.color().has_alpha() => RasterImage::Rgba(other.into_rgba8()),
        other => RasterImage::Rgb(other.into_rgb8()),
    }
}

/// Losslessly encode `image` as PNG, keeping its channel layout.
pub fn encode_png(image: &RasterImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .to_dynamic()
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(CutoutError::Encode)?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayAlphaImage, GrayImage, LumaA, Rgb, RgbImage};

    #[test]
    fn test_empty_input_is_decode_error() {
        assert!(matches!(decode(&[]), Err(CutoutError::Decode(_))));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        assert!(matches!(decode(b"definitely not an image"), Err(CutoutError::Decode(_))));
    }

    #[test]
    fn test_png_keeps_layout() {
        let rgb = RasterImage::from(RgbImage::from_pixel(4, 3, Rgb([10, 20, 30])));
        let decoded = decode(&encode_png(&rgb).unwrap()).unwrap();
        assert_eq!(decoded, rgb);
    }

    #[test]
    fn test_gray_sources_are_widened() {
        let gray = DynamicImage::ImageLuma8(GrayImage::new(2, 2));
        assert_eq!(from_dynamic(gray).channels(), 3);

        let gray_alpha = DynamicImage::ImageLumaA8(GrayAlphaImage::from_pixel(2, 2, LumaA([7, 9])));
        let RasterImage::Rgba(img) = from_dynamic(gray_alpha) else {
            panic!("alpha was dropped");
        };
        assert_eq!(img.get_pixel(0, 0).0, [7, 7, 7, 9]);
    }
}
