use image::{GrayImage, Luma};
use crate::{config::DEFAULT_THRESHOLD, traits::Binarizer, types::RasterImage};

/// Rec. 601 luma weights, in thousandths
const LUMA_WEIGHTS: [u32; 3] = [299, 587, 114];

fn luma(r: u8, g: u8, b: u8) -> u8 {
    let [wr, wg, wb] = LUMA_WEIGHTS;
    let weighted = wr * u32::from(r) + wg * u32::from(g) + wb * u32::from(b);
    ((weighted + 500) / 1000) as u8
}

/// Single-channel luminance of `image`. Alpha is ignored.
pub fn luminance(image: &RasterImage) -> GrayImage {
    match image {
        RasterImage::Rgb(img) => GrayImage::from_fn(img.width(), img.height(), |x, y| {
            let [r, g, b] = img.get_pixel(x, y).0;
            Luma([luma(r, g, b)])
        }),
        RasterImage::Rgba(img) => GrayImage::from_fn(img.width(), img.height(), |x, y| {
            let [r, g, b, _] = img.get_pixel(x, y).0;
            Luma([luma(r, g, b)])
        }),
    }
}

/// Fixed-threshold binarizer for objects on light paper.
///
/// Luminance strictly above `threshold` is background; everything else,
/// including pixels exactly at the threshold, is foreground.
#[derive(Debug, Clone)]
pub struct LuminanceThreshold {
    pub threshold: u8,
}

impl Default for LuminanceThreshold {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD }
    }
}

impl Binarizer for LuminanceThreshold {
    fn binarize(&self, image: &RasterImage) -> GrayImage {
        let gray = luminance(image);
        let mut mask = imageproc::contrast::threshold(&gray, self.threshold, imageproc::contrast::ThresholdType::Binary);
        image::imageops::invert(&mut mask);
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_luma_weights() {
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut img = RgbImage::from_pixel(3, 1, Rgb([255, 255, 255]));
        img.put_pixel(0, 0, Rgb([240, 240, 240]));
        img.put_pixel(1, 0, Rgb([241, 241, 241]));
        let mask = LuminanceThreshold::default().binarize(&RasterImage::from(img));

        assert_eq!(mask.get_pixel(0, 0)[0], 255, "luma == 240 is foreground");
        assert_eq!(mask.get_pixel(1, 0)[0], 0);
        assert_eq!(mask.get_pixel(2, 0)[0], 0);
    }

    #[test]
    fn test_alpha_is_ignored() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([255, 255, 255, 0]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
        let mask = LuminanceThreshold::default().binarize(&RasterImage::from(img));

        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(1, 0)[0], 255, "transparent dark pixel still counts");
    }
}
