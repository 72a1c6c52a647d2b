use image::{GrayImage, Rgb, RgbImage, Rgba, RgbaImage};
use crate::{
    config::{CompositeConfig, TransparencyMode},
    types::{BackgroundSpec, ExtractedObject, RasterImage},
};

/// `src` over `bg` with 8-bit coverage `alpha`, rounded to nearest.
fn over(src: u8, bg: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    ((u32::from(src) * a + u32::from(bg) * (255 - a) + 127) / 255) as u8
}

/// Product of two 8-bit coverages, rounded to nearest.
fn scale_alpha(alpha: u8, coverage: u8) -> u8 {
    ((u32::from(alpha) * u32::from(coverage) + 127) / 255) as u8
}

/// Places extracted objects on their requested background.
///
/// Pure: the same object and background always yield the same pixels.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    transparency: TransparencyMode,
}

impl Compositor {
    pub fn new(transparency: TransparencyMode) -> Self {
        Self { transparency }
    }

    pub fn from_config(config: &CompositeConfig) -> Self {
        Self::new(config.transparency)
    }

    /// Render `object` on `background`.
    ///
    /// The result is RGBA for [`BackgroundSpec::Transparent`] and RGB otherwise.
    pub fn composite(&self, object: &ExtractedObject, background: &BackgroundSpec) -> RasterImage {
        let mask = match self.transparency {
            TransparencyMode::Canvas => None,
            TransparencyMode::Mask => object.mask(),
        };
        composite_image(object.crop(), mask, background)
    }
}

/// Render a bare crop, optionally limited by a coverage mask of the same size.
pub fn composite_image(
    crop: &RasterImage,
    mask: Option<&GrayImage>,
    background: &BackgroundSpec,
) -> RasterImage {
    let mask = mask.filter(|m| m.dimensions() == crop.dimensions());
    match background.fill() {
        None => RasterImage::Rgba(to_transparent(crop, mask)),
        Some(fill) => RasterImage::Rgb(to_filled(crop, mask, fill)),
    }
}

fn to_transparent(crop: &RasterImage, mask: Option<&GrayImage>) -> RgbaImage {
    let coverage = |x: u32, y: u32| mask.map_or(255, |m| m.get_pixel(x, y)[0]);
    match crop {
        RasterImage::Rgba(img) if mask.is_none() => img.clone(),
        RasterImage::Rgba(img) => RgbaImage::from_fn(img.width(), img.height(), |x, y| {
            let [r, g, b, a] = img.get_pixel(x, y).0;
            Rgba([r, g, b, scale_alpha(a, coverage(x, y))])
        }),
        RasterImage::Rgb(img) => RgbaImage::from_fn(img.width(), img.height(), |x, y| {
            let [r, g, b] = img.get_pixel(x, y).0;
            Rgba([r, g, b, coverage(x, y)])
        }),
    }
}

fn to_filled(crop: &RasterImage, mask: Option<&GrayImage>, fill: Rgb<u8>) -> RgbImage {
    let [fr, fg, fb] = fill.0;
    let coverage = |x: u32, y: u32| mask.map_or(255, |m| m.get_pixel(x, y)[0]);
    match crop {
        RasterImage::Rgb(img) if mask.is_none() => img.clone(),
        RasterImage::Rgb(img) => RgbImage::from_fn(img.width(), img.height(), |x, y| {
            let [r, g, b] = img.get_pixel(x, y).0;
            let a = coverage(x, y);
            Rgb([over(r, fr, a), over(g, fg, a), over(b, fb, a)])
        }),
        RasterImage::Rgba(img) => RgbImage::from_fn(img.width(), img.height(), |x, y| {
            let [r, g, b, alpha] = img.get_pixel(x, y).0;
            let a = scale_alpha(alpha, coverage(x, y));
            Rgb([over(r, fr, a), over(g, fg, a), over(b, fb, a)])
        }),
    }
}
