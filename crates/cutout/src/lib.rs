//! # Cutout
//!
//! Extracts separate objects from a scan or photo of several items lying on
//! light paper, and re-exports each one on a transparent, white or custom
//! coloured background.
//!
//! ## Pipeline
//!
//! - **Segmenter**: luminance → fixed threshold → outer 8-connected components
//!   → noise filter → crops from the original pixels.
//! - **Compositor**: one crop + [`BackgroundSpec`] → finished RGB/RGBA raster.
//! - **Stores**: keyed persistence between extraction and export
//!   ([`MemoryStore`], [`DirectoryStore`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cutout::{BackgroundSpec, composite, encode_png, segment, DEFAULT_MIN_AREA};
//!
//! let bytes = std::fs::read("scan.jpg")?;
//! for object in segment(&bytes, DEFAULT_MIN_AREA)? {
//!     let png = encode_png(&composite(&object, &BackgroundSpec::SolidWhite))?;
//!     std::fs::write(format!("{}.png", object.id()), png)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Session
//!
//! ```rust,no_run
//! use cutout::{BackgroundSpec, ExtractionSession, MemoryStore};
//!
//! let session = ExtractionSession::new(MemoryStore::new());
//! let objects = session.extract(&std::fs::read("scan.png")?)?;
//! let background = BackgroundSpec::from_request("custom", Some("#1a2b3c"))?;
//! let rendered = session.render_batch(&[], &background)?;
//! assert_eq!(rendered.len(), objects.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod config;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod compositor;
pub mod color;
pub mod io;
pub mod store;
pub mod session;

// Re-exports for convenience
pub use error::{CutoutError, Result};
pub use types::{BackgroundSpec, BoundingBox, ExtractedObject, ObjectId, ObjectSummary, RasterImage};
pub use config::{
    AreaMethod, CompositeConfig, CutoutConfig, SegmentationConfig, TransparencyMode,
    DEFAULT_MIN_AREA, DEFAULT_THRESHOLD,
};
pub use traits::*;
pub use pipeline::{Segmenter, builder::SegmenterBuilder};
pub use compositor::{Compositor, composite_image};
pub use color::{BackgroundMode, parse_hex_color};
pub use io::{decode, encode_png};
pub use store::{DirectoryStore, MemoryStore};
pub use session::{ExportRequest, ExtractionSession, RenderedObject};

/// Decode `bytes` and extract every object of at least `min_area` pixels,
/// using the default luminance threshold.
///
/// Fails with [`CutoutError::Decode`] for empty or undecodable input. An image
/// without qualifying objects yields an empty vector.
pub fn segment(bytes: &[u8], min_area: u64) -> Result<Vec<ExtractedObject>> {
    Segmenter::builder().min_area(min_area).build().segment_bytes(bytes)
}

/// Place `object` on `background` with the default (opaque cutout) transparency.
///
/// Callers looking objects up by id must handle a missing crop themselves;
/// stores report it as [`CutoutError::NotFound`].
pub fn composite(object: &ExtractedObject, background: &BackgroundSpec) -> RasterImage {
    Compositor::default().composite(object, background)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn two_squares() -> Vec<u8> {
        let mut img = RgbImage::from_pixel(200, 200, Rgb([255, 255, 255]));
        for (x0, y0) in [(10, 10), (140, 140)] {
            for y in y0..y0 + 50 {
                for x in x0..x0 + 50 {
                    img.put_pixel(x, y, Rgb([0, 0, 0]));
                }
            }
        }
        encode_png(&RasterImage::from(img)).expect("Should encode test image")
    }

    #[test]
    fn test_segment_two_squares() {
        let objects = segment(&two_squares(), DEFAULT_MIN_AREA).expect("Should segment successfully");
        assert_eq!(objects.len(), 2);
        assert_eq!(*objects[0].bbox(), BoundingBox::new(10, 10, 50, 50));
        assert_eq!(*objects[1].bbox(), BoundingBox::new(140, 140, 50, 50));
        assert!(objects.iter().all(|o| o.crop().dimensions() == (50, 50)));
    }

    #[test]
    fn test_segment_rejects_empty_input() {
        assert!(matches!(segment(&[], DEFAULT_MIN_AREA), Err(CutoutError::Decode(_))));
    }

    #[test]
    fn test_composite_white_is_identity_for_opaque_crop() {
        let objects = segment(&two_squares(), DEFAULT_MIN_AREA).expect("Should segment successfully");
        let out = composite(&objects[0], &BackgroundSpec::SolidWhite);
        assert_eq!(&out, objects[0].crop());
    }
}
