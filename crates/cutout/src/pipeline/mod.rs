pub mod builder;

use rayon::prelude::*;
use tracing::{debug, info};
use crate::{
    config::{AreaMethod, SegmentationConfig},
    error::Result,
    io,
    traits::{Binarizer, ComponentFinder},
    types::{ExtractedObject, ObjectId, RasterImage},
};

/// Splits an image of objects on light paper into per-object crops.
///
/// Stages: binarize → find outer components → drop those under `min_area` →
/// crop each survivor from the original image. The segmenter holds no mutable
/// state and can be shared across threads.
pub struct Segmenter {
    binarizer: Box<dyn Binarizer>,
    component_finder: Box<dyn ComponentFinder>,
    min_area: u64,
    area_method: AreaMethod,
}

impl Segmenter {
    /// Create a new segmenter builder
    pub fn builder() -> builder::SegmenterBuilder {
        builder::SegmenterBuilder::new()
    }

    pub fn new(
        binarizer: Box<dyn Binarizer>,
        component_finder: Box<dyn ComponentFinder>,
        min_area: u64,
        area_method: AreaMethod,
    ) -> Self {
        Self {
            binarizer,
            component_finder,
            min_area,
            area_method,
        }
    }

    pub fn from_config(config: &SegmentationConfig) -> Self {
        builder::SegmenterBuilder::from_config(config).build()
    }

    /// Decode `bytes` and segment the result.
    pub fn segment_bytes(&self, bytes: &[u8]) -> Result<Vec<ExtractedObject>> {
        let image = io::decode(bytes)?;
        Ok(self.segment(&image))
    }

    /// Extract every qualifying object from `image`, in discovery order.
    ///
    /// An image with no qualifying objects yields an empty vector.
    pub fn segment(&self, image: &RasterImage) -> Vec<ExtractedObject> {
        let mask = self.binarizer.binarize(image);
        let map = self.component_finder.find_components(&mask);
        let found = map.components.len();

        let survivors: Vec<_> = map
            .components
            .iter()
            .filter(|component| {
                let area = component.area(self.area_method);
                let keep = area >= self.min_area as f64;
                if !keep {
                    debug!(
                        label = component.label,
                        area,
                        min_area = self.min_area,
                        "Discarding component below minimum area"
                    );
                }
                keep
            })
            .collect();

        let objects: Vec<ExtractedObject> = survivors
            .par_iter()
            .enumerate()
            .map(|(index, component)| {
                debug_assert!(component.bbox.fits_within(image.width(), image.height()));
                let id = ObjectId::from_index(index as u32 + 1);
                let area = component.area(self.area_method).round() as u64;
                ExtractedObject::new(id, component.bbox, image.crop(&component.bbox))
                    .with_area(area)
                    .with_mask(map.mask_for(component))
            })
            .collect();

        info!(
            width = image.width(),
            height = image.height(),
            components = found,
            objects = objects.len(),
            "Segmented image"
        );
        objects
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::builder().build()
    }
}
