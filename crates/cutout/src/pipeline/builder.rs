use crate::{
    algorithms::{ContourComponentFinder, LuminanceThreshold},
    config::{AreaMethod, SegmentationConfig, DEFAULT_MIN_AREA},
    pipeline::Segmenter,
    traits::{Binarizer, ComponentFinder},
};

/// Builder for [`Segmenter`] with a fluent API
pub struct SegmenterBuilder {
    binarizer: Option<Box<dyn Binarizer>>,
    component_finder: Option<Box<dyn ComponentFinder>>,
    min_area: u64,
    area_method: AreaMethod,
}

impl SegmenterBuilder {
    pub fn new() -> Self {
        Self {
            binarizer: None,
            component_finder: None,
            min_area: DEFAULT_MIN_AREA,
            area_method: AreaMethod::default(),
        }
    }

    /// Builder preloaded with the thresholds and area rules of `config`
    pub fn from_config(config: &SegmentationConfig) -> Self {
        Self::new()
            .threshold(config.threshold)
            .min_area(config.min_area)
            .area_method(config.area_method)
    }

    /// Use the luminance binarizer with the given cutoff
    pub fn threshold(self, threshold: u8) -> Self {
        self.set_binarizer(LuminanceThreshold { threshold })
    }

    /// Set the binarizer (replaces any existing one)
    pub fn set_binarizer<B>(mut self, binarizer: B) -> Self
    where
        B: Binarizer + 'static,
    {
        self.binarizer = Some(Box::new(binarizer));
        self
    }

    /// Set the component finder (replaces any existing one)
    pub fn set_component_finder<F>(mut self, finder: F) -> Self
    where
        F: ComponentFinder + 'static,
    {
        self.component_finder = Some(Box::new(finder));
        self
    }

    pub fn min_area(mut self, min_area: u64) -> Self {
        self.min_area = min_area;
        self
    }

    pub fn area_method(mut self, method: AreaMethod) -> Self {
        self.area_method = method;
        self
    }

    /// Build the segmenter with default components if not specified
    pub fn build(self) -> Segmenter {
        let binarizer = self.binarizer
            .unwrap_or_else(|| Box::new(LuminanceThreshold::default()));

        let component_finder = self.component_finder
            .unwrap_or_else(|| Box::new(ContourComponentFinder));

        Segmenter::new(binarizer, component_finder, self.min_area, self.area_method)
    }
}

impl Default for SegmenterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
