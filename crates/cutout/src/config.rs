use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

/// Luminance above which a pixel is treated as background paper.
pub const DEFAULT_THRESHOLD: u8 = 240;

/// Smallest shape area, in pixels, that counts as an object rather than noise.
pub const DEFAULT_MIN_AREA: u64 = 500;

/// How the noise filter measures a component.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AreaMethod {
    /// Number of foreground pixels in the component.
    #[default]
    PixelCount,
    /// Shoelace area of the traced outer contour. Runs through pixel centres, so a
    /// solid `n` x `n` square measures `(n - 1)^2`.
    Polygon,
}

/// What the transparent background does with the non-object pixels inside a box.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransparencyMode {
    /// Keep the whole crop opaque (or its own alpha) on a transparent canvas.
    #[default]
    Canvas,
    /// Use the component mask as extra coverage, so paper inside the box becomes
    /// transparent, or takes the fill colour for opaque backgrounds.
    Mask,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Pixels with luminance strictly above this value are background.
    pub threshold: u8,
    /// Components smaller than this are dropped as noise.
    pub min_area: u64,
    pub area_method: AreaMethod,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_area: DEFAULT_MIN_AREA,
            area_method: AreaMethod::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CompositeConfig {
    pub transparency: TransparencyMode,
}

/// Full pipeline configuration, as loaded from a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CutoutConfig {
    pub segmentation: SegmentationConfig,
    pub composite: CompositeConfig,
}

impl CutoutConfig {
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(CutoutConfig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_constants() {
        let config = CutoutConfig::default();
        assert_eq!(config.segmentation.threshold, 240);
        assert_eq!(config.segmentation.min_area, 500);
        assert_eq!(config.segmentation.area_method, AreaMethod::PixelCount);
        assert_eq!(config.composite.transparency, TransparencyMode::Canvas);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: CutoutConfig =
            serde_json::from_str(r#"{ "segmentation": { "min_area": 50 } }"#).unwrap();
        assert_eq!(config.segmentation.min_area, 50);
        assert_eq!(config.segmentation.threshold, DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_modes_parse_from_snake_case() {
        assert_eq!("polygon".parse::<AreaMethod>().unwrap(), AreaMethod::Polygon);
        assert_eq!("mask".parse::<TransparencyMode>().unwrap(), TransparencyMode::Mask);
        assert_eq!(AreaMethod::PixelCount.to_string(), "pixel_count");
    }
}
