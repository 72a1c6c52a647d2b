use std::fmt;
use std::str::FromStr;

use image::{DynamicImage, GrayImage, Rgb, RgbImage, RgbaImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::CutoutError;

const ID_PREFIX: &str = "object-";

/// Identifier of an extracted object.
///
/// Assigned 1-based in discovery order and rendered as `object-<n>`. The token
/// is opaque to callers; ordering follows the numeric index, not the string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(u32);

impl ObjectId {
    /// Identifier for the `index`-th surviving component (1-based).
    pub fn from_index(index: u32) -> Self {
        Self(index)
    }

    pub fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ID_PREFIX, self.0)
    }
}

impl FromStr for ObjectId {
    type Err = CutoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(ID_PREFIX)
            .and_then(|n| n.parse::<u32>().ok())
            .filter(|&n| n > 0)
            .map(Self)
            .ok_or_else(|| CutoutError::InvalidId(s.to_string()))
    }
}

impl TryFrom<String> for ObjectId {
    type Error = CutoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_string()
    }
}

/// Axis-aligned box in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Box spanning the inclusive pixel range `[min, max]` on both axes.
    pub fn from_extent(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// True when the box is non-empty and lies inside a `width` x `height` frame.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }
}

/// Decoded 8-bit raster, either RGB or RGBA.
///
/// Other layouts are normalised on decode (see [`crate::io::decode`]).
#[derive(Debug, Clone, PartialEq)]
pub enum RasterImage {
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

impl RasterImage {
    pub fn width(&self) -> u32 {
        match self {
            Self::Rgb(img) => img.width(),
            Self::Rgba(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Self::Rgb(img) => img.height(),
            Self::Rgba(img) => img.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn channels(&self) -> u8 {
        match self {
            Self::Rgb(_) => 3,
            Self::Rgba(_) => 4,
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::Rgba(_))
    }

    /// Owned copy of the region under `bbox`. The caller guarantees the box fits.
    pub fn crop(&self, bbox: &BoundingBox) -> RasterImage {
        let BoundingBox { x, y, width, height } = *bbox;
        match self {
            Self::Rgb(img) => {
                Self::Rgb(image::imageops::crop_imm(img, x, y, width, height).to_image())
            }
            Self::Rgba(img) => {
                Self::Rgba(image::imageops::crop_imm(img, x, y, width, height).to_image())
            }
        }
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        match self {
            Self::Rgb(img) => DynamicImage::ImageRgb8(img.clone()),
            Self::Rgba(img) => DynamicImage::ImageRgba8(img.clone()),
        }
    }
}

impl From<RgbImage> for RasterImage {
    fn from(img: RgbImage) -> Self {
        Self::Rgb(img)
    }
}

impl From<RgbaImage> for RasterImage {
    fn from(img: RgbaImage) -> Self {
        Self::Rgba(img)
    }
}

/// One object cut out of a source image.
///
/// The crop is an owned copy, so it outlives the source buffer. `mask` marks the
/// pixels inside the box that belong to this object (255) versus the background
/// or unrelated components (0); it is absent for objects rebuilt from a bare crop.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedObject {
    id: ObjectId,
    bbox: BoundingBox,
    area: u64,
    crop: RasterImage,
    mask: Option<GrayImage>,
}

impl ExtractedObject {
    /// Wrap an existing crop. The box size must equal the crop dimensions.
    pub fn new(id: ObjectId, bbox: BoundingBox, crop: RasterImage) -> Self {
        debug_assert_eq!((bbox.width, bbox.height), crop.dimensions());
        Self {
            id,
            bbox,
            area: bbox.area(),
            crop,
            mask: None,
        }
    }

    /// Attach the measured shape area.
    pub fn with_area(mut self, area: u64) -> Self {
        self.area = area;
        self
    }

    /// Attach the object mask. Ignored when its size differs from the crop.
    pub fn with_mask(mut self, mask: GrayImage) -> Self {
        if mask.dimensions() == self.crop.dimensions() {
            self.mask = Some(mask);
        }
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Shape area as measured by the segmenter's area method.
    pub fn area(&self) -> u64 {
        self.area
    }

    pub fn crop(&self) -> &RasterImage {
        &self.crop
    }

    pub fn mask(&self) -> Option<&GrayImage> {
        self.mask.as_ref()
    }

    pub fn summary(&self) -> ObjectSummary {
        ObjectSummary {
            id: self.id,
            x: self.bbox.x,
            y: self.bbox.y,
            width: self.bbox.width,
            height: self.bbox.height,
            area: self.area,
        }
    }
}

/// Serializable description of an extracted object, as handed to collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "An object extracted from the uploaded image")]
pub struct ObjectSummary {
    #[schemars(with = "String", description = "Stable identifier, e.g. object-1")]
    pub id: ObjectId,
    #[schemars(description = "Left edge of the bounding box in source pixels")]
    pub x: u32,
    #[schemars(description = "Top edge of the bounding box in source pixels")]
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[schemars(description = "Measured shape area in square pixels")]
    pub area: u64,
}

/// Background treatment applied when an object is exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundSpec {
    Transparent,
    SolidWhite,
    CustomColor(Rgb<u8>),
}

impl BackgroundSpec {
    /// Fill colour for opaque backgrounds; `None` for [`BackgroundSpec::Transparent`].
    pub fn fill(&self) -> Option<Rgb<u8>> {
        match self {
            Self::Transparent => None,
            Self::SolidWhite => Some(Rgb([255, 255, 255])),
            Self::CustomColor(color) => Some(*color),
        }
    }
}
