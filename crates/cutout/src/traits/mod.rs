use std::sync::Arc;

use image::GrayImage;
use crate::{
    algorithms::ComponentMap,
    error::Result,
    types::{ExtractedObject, ObjectId, RasterImage},
};

/// Turns a decoded raster into a foreground mask (255 = object, 0 = background)
pub trait Binarizer: Send + Sync {
    fn binarize(&self, image: &RasterImage) -> GrayImage;
}

/// Trait for locating the outer components of a binary mask
pub trait ComponentFinder: Send + Sync {
    /// Components in discovery order. Components nested inside another
    /// component's hole are folded into that component.
    fn find_components(&self, mask: &GrayImage) -> ComponentMap;
}

/// Keyed storage for extracted objects, owned by the collaborator layer.
///
/// `get` must fail with [`crate::CutoutError::NotFound`] for unknown ids; the
/// segmenter and compositor never raise that error themselves.
pub trait ObjectStore: Send + Sync {
    fn put(&self, object: ExtractedObject) -> Result<()>;

    fn get(&self, id: &ObjectId) -> Result<Arc<ExtractedObject>>;

    /// Stored identifiers in ascending index order
    fn ids(&self) -> Result<Vec<ObjectId>>;

    fn remove(&self, id: &ObjectId) -> Result<()>;

    /// Drop every stored object
    fn clear(&self) -> Result<()> {
        for id in self.ids()? {
            self.remove(&id)?;
        }
        Ok(())
    }
}
