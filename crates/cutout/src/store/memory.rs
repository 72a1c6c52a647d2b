use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};

use tracing::warn;
use crate::{
    error::{CutoutError, Result},
    traits::ObjectStore,
    types::{ExtractedObject, ObjectId},
};

/// In-process store, valid for as long as the value lives.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    objects: Arc<RwLock<BTreeMap<ObjectId, Arc<ExtractedObject>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryStore {
    fn put(&self, object: ExtractedObject) -> Result<()> {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(object.id(), Arc::new(object));
        Ok(())
    }

    fn get(&self, id: &ObjectId) -> Result<Arc<ExtractedObject>> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        objects.get(id).cloned().ok_or_else(|| {
            warn!(%id, "Requested object is not in the memory store");
            CutoutError::NotFound(id.to_string())
        })
    }

    fn ids(&self) -> Result<Vec<ObjectId>> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(objects.keys().copied().collect())
    }

    fn remove(&self, id: &ObjectId) -> Result<()> {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CutoutError::NotFound(id.to_string()))
    }

    fn clear(&self) -> Result<()> {
        self.objects.write().unwrap_or_else(PoisonError::into_inner).clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, RasterImage};
    use image::RgbImage;

    fn object(index: u32) -> ExtractedObject {
        ExtractedObject::new(
            ObjectId::from_index(index),
            BoundingBox::new(index, index, 2, 2),
            RasterImage::from(RgbImage::new(2, 2)),
        )
    }

    #[test]
    fn test_put_then_get() {
        let store = MemoryStore::new();
        store.put(object(1)).unwrap();

        let fetched = store.get(&ObjectId::from_index(1)).unwrap();
        assert_eq!(fetched.bbox().x, 1);
    }

    #[test]
    fn test_missing_id_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get(&ObjectId::from_index(4)),
            Err(CutoutError::NotFound(id)) if id == "object-4"
        ));
        assert!(store.remove(&ObjectId::from_index(4)).is_err());
    }

    #[test]
    fn test_ids_are_numerically_ordered() {
        let store = MemoryStore::new();
        for index in [10, 2, 1] {
            store.put(object(index)).unwrap();
        }
        let ids: Vec<u32> = store.ids().unwrap().iter().map(ObjectId::index).collect();
        assert_eq!(ids, [1, 2, 10]);

        store.clear().unwrap();
        assert!(store.is_empty());
    }
}
