use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::{
    error::{CutoutError, Result},
    io,
    traits::ObjectStore,
    types::{BoundingBox, ExtractedObject, ObjectId},
};

/// Sidecar written next to each crop
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ObjectRecord {
    id: ObjectId,
    bbox: BoundingBox,
    area: u64,
}

/// Filesystem store: per object a `<id>.png` crop, a `<id>.json` record and,
/// when available, a `<id>.mask.png` object mask.
///
/// The directory outlives the process, so a later export can pick up crops
/// written by an earlier extraction.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open `root`, creating it if needed
    pub fn create<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, id: &ObjectId, suffix: &str) -> PathBuf {
        self.root.join(format!("{id}{suffix}"))
    }

    fn crop_path(&self, id: &ObjectId) -> PathBuf {
        self.path(id, &format!(".{}", io::OUTPUT_EXTENSION))
    }

    fn record_path(&self, id: &ObjectId) -> PathBuf {
        self.path(id, ".json")
    }

    fn mask_path(&self, id: &ObjectId) -> PathBuf {
        self.path(id, ".mask.png")
    }
}

impl ObjectStore for DirectoryStore {
    fn put(&self, object: ExtractedObject) -> Result<()> {
        let id = object.id();
        fs::write(self.crop_path(&id), io::encode_png(object.crop())?)?;

        let mask_path = self.mask_path(&id);
        match object.mask() {
            Some(mask) => mask.save(&mask_path).map_err(CutoutError::Encode)?,
            None if mask_path.exists() => fs::remove_file(&mask_path)?,
            None => {}
        }

        // Record last: its presence marks the object as complete.
        let record = ObjectRecord { id, bbox: *object.bbox(), area: object.area() };
        fs::write(self.record_path(&id), serde_json::to_vec_pretty(&record)?)?;
        debug!(%id, root = %self.root.display(), "Stored object");
        Ok(())
    }

    fn get(&self, id: &ObjectId) -> Result<Arc<ExtractedObject>> {
        let record_path = self.record_path(id);
        if !record_path.is_file() {
            warn!(%id, root = %self.root.display(), "Requested object is not in the store");
            return Err(CutoutError::NotFound(id.to_string()));
        }
        let record: ObjectRecord = serde_json::from_slice(&fs::read(record_path)?)?;

        let crop = io::decode(&fs::read(self.crop_path(id))?)?;
        if crop.dimensions() != (record.bbox.width, record.bbox.height) {
            return Err(CutoutError::Decode(format!(
                "stored crop for {id} is {}x{}, record says {}x{}",
                crop.width(),
                crop.height(),
                record.bbox.width,
                record.bbox.height
            )));
        }

        let mut object = ExtractedObject::new(record.id, record.bbox, crop).with_area(record.area);
        let mask_path = self.mask_path(id);
        if mask_path.is_file() {
            let mask = image::open(&mask_path)
                .map_err(|e| CutoutError::Decode(e.to_string()))?
                .into_luma8();
            object = object.with_mask(mask);
        }
        Ok(Arc::new(object))
    }

    fn ids(&self) -> Result<Vec<ObjectId>> {
        let paths = fs::read_dir(&self.root)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;

        // Only `<id>.json` records count; other files in the directory are ignored.
        let mut ids: Vec<ObjectId> = paths
            .iter()
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem()?.to_str()?.parse().ok())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn remove(&self, id: &ObjectId) -> Result<()> {
        let record_path = self.record_path(id);
        if !record_path.is_file() {
            return Err(CutoutError::NotFound(id.to_string()));
        }
        fs::remove_file(record_path)?;
        for path in [self.crop_path(id), self.mask_path(id)] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RasterImage;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    fn object(index: u32) -> ExtractedObject {
        let mut mask = GrayImage::new(3, 2);
        mask.put_pixel(1, 1, Luma([255]));
        ExtractedObject::new(
            ObjectId::from_index(index),
            BoundingBox::new(4, 5, 3, 2),
            RasterImage::from(RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 200]))),
        )
        .with_area(777)
        .with_mask(mask)
    }

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::create(dir.path()).unwrap();
        let original = object(2);
        store.put(original.clone()).unwrap();

        assert!(dir.path().join("object-2.png").is_file());
        let fetched = store.get(&ObjectId::from_index(2)).unwrap();
        assert_eq!(*fetched, original);
    }

    #[test]
    fn test_reopened_store_sees_previous_objects() {
        let dir = tempfile::tempdir().unwrap();
        DirectoryStore::create(dir.path()).unwrap().put(object(11)).unwrap();
        DirectoryStore::create(dir.path()).unwrap().put(object(3)).unwrap();

        let reopened = DirectoryStore::create(dir.path()).unwrap();
        let ids: Vec<String> = reopened.ids().unwrap().iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, ["object-3", "object-11"]);
    }

    #[test]
    fn test_unknown_and_removed_ids_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::create(dir.path()).unwrap();
        assert!(matches!(store.get(&ObjectId::from_index(1)), Err(CutoutError::NotFound(_))));

        store.put(object(1)).unwrap();
        store.remove(&ObjectId::from_index(1)).unwrap();
        assert!(matches!(store.get(&ObjectId::from_index(1)), Err(CutoutError::NotFound(_))));
        assert!(!dir.path().join("object-1.png").exists());
    }

    #[test]
    fn test_ids_ignore_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::create(dir.path()).unwrap();
        store.put(object(1)).unwrap();
        fs::write(dir.path().join("notes.json"), b"{}").unwrap();
        fs::write(dir.path().join("object-5.txt"), b"").unwrap();

        assert_eq!(store.ids().unwrap(), [ObjectId::from_index(1)]);
    }

    #[test]
    fn test_unreadable_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::create(dir.path().join("store")).unwrap();
        store.put(object(1)).unwrap();
        fs::remove_dir_all(store.root()).unwrap();

        assert!(matches!(store.ids(), Err(CutoutError::Io(_))));
        assert!(matches!(store.clear(), Err(CutoutError::Io(_))));
    }
}
