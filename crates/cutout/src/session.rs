use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use crate::{
    color::BackgroundMode,
    compositor::Compositor,
    config::CutoutConfig,
    error::Result,
    io,
    pipeline::Segmenter,
    traits::ObjectStore,
    types::{BackgroundSpec, ObjectId, ObjectSummary},
};

/// Batch export request, as posted by a client: which objects and how to
/// treat their background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExportRequest {
    /// Identifiers to export; empty means every stored object
    #[serde(default)]
    pub ids: Vec<String>,
    /// `transparent`, `white` or `custom`
    #[serde(default = "default_background")]
    pub bg: String,
    /// `#rrggbb`, only read for the custom background
    #[serde(default)]
    #[schemars(regex(pattern = r"^#?[0-9a-fA-F]{6}$"))]
    pub color: Option<String>,
}

fn default_background() -> String {
    BackgroundMode::default().to_string()
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            bg: default_background(),
            color: None,
        }
    }
}

impl ExportRequest {
    /// Validate the request up front, before any compositing starts.
    ///
    /// An unknown `bg` is [`crate::CutoutError::InvalidBackground`]; a bad colour
    /// for `custom` is [`crate::CutoutError::InvalidColor`].
    pub fn resolve(&self) -> Result<(Vec<ObjectId>, BackgroundSpec)> {
        let ids = self
            .ids
            .iter()
            .map(|id| id.parse())
            .collect::<Result<Vec<ObjectId>>>()?;
        let spec = BackgroundSpec::from_request(&self.bg, self.color.as_deref())?;
        Ok((ids, spec))
    }
}

/// One encoded export, ready for a response body or an archive entry
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedObject {
    pub id: ObjectId,
    pub bytes: Vec<u8>,
}

impl RenderedObject {
    /// Archive entry / download name, `<id>.png`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id, io::OUTPUT_EXTENSION)
    }
}

/// Ties segmentation, storage and compositing together for one upload.
///
/// `extract` replaces whatever the store held; `render` and `render_batch`
/// read back from it, so they fail with [`crate::CutoutError::NotFound`] for ids
/// the last extraction did not produce.
pub struct ExtractionSession<S: ObjectStore> {
    store: S,
    segmenter: Segmenter,
    compositor: Compositor,
}

impl<S: ObjectStore> ExtractionSession<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, &CutoutConfig::default())
    }

    pub fn with_config(store: S, config: &CutoutConfig) -> Self {
        Self {
            store,
            segmenter: Segmenter::from_config(&config.segmentation),
            compositor: Compositor::from_config(&config.composite),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Segment an uploaded image and persist every object it contains.
    ///
    /// All or nothing: if any object fails to store, the store is left empty
    /// rather than holding part of the extraction.
    pub fn extract(&self, bytes: &[u8]) -> Result<Vec<ObjectSummary>> {
        let objects = self.segmenter.segment_bytes(bytes)?;
        self.store.clear()?;

        let mut summaries = Vec::with_capacity(objects.len());
        for object in objects {
            let summary = object.summary();
            if let Err(err) = self.store.put(object) {
                warn!(id = %summary.id, error = %err, "Failed to store object, discarding extraction");
                if let Err(clear_err) = self.store.clear() {
                    warn!(error = %clear_err, "Failed to discard partial extraction");
                }
                return Err(err);
            }
            summaries.push(summary);
        }
        info!(objects = summaries.len(), "Extraction stored");
        Ok(summaries)
    }

    /// Summaries of everything currently stored
    pub fn list(&self) -> Result<Vec<ObjectSummary>> {
        self.store
            .ids()?
            .iter()
            .map(|id| Ok(self.store.get(id)?.summary()))
            .collect()
    }

    /// Composite one stored object and encode it as PNG.
    pub fn render(&self, id: &ObjectId, background: &BackgroundSpec) -> Result<RenderedObject> {
        let object = self.store.get(id)?;
        let image = self.compositor.composite(&object, background);
        Ok(RenderedObject {
            id: *id,
            bytes: io::encode_png(&image)?,
        })
    }

    /// Render several objects in parallel. An empty `ids` renders everything
    /// stored. Output follows the order of `ids`; any failure aborts the batch.
    pub fn render_batch(
        &self,
        ids: &[ObjectId],
        background: &BackgroundSpec,
    ) -> Result<Vec<RenderedObject>> {
        let ids = if ids.is_empty() {
            self.store.ids()?
        } else {
            ids.to_vec()
        };

        let rendered = ids
            .par_iter()
            .map(|id| self.render(id, background))
            .collect::<Result<Vec<_>>>()?;
        info!(objects = rendered.len(), background = %background.mode(), "Rendered batch");
        Ok(rendered)
    }

    /// Resolve and render a client export request.
    pub fn export(&self, request: &ExportRequest) -> Result<Vec<RenderedObject>> {
        let (ids, background) = request.resolve()?;
        self.render_batch(&ids, &background)
    }
}
