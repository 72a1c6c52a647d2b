use std::fs;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use cutout::{
    AreaMethod, BackgroundMode, CutoutConfig, CutoutError, ExportRequest, RenderedObject,
    TransparencyMode,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// Default archive name for batch exports
pub const DEFAULT_ARCHIVE_NAME: &str = "objects.zip";

/// Store directory used when neither the command line nor the config names one
pub const DEFAULT_STORE_DIR: &str = "./temp";

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Cutout(#[from] CutoutError),
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ZipError(#[from] zip::result::ZipError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
    #[error("--color only applies to the custom background, not '{0}'")]
    ColorWithoutCustomBackground(BackgroundMode),
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub threshold: Option<u8>,
    pub min_area: Option<u64>,
    pub area_method: Option<AreaMethod>,
    pub transparency: Option<TransparencyMode>,
}

/// Configuration file for the CLI: pipeline settings plus where crops live.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding extracted crops between `extract` and `export`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,
    #[serde(flatten)]
    pub cutout: CutoutConfig,
}

impl CliConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    /// Convert to TOML string
    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(CliConfig)
    }

    /// Final store directory and pipeline settings.
    ///
    /// `store` wins over `store_dir`, which wins over [`DEFAULT_STORE_DIR`];
    /// every override that is set replaces the file value.
    pub fn resolve(self, store: Option<PathBuf>, overrides: &ConfigOverrides) -> (PathBuf, CutoutConfig) {
        let store_dir = store
            .or(self.store_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR));

        let mut config = self.cutout;
        if let Some(threshold) = overrides.threshold {
            config.segmentation.threshold = threshold;
        }
        if let Some(min_area) = overrides.min_area {
            config.segmentation.min_area = min_area;
        }
        if let Some(area_method) = overrides.area_method {
            config.segmentation.area_method = area_method;
        }
        if let Some(transparency) = overrides.transparency {
            config.composite.transparency = transparency;
        }
        (store_dir, config)
    }
}

/// Build and validate an export request from command-line arguments.
///
/// A colour given for any background other than `custom` is rejected rather
/// than silently ignored.
pub fn export_request(ids: Vec<String>, bg: &str, color: Option<String>) -> Result<ExportRequest, CliError> {
    let request = ExportRequest { ids, bg: bg.to_string(), color };
    let (_, background) = request.resolve()?;
    if request.color.is_some() && background.mode() != BackgroundMode::Custom {
        return Err(CliError::ColorWithoutCustomBackground(background.mode()));
    }
    Ok(request)
}

/// Pack rendered objects into a zip archive, one `<id>.png` entry each.
///
/// PNG data is already compressed, so entries are stored as-is.
pub fn write_archive<W: Write + Seek>(writer: W, rendered: &[RenderedObject]) -> Result<W, CliError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut archive = ZipWriter::new(writer);
    for object in rendered {
        archive.start_file(object.file_name(), options)?;
        archive.write_all(&object.bytes)?;
    }
    Ok(archive.finish()?)
}

/// Write the archive to `path`.
pub fn write_archive_file<P: AsRef<Path>>(path: P, rendered: &[RenderedObject]) -> Result<(), CliError> {
    let file = fs::File::create(path)?;
    write_archive(file, rendered)?;
    Ok(())
}

/// Write each rendered object into `dir` as `<id>.png`, returning the paths.
pub fn write_directory<P: AsRef<Path>>(dir: P, rendered: &[RenderedObject]) -> Result<Vec<PathBuf>, CliError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    rendered
        .iter()
        .map(|object| {
            let path = dir.join(object.file_name());
            fs::write(&path, &object.bytes)?;
            Ok(path)
        })
        .collect()
}
