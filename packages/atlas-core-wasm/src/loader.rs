use std::fmt;
use std::path::PathBuf;

use crate::error::LoadError;
use crate::models::{Constants, PipelineConfig, PipelineOutput};
use crate::pipeline::FeaturePipeline;
use crate::{console_log, console_warn};

/// Supplies the raw bytes of a named data set. File bundling belongs to the
/// host; the core only needs the bytes.
pub trait DataSource {
    fn read(&self, id: &str) -> Result<Vec<u8>, LoadError>;
}

/// Reads `<root>/<id>.geojson` from disk.
#[derive(Debug, Clone)]
pub struct FsDataSource {
    pub root: PathBuf,
}

impl FsDataSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DataSource for FsDataSource {
    fn read(&self, id: &str) -> Result<Vec<u8>, LoadError> {
        let path = self.root.join(format!("{}.geojson", id));
        std::fs::read(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound { id: id.to_string() },
            _ => LoadError::Io {
                id: id.to_string(),
                source,
            },
        })
    }
}

/// Progress text shown by the host while data sets load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Processing(String),
    Creating,
    Complete,
    Error(String),
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Loading => write!(f, "Loading GeoJSON data..."),
            LoadStatus::Processing(file) => write!(f, "Processing {} file...", file),
            LoadStatus::Creating => write!(f, "Creating 3D models..."),
            LoadStatus::Complete => write!(f, "Complete"),
            LoadStatus::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

#[derive(Debug)]
pub struct FileReport {
    pub id: String,
    pub result: Result<PipelineOutput, LoadError>,
}

#[derive(Debug)]
pub struct LoadReport {
    pub files: Vec<FileReport>,
    /// Last status the host should display
    pub status: LoadStatus,
}

impl LoadReport {
    /// Outputs of the files that loaded, in configured order.
    pub fn outputs(&self) -> impl Iterator<Item = &PipelineOutput> {
        self.files.iter().filter_map(|f| f.result.as_ref().ok())
    }
}

/// Load every configured data set in order.
///
/// A file that cannot be read or decoded is reported and the next file is
/// still processed. The final status reflects the last failure, if any.
pub fn load_all(constants: &Constants, source: &dyn DataSource, config: &PipelineConfig) -> LoadReport {
    load_all_with_progress(constants, source, config, |_| {})
}

/// Like `load_all`, reporting each status change to `on_status`.
pub fn load_all_with_progress<F: FnMut(&LoadStatus)>(
    constants: &Constants,
    source: &dyn DataSource,
    config: &PipelineConfig,
    mut on_status: F,
) -> LoadReport {
    let pipeline = FeaturePipeline::new(config.clone());
    let mut status = LoadStatus::Loading;
    on_status(&status);

    let mut files = Vec::with_capacity(constants.map_data_files.len());
    let mut last_error = None;

    for id in &constants.map_data_files {
        status = LoadStatus::Processing(id.clone());
        on_status(&status);

        let result = source.read(id).and_then(|bytes| {
            let collection = crate::geojson_features::decode_feature_collection(&bytes)?;
            status = LoadStatus::Creating;
            on_status(&status);
            Ok(pipeline.process(&collection))
        });

        if let Err(e) = &result {
            console_warn!(target: MapData, "Error loading GeoJSON {}: {}", id, e);
            last_error = Some(e.to_string());
        }
        files.push(FileReport {
            id: id.clone(),
            result,
        });
    }

    status = match last_error {
        Some(message) => LoadStatus::Error(message),
        None => LoadStatus::Complete,
    };
    on_status(&status);
    console_log!(target: MapData, "{}", status);

    LoadReport { files, status }
}
