use crate::domain::model::{SavedDownload, Table, TargetFormat, UploadedFile, DEFAULT_MISSING_MARKERS};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// How raw cells are decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    pub missing_markers: Vec<String>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            missing_markers: DEFAULT_MISSING_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// The user's choices for one uploaded file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileOptions {
    pub remove_duplicates: bool,
    pub fill_missing: bool,
    /// `None` keeps every column in its original order.
    pub columns: Option<Vec<String>>,
    pub chart: bool,
    pub format: TargetFormat,
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn preview_rows(&self) -> usize;
    fn ingest_options(&self) -> IngestOptions;
    fn options_for(&self, file_name: &str) -> FileOptions;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn receive(&self, path: &str) -> Result<UploadedFile>;
    async fn extract(&self, file: &UploadedFile) -> Result<Table>;
    async fn transform(&self, file: &UploadedFile, table: Table) -> Result<Table>;
    /// Name the download of `file` will be saved under.
    fn download_name(&self, file: &UploadedFile) -> String;
    async fn load(&self, file: &UploadedFile, table: &Table) -> Result<SavedDownload>;
}
