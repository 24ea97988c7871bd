pub mod engine;
pub mod export;
pub mod ingest;
pub mod pipeline;
pub mod transform;
pub mod visualize;
pub mod xlsx;

pub use crate::domain::model::{Table, UploadedFile, Value};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
