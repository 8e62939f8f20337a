//! Resume lifecycle: upload, background analysis, queries and removal.

pub mod files;
pub mod handlers;
pub mod orchestrator;
pub mod store;

pub use files::{FileStore, LocalFileStore, S3FileStore};
pub use orchestrator::{AnalysisOrchestrator, PipelineSettings, Upload};
pub use store::{MemoryResumeStore, PgResumeStore, ResumeStore};
