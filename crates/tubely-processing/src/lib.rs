//! Tubely media processing.
//!
//! The video ingestion pipeline (stage → probe → remux → derive key →
//! publish → record) and the thumbnail upload path.

pub mod thumbnail;
pub mod upload;
pub mod video;

pub use thumbnail::ThumbnailService;
pub use upload::{StagedFile, StagingConfig, UploadStager};
pub use video::{
    processed_output_path, FfmpegRemuxer, FfprobeInspector, IngestOutcome, MediaInspector,
    PipelineFailure, PipelineStage, Remuxer, VideoIngestPipeline,
};
