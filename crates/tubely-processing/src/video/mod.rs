pub mod command;
pub mod orchestration;
pub mod probe;
pub mod remux;

pub use orchestration::{IngestOutcome, PipelineFailure, PipelineStage, VideoIngestPipeline};
pub use probe::{parse_probe_output, FfprobeInspector, MediaInspector};
pub use remux::{processed_output_path, FfmpegRemuxer, Remuxer};
