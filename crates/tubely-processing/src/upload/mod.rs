pub mod content_type;
pub mod stager;

pub use content_type::{ensure_allowed_media_type, MediaType};
pub use stager::{read_bounded, StagedFile, StagingConfig, UploadStager};
