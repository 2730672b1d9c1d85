use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;

/// Orientation bucket derived from a stream's display aspect ratio.
///
/// Also the first segment of every published object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Other,
}

impl Orientation {
    /// Classify an ffprobe `display_aspect_ratio` string.
    ///
    /// Only the exact strings `16:9` and `9:16` are recognised; anything
    /// else, including a missing value, lands in `Other`.
    pub fn from_aspect_ratio(aspect_ratio: Option<&str>) -> Self {
        match aspect_ratio {
            Some("16:9") => Orientation::Landscape,
            Some("9:16") => Orientation::Portrait,
            _ => Orientation::Other,
        }
    }

    pub fn key_prefix(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Other => "other",
        }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.key_prefix())
    }
}

/// Geometry of the first stream of a staged upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProbeResult {
    pub width: u32,
    pub height: u32,
    pub display_aspect_ratio: Option<String>,
    pub orientation: Orientation,
}

impl ProbeResult {
    pub fn new(width: u32, height: u32, display_aspect_ratio: Option<String>) -> Self {
        let orientation = Orientation::from_aspect_ratio(display_aspect_ratio.as_deref());
        Self {
            width,
            height,
            display_aspect_ratio,
            orientation,
        }
    }
}
