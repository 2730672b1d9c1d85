pub mod media;
pub mod video;

pub use media::{Orientation, ProbeResult};
pub use video::Video;
