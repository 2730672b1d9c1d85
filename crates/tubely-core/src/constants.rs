//! Limits and fixed names shared by the upload paths.

/// Largest accepted video body (1 GiB).
pub const MAX_VIDEO_SIZE_BYTES: u64 = 1 << 30;

/// Largest accepted thumbnail body (10 MiB).
pub const MAX_THUMBNAIL_SIZE_BYTES: u64 = 10 << 20;

/// Room for multipart framing and other form fields on top of the file bound.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 1 << 20;

/// The only media type accepted on the video upload path.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

pub const THUMBNAIL_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Multipart field names.
pub const VIDEO_FORM_FIELD: &str = "video";
pub const THUMBNAIL_FORM_FIELD: &str = "thumbnail";

/// Prefix of every staged upload file.
pub const UPLOAD_TEMP_PREFIX: &str = "tubely-upload-";

/// Marker inserted before the extension of remuxed outputs.
pub const PROCESSED_MARKER: &str = "processed";

/// Issuer claim of access tokens.
pub const JWT_ISSUER: &str = "tubely-access";

/// Number of random bytes behind object keys and asset names.
pub const RANDOM_TOKEN_BYTES: usize = 32;
