//! Declared media type checks for multipart parts.

use tubely_core::AppError;

/// A validated `type/subtype` pair with parameters stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    essence: String,
    subtype: String,
}

impl MediaType {
    /// Parse a header value such as `video/MP4; codecs="avc1"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let essence = raw.split(';').next()?.trim().to_lowercase();
        let (kind, subtype) = essence.split_once('/')?;
        if kind.is_empty() || subtype.is_empty() || subtype.contains('/') {
            return None;
        }
        let subtype = subtype.to_string();
        Some(Self { essence, subtype })
    }

    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// File extension used for every path and key derived from this upload.
    pub fn extension(&self) -> &str {
        &self.subtype
    }
}

/// Parse `raw` and require its essence to be one of `allowed`.
pub fn ensure_allowed_media_type(
    raw: Option<&str>,
    allowed: &[&str],
) -> Result<MediaType, AppError> {
    let raw = raw.ok_or_else(|| AppError::InvalidInput("Missing Content-Type".to_string()))?;
    let media_type = MediaType::parse(raw)
        .ok_or_else(|| AppError::InvalidInput(format!("Invalid Content-Type: {}", raw)))?;

    if !allowed.contains(&media_type.essence()) {
        return Err(AppError::InvalidInput(format!(
            "Invalid file type {}, expected {}",
            media_type.essence(),
            allowed.join(" or ")
        )));
    }

    Ok(media_type)
}
