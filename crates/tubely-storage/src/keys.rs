//! Object key derivation.
//!
//! A key is `{orientation}/{token}.{ext}`. The token is drawn fresh from the
//! thread-local CSPRNG on every call, so re-uploading identical bytes never
//! reuses a key.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use std::fmt::{Display, Formatter, Result as FmtResult};
use tubely_core::constants::RANDOM_TOKEN_BYTES;
use tubely_core::Orientation;

/// 256 random bits, URL-safe base64 without padding (43 characters).
pub fn random_token() -> String {
    let mut bytes = [0u8; RANDOM_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Storage key of a published video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    orientation: Orientation,
    token: String,
    extension: String,
}

impl ObjectKey {
    /// Derive a new key in the orientation's namespace.
    pub fn derive(orientation: Orientation, extension: &str) -> Self {
        Self {
            orientation,
            token: random_token(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}/{}.{}",
            self.orientation.key_prefix(),
            self.token,
            self.extension
        )
    }
}
