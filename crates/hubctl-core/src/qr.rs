// Provisioning QR codes.
//
// The backend hands back the QR image inline as a `data:` URI. It is
// shown once and never re-issued, so the only thing to do with it is
// decode it and write it somewhere.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::info;

use crate::error::CoreError;

/// A decoded `data:<mime>;base64,<payload>` image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningQr {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ProvisioningQr {
    /// Decode a base64 `data:` URI.
    pub fn parse(data_uri: &str) -> Result<Self, CoreError> {
        let rest = data_uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| CoreError::validation("qr", "provisioning QR is not a data: URI"))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| CoreError::validation("qr", "provisioning QR has no payload"))?;
        let Some(mime) = meta.strip_suffix(";base64") else {
            return Err(CoreError::validation(
                "qr",
                "provisioning QR payload is not base64-encoded",
            ));
        };

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| CoreError::validation("qr", format!("invalid QR payload: {e}")))?;

        Ok(Self {
            mime: if mime.is_empty() { "text/plain".into() } else { mime.to_owned() },
            bytes,
        })
    }

    /// `<device_id>-qr-code.png`
    pub fn default_file_name(device_id: &str) -> String {
        format!("{device_id}-qr-code.png")
    }

    /// Write the image. A directory target gets the default file name
    /// for `device_id` inside it. Returns the path written.
    pub fn save(&self, target: &Path, device_id: &str) -> Result<PathBuf, CoreError> {
        let path = if target.is_dir() {
            target.join(Self::default_file_name(device_id))
        } else {
            target.to_path_buf()
        };
        std::fs::write(&path, &self.bytes).map_err(|e| CoreError::Storage {
            message: format!("failed to write {}: {e}", path.display()),
        })?;
        info!(path = %path.display(), bytes = self.bytes.len(), "provisioning QR saved");
        Ok(path)
    }
}
