//! Upload validation and storage.
//!
//! Files are checked against the configured size limit, extension list and
//! MIME list before anything is written. Accepted files are stored under the
//! upload directory by their bare file name.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::errors::ValidationError;

/// Content types browsers send when they cannot tell.
const GENERIC_MIME_TYPES: &[&str] = &["application/octet-stream", ""];

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub upload_dir: PathBuf,
    pub max_size_bytes: usize,
    pub supported_extensions: Vec<String>,
    pub supported_mime_types: Vec<String>,
}

/// Upload limits advertised to the frontend.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub max_size_mb: u64,
    pub supported_extensions: Vec<String>,
    pub supported_mime_types: Vec<String>,
}

impl UploadPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            max_size_bytes: config.max_size_bytes(),
            supported_extensions: config.supported_extensions.clone(),
            supported_mime_types: config.supported_mime_types.clone(),
        }
    }

    pub fn public_config(&self) -> PublicConfig {
        PublicConfig {
            max_size_mb: (self.max_size_bytes / (1024 * 1024)) as u64,
            supported_extensions: self.supported_extensions.clone(),
            supported_mime_types: self.supported_mime_types.clone(),
        }
    }

    /// Validate an upload and return the sanitized file name it will be stored under.
    pub fn validate(
        &self,
        filename: &str,
        content_type: Option<&str>,
        size: usize,
    ) -> Result<String, ValidationError> {
        let name = sanitize_filename(filename)
            .ok_or_else(|| ValidationError::invalid("A file name is required"))?;

        let extension = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !self.supported_extensions.iter().any(|e| *e == extension) {
            return Err(ValidationError::UnsupportedType(format!(
                "'.{}' (allowed: {})",
                extension,
                self.supported_extensions.join(", ")
            )));
        }

        if let Some(mime) = content_type.map(|m| m.split(';').next().unwrap_or("").trim()) {
            if !GENERIC_MIME_TYPES.contains(&mime)
                && !self.supported_mime_types.iter().any(|m| m.eq_ignore_ascii_case(mime))
            {
                return Err(ValidationError::UnsupportedType(mime.to_string()));
            }
        }

        if size > self.max_size_bytes {
            return Err(ValidationError::TooLarge {
                size,
                max: self.max_size_bytes,
            });
        }

        Ok(name)
    }

    /// Write an accepted upload to disk, replacing any earlier file of the same name.
    pub async fn store(&self, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let path = self.upload_dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        debug!("Stored upload at {}", path.display());
        Ok(path)
    }
}

/// Strip any directory components a client may have sent.
fn sanitize_filename(raw: &str) -> Option<String> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if last.is_empty() || last == "." || last == ".." || last.contains('\0') {
        return None;
    }
    Some(last.to_string())
}
