//! Storage module for generated report documents
//!
//! Defines the object-storage seam used by the report publisher and the
//! MinIO/S3-compatible client that implements it.

mod minio_client;

pub use minio_client::MinIOClient;

use async_trait::async_trait;

use crate::core::error::AppError;
use crate::shared::validation::VERSION_SEGMENT_REGEX;

/// Object storage collaborator
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `data` under `key` and return a publicly resolvable URL
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str)
        -> Result<String, AppError>;

    /// Remove the object stored under `key`
    async fn delete(&self, key: &str) -> Result<(), AppError>;

    /// Object key for a report document with the given canonical file name
    fn report_key(&self, file_name: &str) -> String;

    /// Recover the object key from a URL previously returned by `upload`
    fn key_from_url(&self, url: &str) -> Option<String>;
}

/// Marker used by legacy CDN delivery URLs (`.../upload/v123/folder/file.pdf`)
const LEGACY_UPLOAD_MARKER: &str = "/upload/";

/// Extract the storage key from a document URL.
///
/// The path after the first matching base (or after `/upload/` for legacy
/// URLs) is taken, any query string dropped, a leading `v<digits>/` version
/// segment removed and the remainder percent-decoded.
pub fn storage_key_from_url(url: &str, bases: &[String]) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);

    let path = bases
        .iter()
        .map(|base| format!("{}/", base.trim_end_matches('/')))
        .find_map(|base| without_query.strip_prefix(base.as_str()))
        .or_else(|| {
            without_query
                .split_once(LEGACY_UPLOAD_MARKER)
                .map(|(_, rest)| rest)
        })?;

    let path = VERSION_SEGMENT_REGEX.replace(path, "");
    if path.is_empty() {
        return None;
    }

    let decoded = urlencoding::decode(&path)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| path.to_string());

    Some(decoded)
}
