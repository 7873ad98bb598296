//! Upload store provider trait for persisting raw uploads

use async_trait::async_trait;

use crate::error::Result;
use crate::types::JobId;

/// Durable location for uploaded content that workers read back
///
/// Implementations:
/// - `LocalUploadStore`: shared filesystem directory
#[async_trait]
pub trait UploadStoreProvider: Send + Sync {
    /// Store an upload
    ///
    /// Returns the storage path recorded on the job
    async fn store_upload(&self, job_id: &JobId, filename: &str, data: &[u8]) -> Result<String>;

    /// Delete an upload no job refers to; a missing file is not an error
    async fn remove_upload(&self, storage_path: &str) -> Result<()>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
