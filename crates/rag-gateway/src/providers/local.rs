//! Local filesystem upload store
//!
//! Uploads land in a directory shared with the workers, named
//! `{job_id}_{filename}` so concurrent uploads of the same file never clash.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::JobId;

use super::upload_store::UploadStoreProvider;

/// Longest single path component on common filesystems (ext4, xfs, apfs)
const MAX_NAME_BYTES: usize = 255;

/// Longest suffix still treated as an extension when shortening a name
const MAX_EXTENSION_BYTES: usize = 16;

/// Upload store backed by a local (or mounted) directory
pub struct LocalUploadStore {
    /// Directory to store uploads
    upload_dir: PathBuf,
}

impl LocalUploadStore {
    /// Create a new local upload store, creating the directory if needed
    pub fn new(upload_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&upload_dir)?;
        Ok(Self { upload_dir })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Path an upload is written to
    fn upload_path(&self, job_id: &JobId, filename: &str) -> PathBuf {
        let budget = MAX_NAME_BYTES.saturating_sub(job_id.as_str().len() + 1);
        let name = fit_filename(&sanitize_filename(filename), budget);
        self.upload_dir.join(format!("{}_{}", job_id, name))
    }
}

/// Shorten `name` to at most `max_bytes`, cutting on a char boundary and
/// keeping a short extension intact
pub fn fit_filename(name: &str, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name.to_string();
    }

    let (stem, extension) = match name.rfind('.') {
        Some(dot)
            if dot > 0
                && name.len() - dot <= MAX_EXTENSION_BYTES
                && name.len() - dot < max_bytes =>
        {
            name.split_at(dot)
        }
        _ => (name, ""),
    };

    let mut end = max_bytes.saturating_sub(extension.len()).min(stem.len());
    while !stem.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}{}", &stem[..end], extension)
}

/// Reduce an untrusted client filename to a safe single path component
pub fn sanitize_filename(filename: &str) -> String {
    let last = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = last
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();

    match cleaned.trim() {
        "" | "." | ".." => "upload.bin".to_string(),
        name => name.to_string(),
    }
}

#[async_trait]
impl UploadStoreProvider for LocalUploadStore {
    async fn store_upload(&self, job_id: &JobId, filename: &str, data: &[u8]) -> Result<String> {
        let path = self.upload_path(job_id, filename);

        tokio::fs::write(&path, data).await.map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Failed to write upload");
            Error::storage(format!("failed to save file: {}", e))
        })?;

        Ok(path.to_string_lossy().to_string())
    }

    async fn remove_upload(&self, storage_path: &str) -> Result<()> {
        let path = Path::new(storage_path);
        if path.parent() != Some(self.upload_dir.as_path()) {
            return Err(Error::storage(format!(
                "refusing to remove {} outside the upload directory",
                storage_path
            )));
        }

        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(format!("failed to remove file: {}", e))),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.upload_dir.is_dir())
    }

    fn name(&self) -> &str {
        "local-filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\cv.docx"), "cv.docx");
        assert_eq!(sanitize_filename("dir/"), "upload.bin");
        assert_eq!(sanitize_filename(".."), "upload.bin");
        assert_eq!(sanitize_filename("a\nb.txt"), "a_b.txt");
    }

    #[tokio::test]
    async fn test_store_upload_stays_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path().to_path_buf()).unwrap();
        let job_id = JobId::from("job-42");

        let path = store
            .store_upload(&job_id, "../escape.pdf", b"%PDF-1.4")
            .await
            .unwrap();

        let path = PathBuf::from(path);
        assert_eq!(path.parent().unwrap(), dir.path());
        assert_eq!(path.file_name().unwrap(), "job-42_escape.pdf");
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.4");
        assert!(store.health_check().await.unwrap());
    }

    #[test]
    fn test_fit_filename_keeps_extension() {
        let long = format!("{}.pdf", "a".repeat(300));
        let fitted = fit_filename(&long, 218);
        assert_eq!(fitted.len(), 218);
        assert!(fitted.ends_with("aaa.pdf"));

        assert_eq!(fit_filename("report.pdf", 218), "report.pdf");
        // No usable extension: plain cut
        assert_eq!(fit_filename(&"b".repeat(40), 10), "b".repeat(10));
    }

    #[test]
    fn test_fit_filename_cuts_on_char_boundary() {
        // 'é' is two bytes; a cut in the middle must back off
        let name = format!("{}.txt", "é".repeat(100));
        let fitted = fit_filename(&name, 11);
        assert_eq!(fitted, "ééé.txt");
        assert!(fitted.len() <= 11);
    }

    #[tokio::test]
    async fn test_long_filename_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path().to_path_buf()).unwrap();
        let job_id = JobId::generate();
        let filename = format!("{}.pdf", "a".repeat(240));

        let path = store.store_upload(&job_id, &filename, b"data").await.unwrap();

        let stored = PathBuf::from(&path);
        let name = stored.file_name().unwrap().to_str().unwrap();
        assert!(name.len() <= MAX_NAME_BYTES);
        assert!(name.starts_with(&format!("{}_aaa", job_id)));
        assert!(name.ends_with(".pdf"));
        assert_eq!(tokio::fs::read(&stored).await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_remove_upload() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalUploadStore::new(dir.path().to_path_buf()).unwrap();
        let path = store
            .store_upload(&JobId::from("job-7"), "report.pdf", b"data")
            .await
            .unwrap();

        store.remove_upload(&path).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        // Already gone is fine
        store.remove_upload(&path).await.unwrap();
        // Anything outside the upload dir is refused
        assert!(store.remove_upload("/etc/hosts").await.is_err());
    }
}
