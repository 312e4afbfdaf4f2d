//! File-backed object store: objects live at `<root>/<bucket>/<key>`

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use super::{ObjectStore, StoreError};

pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> Option<PathBuf> {
        // Keys may contain '/' but must stay inside the bucket
        let key_path = Path::new(key);
        let escapes = key_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || bucket.contains(['/', '\\']) || bucket.is_empty() || bucket == ".." {
            return None;
        }
        Some(self.root.join(bucket).join(key_path))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get_bytes(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let not_found = || StoreError::ObjectNotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        };

        let path = self.object_path(bucket, key).ok_or_else(not_found)?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read object");
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("{name}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("bucket")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_reads_object_text() {
        let root = temp_root("fs-object-store");
        std::fs::write(root.join("bucket").join("prompt.txt"), "Hello {Claim}").unwrap();

        let store = FsObjectStore::new(&root);
        let text = store.get_text("bucket", "prompt.txt").await.unwrap();
        assert_eq!(text, "Hello {Claim}");

        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let root = temp_root("fs-object-store-missing");
        let store = FsObjectStore::new(&root);
        let err = store.get_text("bucket", "absent.txt").await.unwrap_err();
        assert!(matches!(err, StoreError::ObjectNotFound { .. }));
        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_binary_object_reads_as_bytes_not_text() {
        let root = temp_root("fs-object-store-binary");
        std::fs::write(root.join("bucket").join("policy.pdf"), [0x25, 0x50, 0xff, 0xfe]).unwrap();

        let store = FsObjectStore::new(&root);
        let bytes = store.get_bytes("bucket", "policy.pdf").await.unwrap();
        assert_eq!(bytes, vec![0x25, 0x50, 0xff, 0xfe]);
        assert!(matches!(
            store.get_text("bucket", "policy.pdf").await,
            Err(StoreError::Serialization(_))
        ));

        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_rejects_keys_escaping_the_bucket() {
        let store = FsObjectStore::new("/tmp");
        let err = store.get_text("bucket", "../etc/passwd").await.unwrap_err();
        assert!(matches!(err, StoreError::ObjectNotFound { .. }));
    }
}
