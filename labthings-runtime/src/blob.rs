use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

enum Content {
    Bytes(Bytes),
    Path(PathBuf),
}

/// Binary output an action can return without inlining it in the JSON
/// response (spec.md 4.2: action results may be or contain blobs). The
/// bytes/path live in the [`BlobRegistry`]; what actually serializes into
/// an invocation's `output` is a [`BlobRef`], minted when the action
/// registers the blob.
pub struct Blob {
    content: Content,
    media_type: String,
}

impl Blob {
    pub fn from_bytes(media_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            content: Content::Bytes(bytes.into()),
            media_type: media_type.into(),
        }
    }

    pub fn from_path(media_type: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            content: Content::Path(path.into()),
            media_type: media_type.into(),
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub async fn read(&self) -> std::io::Result<Bytes> {
        match &self.content {
            Content::Bytes(b) => Ok(b.clone()),
            Content::Path(p) => Ok(Bytes::from(tokio::fs::read(p).await?)),
        }
    }
}

/// The value that actually appears in a serialized invocation result: a
/// stable download URL plus the declared media type. `href` is minted by
/// [`BlobRegistry::register`] at the point the action registers its blob,
/// not re-derived later.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BlobRef {
    pub href: String,
    pub media_type: String,
}

/// Server-wide registry of live blobs, keyed by id. A blob is invalidated
/// (and its bytes dropped) when the invocation that produced it expires
/// out of the action manager's retention window (spec.md 4.2/4.5): callers
/// are expected to call [`BlobRegistry::invalidate`] from the same
/// retention sweep that removes the `Invocation` record.
#[derive(Default)]
pub struct BlobRegistry {
    blobs: DashMap<Uuid, Arc<Blob>>,
}

impl BlobRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(&self, blob: Blob) -> BlobRef {
        let id = Uuid::new_v4();
        let media_type = blob.media_type().to_string();
        self.blobs.insert(id, Arc::new(blob));
        BlobRef {
            href: format!("/blob/{id}"),
            media_type,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<Blob>> {
        self.blobs.get(&id).map(|b| b.clone())
    }

    pub fn invalidate(&self, id: Uuid) {
        self.blobs.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registering_a_blob_mints_a_stable_href() {
        let registry = BlobRegistry::new();
        let blob_ref = registry.register(Blob::from_bytes("text/plain", b"hello".to_vec()));
        assert!(blob_ref.href.starts_with("/blob/"));
        assert_eq!(blob_ref.media_type, "text/plain");

        let id: Uuid = blob_ref.href.trim_start_matches("/blob/").parse().unwrap();
        let blob = registry.get(id).unwrap();
        assert_eq!(blob.read().await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn invalidated_blob_is_no_longer_retrievable() {
        let registry = BlobRegistry::new();
        let blob_ref = registry.register(Blob::from_bytes("text/plain", b"bye".to_vec()));
        let id: Uuid = blob_ref.href.trim_start_matches("/blob/").parse().unwrap();
        registry.invalidate(id);
        assert!(registry.get(id).is_none());
    }
}
