use std::sync::Arc;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{IngestionError, ObjectStore, ObjectStoreError, StoredObject};
use crate::config::IngestionConfig;
use crate::models::FileUpload;

#[derive(Debug, Error)]
#[error("image #{index} ({name}) rejected: {reason}")]
pub struct ImageRejected {
    pub index: usize,
    pub name: String,
    pub reason: String,
}

enum Stop {
    Failed(usize, ObjectStoreError),
    Cancelled,
}

/// Uploads a batch of images with bounded fan-out.
pub struct ImagePipeline<O: ObjectStore + ?Sized> {
    store: Arc<O>,
    namespace: String,
    max_concurrency: usize,
    max_image_bytes: usize,
}

impl<O: ObjectStore + ?Sized> ImagePipeline<O> {
    pub fn new(store: Arc<O>, config: &IngestionConfig) -> Self {
        Self {
            store,
            namespace: config.namespace.clone(),
            max_concurrency: config.max_concurrency.max(1),
            max_image_bytes: config.max_image_bytes,
        }
    }

    /// Drop unset file inputs (empty name) and check the rest before any
    /// upload starts.
    pub fn accept(&self, files: Vec<FileUpload>) -> Result<Vec<FileUpload>, ImageRejected> {
        let files: Vec<FileUpload> = files.into_iter().filter(|f| !f.name.is_empty()).collect();
        for (index, file) in files.iter().enumerate() {
            let reject = |reason: String| ImageRejected { index, name: file.name.clone(), reason };
            if file.bytes.is_empty() {
                return Err(reject("file is empty".to_string()));
            }
            if file.bytes.len() > self.max_image_bytes {
                return Err(reject(format!("file exceeds max size of {} bytes", self.max_image_bytes)));
            }
            if let Some(ct) = file.content_type.as_deref() {
                if !ct.starts_with("image/") && ct != "application/octet-stream" {
                    return Err(reject(format!("unsupported content type '{}'", ct)));
                }
            }
        }
        Ok(files)
    }

    /// Upload every named file and return the stored objects in input order.
    ///
    /// At most `max_concurrency` uploads are in flight. The first failure
    /// (or cancellation) stops the batch: no further uploads are started,
    /// in-flight ones are abandoned, and the error reports what was already
    /// stored. Nothing is rolled back here.
    pub async fn ingest(&self, files: Vec<FileUpload>, cancel: &CancellationToken) -> Result<Vec<StoredObject>, IngestionError> {
        let files: Vec<FileUpload> = files.into_iter().filter(|f| !f.name.is_empty()).collect();
        if files.is_empty() {
            return Ok(vec![]);
        }

        let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        let mut slots: Vec<Option<StoredObject>> = vec![None; files.len()];

        // Each upload owns its inputs so the batch stays `Send` when spawned
        let mut uploads = stream::iter(files.into_iter().enumerate())
            .map(|(index, file)| {
                let store = Arc::clone(&self.store);
                let namespace = self.namespace.clone();
                async move { (index, store.put(&namespace, &file).await) }
            })
            .buffer_unordered(self.max_concurrency);

        let stop = loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Some(Stop::Cancelled),
                next = uploads.next() => next,
            };
            match next {
                None => break None,
                Some((index, Ok(object))) => {
                    debug!(index, url = %object.url, "image stored");
                    slots[index] = Some(object);
                }
                Some((index, Err(e))) => break Some(Stop::Failed(index, e)),
            }
        };
        drop(uploads);

        let complete = slots.iter().all(Option::is_some);
        let stored: Vec<StoredObject> = slots.into_iter().flatten().collect();

        match stop {
            None if complete => Ok(stored),
            Some(Stop::Failed(index, source)) => {
                let name = names[index].clone();
                warn!(index, name = %name, stored = stored.len(), error = %source, "image upload failed");
                Err(IngestionError::Upload {
                    index,
                    name,
                    stored,
                    source,
                })
            }
            Some(Stop::Cancelled) | None => {
                warn!(stored = stored.len(), "image ingestion cancelled");
                Err(IngestionError::Cancelled { stored })
            }
        }
    }

    /// Best-effort removal of objects from a batch that will not be used.
    /// Failures are logged, never returned.
    pub async fn discard(&self, objects: &[StoredObject]) {
        if objects.is_empty() {
            return;
        }
        let results = stream::iter(objects.iter().cloned())
            .map(|object| {
                let store = Arc::clone(&self.store);
                async move {
                    let result = store.delete(&object.key).await;
                    (object, result)
                }
            })
            .buffer_unordered(self.max_concurrency)
            .collect::<Vec<_>>()
            .await;
        for (object, result) in results {
            match result {
                Ok(()) => debug!(key = %object.key, "discarded orphan image"),
                Err(e) => warn!(key = %object.key, error = %e, "failed to discard orphan image"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Delays each upload by the number in its file name (ms) and fails files
    /// named `fail*`.
    #[derive(Default)]
    struct ScriptedStore {
        puts: AtomicUsize,
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStore for ScriptedStore {
        async fn put(&self, namespace: &str, file: &FileUpload) -> Result<StoredObject, ObjectStoreError> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            let delay: u64 = file.name.trim_start_matches(|c: char| !c.is_ascii_digit()).parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if file.name.starts_with("fail") {
                return Err(ObjectStoreError::Rejected { status: 500, message: "boom".into() });
            }
            Ok(StoredObject {
                url: format!("memory://{}/{}", namespace, file.name),
                key: format!("{}/{}", namespace, file.name),
            })
        }

        async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
            self.deleted.lock().unwrap().push(key.to_string());
            Ok(())
        }
    }

    fn file(name: &str) -> FileUpload {
        FileUpload {
            name: name.to_string(),
            content_type: Some("image/png".into()),
            bytes: vec![1, 2, 3],
        }
    }

    fn pipeline(store: Arc<ScriptedStore>, max_concurrency: usize) -> ImagePipeline<ScriptedStore> {
        ImagePipeline::new(
            store,
            &IngestionConfig {
                namespace: "propertypulse".into(),
                max_concurrency,
                max_image_bytes: 1024,
                cleanup_on_failure: true,
            },
        )
    }

    #[tokio::test]
    async fn output_order_matches_input_order() {
        let store = Arc::new(ScriptedStore::default());
        let p = pipeline(store.clone(), 4);
        let files = vec![file("a40"), file("b1"), file("c20"), file("d5")];
        let stored = p.ingest(files, &CancellationToken::new()).await.unwrap();
        let urls: Vec<_> = stored.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "memory://propertypulse/a40",
                "memory://propertypulse/b1",
                "memory://propertypulse/c20",
                "memory://propertypulse/d5"
            ]
        );
        assert_eq!(store.puts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn empty_names_are_skipped() {
        let store = Arc::new(ScriptedStore::default());
        let p = pipeline(store.clone(), 2);
        let stored = p.ingest(vec![file(""), file("a1")], &CancellationToken::new()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(store.puts.load(Ordering::SeqCst), 1);
        assert!(p.ingest(vec![file("")], &CancellationToken::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn first_failure_stops_further_uploads() {
        let store = Arc::new(ScriptedStore::default());
        let p = pipeline(store.clone(), 1);
        let files = vec![file("a1"), file("fail1"), file("c1"), file("d1")];
        let err = p.ingest(files, &CancellationToken::new()).await.unwrap_err();
        match &err {
            IngestionError::Upload { index, name, stored, .. } => {
                assert_eq!(*index, 1);
                assert_eq!(name, "fail1");
                assert_eq!(stored.len(), 1);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(err.stored_count(), 1);
        assert_eq!(store.puts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancellation_fails_the_batch() {
        let store = Arc::new(ScriptedStore::default());
        let p = pipeline(store, 1);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = p.ingest(vec![file("a50"), file("b50")], &cancel).await.unwrap_err();
        assert!(matches!(err, IngestionError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn discard_deletes_every_key() {
        let store = Arc::new(ScriptedStore::default());
        let p = pipeline(store.clone(), 2);
        let objects = vec![
            StoredObject { url: "u1".into(), key: "k1".into() },
            StoredObject { url: "u2".into(), key: "k2".into() },
        ];
        p.discard(&objects).await;
        let mut deleted = store.deleted.lock().unwrap().clone();
        deleted.sort();
        assert_eq!(deleted, vec!["k1", "k2"]);
    }

    #[test]
    fn accept_rejects_oversized_and_non_images() {
        let p = pipeline(Arc::new(ScriptedStore::default()), 1);
        let big = FileUpload { bytes: vec![0; 2048], ..file("big.png") };
        assert_eq!(p.accept(vec![file(""), big]).unwrap_err().index, 0);

        let pdf = FileUpload { content_type: Some("application/pdf".into()), ..file("doc.pdf") };
        assert!(p.accept(vec![pdf]).is_err());

        assert_eq!(p.accept(vec![file(""), file("ok.png")]).unwrap().len(), 1);
    }
}
