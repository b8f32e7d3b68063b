use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use super::{ObjectStore, ObjectStoreError, StoredObject};
use crate::models::FileUpload;

/// Keeps uploaded blobs in process memory and hands out `memory://` URLs
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().map(|o| o.contains_key(key)).unwrap_or(false)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, namespace: &str, file: &FileUpload) -> Result<StoredObject, ObjectStoreError> {
        let key = format!("{}/{}", namespace, Uuid::new_v4().simple());
        self.objects
            .write()
            .map_err(|_| ObjectStoreError::InvalidResponse("object map poisoned".to_string()))?
            .insert(key.clone(), file.bytes.clone());
        Ok(StoredObject {
            url: format!("memory://{}", key),
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.objects
            .write()
            .map_err(|_| ObjectStoreError::InvalidResponse("object map poisoned".to_string()))?
            .remove(key);
        Ok(())
    }
}
