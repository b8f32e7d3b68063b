//! Image ingestion: turns submitted file parts into durable object-store URLs.

pub mod cloudinary;
pub mod memory;
pub mod pipeline;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::FileUpload;

pub use cloudinary::{CloudinaryConfig, CloudinaryStore};
pub use memory::MemoryObjectStore;
pub use pipeline::{ImagePipeline, ImageRejected};

/// An object durably written to the object store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub url: String,
    /// Store-specific handle used for deletion
    pub key: String,
}

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("object store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected object store response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Binary blob storage. Calls are independent; there is no transaction
/// spanning several puts.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, namespace: &str, file: &FileUpload) -> Result<StoredObject, ObjectStoreError>;

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
}

/// Failure of an ingestion batch. `stored` lists the objects that were
/// already written before the batch stopped, in input order.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("upload of image #{index} ({name}) failed after {} image(s) stored", .stored.len())]
    Upload {
        index: usize,
        name: String,
        stored: Vec<StoredObject>,
        #[source]
        source: ObjectStoreError,
    },

    #[error("ingestion cancelled after {} image(s) stored", .stored.len())]
    Cancelled { stored: Vec<StoredObject> },
}

impl IngestionError {
    pub fn stored(&self) -> &[StoredObject] {
        match self {
            IngestionError::Upload { stored, .. } | IngestionError::Cancelled { stored } => stored,
        }
    }

    pub fn stored_count(&self) -> usize {
        self.stored().len()
    }
}
