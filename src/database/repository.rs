use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::filter::{Predicate, Window};
use crate::models::{NewProperty, Property, PropertyFields};

/// Persistent store for property documents
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Number of records matching `filter`, ignoring any window
    async fn count(&self, filter: &Predicate) -> Result<u64, DatabaseError>;

    /// Records matching `filter` in stable insertion order, optionally windowed
    async fn find(&self, filter: &Predicate, window: Option<Window>) -> Result<Vec<Property>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, DatabaseError>;

    /// Insert a new record; the store assigns id and timestamps
    async fn insert(&self, property: NewProperty) -> Result<Property, DatabaseError>;

    /// Atomically replace the mutable fields and image list of an existing
    /// record. Owner, featured flag and creation time are never touched.
    /// Returns `None` when the record no longer exists.
    async fn replace(&self, id: Uuid, fields: PropertyFields, images: Vec<String>) -> Result<Option<Property>, DatabaseError>;

    /// Returns whether a record was removed
    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}
