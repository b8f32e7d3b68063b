use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::repository::PropertyStore;
use crate::filter::{Matcher, Predicate, Window};
use crate::models::{NewProperty, Property, PropertyFields};

/// Process-local store kept in insertion order. Used by tests and
/// `--store memory` development runs.
#[derive(Default)]
pub struct MemoryPropertyStore {
    records: RwLock<Vec<Property>>,
}

impl MemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a fully-formed record, e.g. a featured listing
    pub async fn seed(&self, property: Property) {
        self.records.write().await.push(property);
    }
}

fn compile(filter: &Predicate) -> Result<Matcher, DatabaseError> {
    Matcher::compile(filter).map_err(|e| DatabaseError::QueryError(e.to_string()))
}

#[async_trait]
impl PropertyStore for MemoryPropertyStore {
    async fn count(&self, filter: &Predicate) -> Result<u64, DatabaseError> {
        let matcher = compile(filter)?;
        let records = self.records.read().await;
        Ok(records.iter().filter(|p| matcher.matches(p)).count() as u64)
    }

    async fn find(&self, filter: &Predicate, window: Option<Window>) -> Result<Vec<Property>, DatabaseError> {
        let matcher = compile(filter)?;
        let records = self.records.read().await;
        let matching = records.iter().filter(|p| matcher.matches(p)).cloned();
        Ok(match window {
            Some(w) => matching
                .skip(usize::try_from(w.skip).unwrap_or(usize::MAX))
                .take(usize::try_from(w.limit).unwrap_or(usize::MAX))
                .collect(),
            None => matching.collect(),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, DatabaseError> {
        Ok(self.records.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, property: NewProperty) -> Result<Property, DatabaseError> {
        let now = Utc::now();
        let record = Property {
            id: Uuid::new_v4(),
            fields: property.fields,
            images: property.images,
            owner: property.owner,
            is_featured: false,
            created_at: now,
            updated_at: now,
        };
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn replace(&self, id: Uuid, fields: PropertyFields, images: Vec<String>) -> Result<Option<Property>, DatabaseError> {
        let mut records = self.records.write().await;
        Ok(records.iter_mut().find(|p| p.id == id).map(|record| {
            record.fields = fields;
            record.images = images;
            record.updated_at = Utc::now();
            record.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|p| p.id != id);
        Ok(records.len() != before)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
