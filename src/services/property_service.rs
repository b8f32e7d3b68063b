use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn, Span};
use uuid::Uuid;

use super::authorization::authorize;
use super::context::OperationContext;
use super::error::ServiceError;
use crate::config::{IngestionConfig, PaginationConfig};
use crate::database::PropertyStore;
use crate::filter::{build_search_filter, Field, Pagination, Predicate, MAX_SEARCH_TERM_CHARS};
use crate::ingest::{ImagePipeline, ObjectStore, StoredObject};
use crate::models::{FileUpload, NewProperty, Property, PropertyFields};

/// One page of listings plus the unwindowed total
#[derive(Debug, Clone, Serialize)]
pub struct PropertyPage {
    pub total: u64,
    pub properties: Vec<Property>,
}

/// Service wired against trait objects, as used by the HTTP layer
pub type DynPropertyService = PropertyService<dyn PropertyStore, dyn ObjectStore>;

/// Property listing use cases. Owns no state beyond its collaborators, so
/// every operation can run concurrently.
pub struct PropertyService<S: PropertyStore + ?Sized, O: ObjectStore + ?Sized> {
    store: Arc<S>,
    pipeline: ImagePipeline<O>,
    pagination: PaginationConfig,
    cleanup_on_failure: bool,
}

impl<S: PropertyStore + ?Sized, O: ObjectStore + ?Sized> PropertyService<S, O> {
    pub fn new(store: Arc<S>, objects: Arc<O>, pagination: PaginationConfig, ingestion: &IngestionConfig) -> Self {
        Self {
            store,
            pipeline: ImagePipeline::new(objects, ingestion),
            pagination,
            cleanup_on_failure: ingestion.cleanup_on_failure,
        }
    }

    pub fn pagination_config(&self) -> &PaginationConfig {
        &self.pagination
    }

    /// Store reachability for `/health`
    pub async fn ping(&self) -> Result<(), ServiceError> {
        self.store.ping().await.map_err(ServiceError::from)
    }

    #[instrument(skip_all, fields(op = "list_properties", caller = %ctx.caller_label(), page = pagination.page, page_size = pagination.page_size))]
    pub async fn list_properties(&self, ctx: &OperationContext, pagination: Pagination) -> Result<PropertyPage, ServiceError> {
        let total = ctx.run(self.store.count(&Predicate::All)).await.inspect_err(log_failure)?;
        let properties = ctx
            .run(self.store.find(&Predicate::All, Some(pagination.window())))
            .await
            .inspect_err(log_failure)?;
        Ok(PropertyPage { total, properties })
    }

    #[instrument(skip_all, fields(op = "get_property", caller = %ctx.caller_label(), property_id = %raw_id))]
    pub async fn get_property(&self, ctx: &OperationContext, raw_id: &str) -> Result<Property, ServiceError> {
        let id = parse_id(raw_id).inspect_err(log_failure)?;
        self.load(ctx, id).await.inspect_err(log_failure)
    }

    #[instrument(skip_all, fields(op = "list_featured", caller = %ctx.caller_label()))]
    pub async fn list_featured(&self, ctx: &OperationContext) -> Result<Vec<Property>, ServiceError> {
        ctx.run(self.store.find(&Predicate::eq(Field::IsFeatured, true), None))
            .await
            .inspect_err(log_failure)
    }

    #[instrument(skip_all, fields(op = "list_by_owner", caller = %ctx.caller_label(), owner = %owner))]
    pub async fn list_by_owner(&self, ctx: &OperationContext, owner: &str) -> Result<Vec<Property>, ServiceError> {
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(ServiceError::InvalidRequest("User ID is required".to_string())).inspect_err(log_failure);
        }
        ctx.run(self.store.find(&Predicate::eq(Field::Owner, owner), None))
            .await
            .inspect_err(log_failure)
    }

    #[instrument(skip_all, fields(op = "search_properties", caller = %ctx.caller_label()))]
    pub async fn search_properties(
        &self,
        ctx: &OperationContext,
        location: Option<&str>,
        property_type: Option<&str>,
    ) -> Result<Vec<Property>, ServiceError> {
        let location = location.unwrap_or("");
        if location.chars().count() > MAX_SEARCH_TERM_CHARS {
            return Err(ServiceError::InvalidRequest(format!(
                "Search term exceeds {} characters",
                MAX_SEARCH_TERM_CHARS
            )))
            .inspect_err(log_failure);
        }
        let filter = build_search_filter(location, property_type);
        debug!(?filter, "search filter");
        ctx.run(self.store.find(&filter, None)).await.inspect_err(log_failure)
    }

    /// Create a listing owned by the caller. Images are stored before the
    /// record is written; a failed upload writes no record.
    #[instrument(skip_all, fields(op = "create_property", caller = %ctx.caller_label(), property_id = tracing::field::Empty))]
    pub async fn create_property(
        &self,
        ctx: &OperationContext,
        fields: PropertyFields,
        files: Vec<FileUpload>,
    ) -> Result<Property, ServiceError> {
        self.create(ctx, fields, files).await.inspect_err(log_failure)
    }

    async fn create(&self, ctx: &OperationContext, mut fields: PropertyFields, files: Vec<FileUpload>) -> Result<Property, ServiceError> {
        let owner = ctx.require_caller()?.clone();
        if owner.as_str().trim().is_empty() {
            let mut errors = HashMap::new();
            errors.insert("owner".to_string(), "This field is required".to_string());
            return Err(ServiceError::Validation(errors));
        }
        fields.validate().map_err(ServiceError::Validation)?;
        fields.dedup_amenities();
        let files = self
            .pipeline
            .accept(files)
            .map_err(|e| ServiceError::InvalidRequest(e.to_string()))?;

        let stored = self.ingest(ctx, files).await?;
        let new = NewProperty {
            fields,
            images: stored.iter().map(|s| s.url.clone()).collect(),
            owner,
        };

        match ctx.run(self.store.insert(new)).await {
            Ok(property) => {
                Span::current().record("property_id", tracing::field::display(property.id));
                info!(images = property.images.len(), "property created");
                Ok(property)
            }
            Err(e) => {
                self.cleanup(&stored).await;
                Err(e)
            }
        }
    }

    /// Replace the editable fields of a listing the caller owns. Newly
    /// submitted images are appended to the existing ones.
    #[instrument(skip_all, fields(op = "update_property", caller = %ctx.caller_label(), property_id = %raw_id))]
    pub async fn update_property(
        &self,
        ctx: &OperationContext,
        raw_id: &str,
        fields: PropertyFields,
        files: Vec<FileUpload>,
    ) -> Result<Property, ServiceError> {
        self.update(ctx, raw_id, fields, files).await.inspect_err(log_failure)
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        raw_id: &str,
        mut fields: PropertyFields,
        files: Vec<FileUpload>,
    ) -> Result<Property, ServiceError> {
        let caller = ctx.require_caller()?;
        let id = parse_id(raw_id)?;
        let existing = self.load(ctx, id).await?;
        authorize(Some(caller), &existing.owner)?;

        fields.validate().map_err(ServiceError::Validation)?;
        fields.dedup_amenities();
        let files = self
            .pipeline
            .accept(files)
            .map_err(|e| ServiceError::InvalidRequest(e.to_string()))?;

        let stored = self.ingest(ctx, files).await?;
        let mut images = existing.images;
        images.extend(stored.iter().map(|s| s.url.clone()));

        match ctx.run(self.store.replace(id, fields, images)).await {
            Ok(Some(property)) => {
                info!(added_images = stored.len(), "property updated");
                Ok(property)
            }
            Ok(None) => {
                self.cleanup(&stored).await;
                Err(ServiceError::property_not_found())
            }
            Err(e) => {
                self.cleanup(&stored).await;
                Err(e)
            }
        }
    }

    #[instrument(skip_all, fields(op = "delete_property", caller = %ctx.caller_label(), property_id = %raw_id))]
    pub async fn delete_property(&self, ctx: &OperationContext, raw_id: &str) -> Result<(), ServiceError> {
        self.delete(ctx, raw_id).await.inspect_err(log_failure)
    }

    async fn delete(&self, ctx: &OperationContext, raw_id: &str) -> Result<(), ServiceError> {
        let caller = ctx.require_caller()?;
        let id = parse_id(raw_id)?;
        let existing = self.load(ctx, id).await?;
        authorize(Some(caller), &existing.owner)?;

        if !ctx.run(self.store.delete(id)).await? {
            return Err(ServiceError::property_not_found());
        }
        info!("property deleted");
        Ok(())
    }

    async fn load(&self, ctx: &OperationContext, id: Uuid) -> Result<Property, ServiceError> {
        ctx.run(self.store.find_by_id(id))
            .await?
            .ok_or_else(ServiceError::property_not_found)
    }

    /// Upload a batch; on failure the partially stored objects are cleaned
    /// up before the error is returned.
    async fn ingest(&self, ctx: &OperationContext, files: Vec<FileUpload>) -> Result<Vec<StoredObject>, ServiceError> {
        if files.is_empty() {
            return Ok(vec![]);
        }
        let batch = self.pipeline.ingest(files, &ctx.cancel);
        let outcome = match ctx.deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, batch).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("deadline passed during image ingestion; stored images may be orphaned");
                    return Err(ServiceError::Cancelled);
                }
            },
            None => batch.await,
        };
        match outcome {
            Ok(stored) => Ok(stored),
            Err(e) => {
                self.cleanup(e.stored()).await;
                Err(ServiceError::Ingestion(e))
            }
        }
    }

    async fn cleanup(&self, stored: &[StoredObject]) {
        if stored.is_empty() {
            return;
        }
        if self.cleanup_on_failure {
            self.pipeline.discard(stored).await;
        } else {
            warn!(orphans = stored.len(), "leaving orphaned images in object store");
        }
    }
}

/// Malformed ids are indistinguishable from unknown ones
fn parse_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::property_not_found())
}

fn log_failure(err: &ServiceError) {
    match err {
        ServiceError::Upstream(_) | ServiceError::Ingestion(_) => error!(error = %err, "operation failed"),
        ServiceError::Cancelled => warn!(error = %err, "operation cancelled"),
        _ => debug!(error = %err, "operation rejected"),
    }
}
