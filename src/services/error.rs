use std::collections::HashMap;

use thiserror::Error;

use crate::database::DatabaseError;
use crate::ingest::IngestionError;
use crate::services::authorization::Deny;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("validation failed on {} field(s)", .0.len())]
    Validation(HashMap<String, String>),

    #[error("authentication required")]
    AuthenticationRequired,

    #[error("caller is not the owner")]
    AuthorizationDenied,

    #[error("{0} not found")]
    NotFound(String),

    #[error("image ingestion failed: {0}")]
    Ingestion(#[from] IngestionError),

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl ServiceError {
    pub fn property_not_found() -> Self {
        Self::NotFound("Property".to_string())
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        ServiceError::Upstream(err.to_string())
    }
}

impl From<Deny> for ServiceError {
    fn from(deny: Deny) -> Self {
        match deny {
            Deny::NoIdentity => ServiceError::AuthenticationRequired,
            Deny::NotOwner => ServiceError::AuthorizationDenied,
        }
    }
}
