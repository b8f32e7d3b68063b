pub mod authorization;
pub mod context;
pub mod error;
pub mod property_service;

pub use authorization::{authorize, Deny};
pub use context::OperationContext;
pub use error::ServiceError;
pub use property_service::{DynPropertyService, PropertyPage, PropertyService};
