// handlers/properties/mod.rs - Property listing handlers
//
// Every handler resolves the caller from the `Caller` extension set by the
// identity middleware and delegates to the property service.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::app::AppState;
use crate::error::ApiError;
use crate::models::Identity;
use crate::services::{DynPropertyService, OperationContext, ServiceError};

pub mod by_user;  // GET /properties/user/:user_id
pub mod create;   // POST /properties
pub mod delete;   // DELETE /properties/:id
pub mod featured; // GET /properties/featured
pub mod form;
pub mod list;     // GET /properties
pub mod search;   // GET /properties/search
pub mod show;     // GET /properties/:id
pub mod update;   // PUT /properties/:id

pub use by_user::{property_by_user, property_by_user_missing};
pub use create::property_create;
pub use delete::property_delete;
pub use featured::property_featured;
pub use list::property_list;
pub use search::property_search;
pub use show::property_show;
pub use update::property_update;

/// Run a service operation on its own task.
///
/// The operation's token is cancelled when the handler future is dropped
/// (client went away), which stops outstanding uploads and lets the task
/// clean up what it already stored. The configured request timeout becomes
/// the operation deadline.
pub(crate) async fn run_operation<T, F, Fut>(state: &AppState, caller: Option<Identity>, op: F) -> Result<T, ApiError>
where
    F: FnOnce(Arc<DynPropertyService>, OperationContext) -> Fut,
    Fut: Future<Output = Result<T, ServiceError>> + Send + 'static,
    T: Send + 'static,
{
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let mut ctx = OperationContext::new(caller).with_cancel(cancel);
    if state.api.request_timeout_secs > 0 {
        ctx = ctx.with_deadline(Instant::now() + Duration::from_secs(state.api.request_timeout_secs));
    }

    match tokio::spawn(op(state.service.clone(), ctx)).await {
        Ok(result) => result.map_err(|e| state.api_error(e)),
        Err(e) => {
            tracing::error!("Property operation task failed: {}", e);
            Err(ApiError::internal_server_error("Something went wrong"))
        }
    }
}
