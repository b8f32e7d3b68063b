// handlers/properties/update.rs - PUT /properties/:id handler

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{Extension, Path, State};
use axum::response::Json;

use super::form::read_form;
use super::run_operation;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::models::Property;
use crate::services::ServiceError;

/// PUT /properties/:id - Replace the editable fields of an owned listing.
/// Same body shape as create; submitted images are appended.
pub async fn property_update(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Property>, ApiError> {
    if caller.is_none() {
        return Err(state.api_error(ServiceError::AuthenticationRequired));
    }

    let (fields, images) = read_form(multipart).await?.into_parts()?;
    let property = run_operation(&state, caller, move |service, ctx| async move {
        service.update_property(&ctx, &id, fields, images).await
    })
    .await?;
    Ok(Json(property))
}
