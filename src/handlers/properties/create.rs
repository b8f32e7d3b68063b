// handlers/properties/create.rs - POST /properties handler

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{Extension, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use super::form::read_form;
use super::run_operation;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::services::ServiceError;

/// POST /properties - Create a listing owned by the caller
///
/// Multipart body with dotted text keys (`location.city`, `rates.weekly`,
/// `seller_info.email`), repeated `amenities`, and repeated `images` files.
///
/// Responds `303 See Other` to `{public_base_url}/properties/{id}` when a
/// public base URL is configured, otherwise `200 { id, property }`.
pub async fn property_create(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    if caller.is_none() {
        return Err(state.api_error(ServiceError::AuthenticationRequired));
    }

    let (fields, images) = read_form(multipart).await?.into_parts()?;
    let property = run_operation(&state, caller, move |service, ctx| async move {
        service.create_property(&ctx, fields, images).await
    })
    .await?;

    let path = format!("/properties/{}", property.id);
    let response = match state.api.public_base_url.as_deref() {
        Some(base) => (StatusCode::SEE_OTHER, [(header::LOCATION, format!("{}{}", base, path))]).into_response(),
        None => (
            StatusCode::OK,
            [(header::LOCATION, path)],
            Json(json!({ "id": property.id, "property": property })),
        )
            .into_response(),
    };
    Ok(response)
}
