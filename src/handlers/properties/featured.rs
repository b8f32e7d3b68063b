// handlers/properties/featured.rs - GET /properties/featured handler

use axum::extract::{Extension, State};
use axum::response::Json;

use super::run_operation;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::models::Property;

pub async fn property_featured(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
) -> Result<Json<Vec<Property>>, ApiError> {
    let properties = run_operation(&state, caller, |service, ctx| async move {
        service.list_featured(&ctx).await
    })
    .await?;
    Ok(Json(properties))
}
