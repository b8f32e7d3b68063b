// handlers/properties/delete.rs - DELETE /properties/:id handler

use axum::extract::{Extension, Path, State};
use axum::response::Json;
use serde_json::{json, Value};

use super::run_operation;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::Caller;

pub async fn property_delete(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    run_operation(&state, caller, move |service, ctx| async move {
        service.delete_property(&ctx, &id).await
    })
    .await?;
    Ok(Json(json!({ "message": "Property deleted" })))
}
