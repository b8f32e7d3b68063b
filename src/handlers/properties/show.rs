// handlers/properties/show.rs - GET /properties/:id handler

use axum::extract::{Extension, Path, State};
use axum::response::Json;

use super::run_operation;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::models::Property;

pub async fn property_show(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<Property>, ApiError> {
    let property = run_operation(&state, caller, move |service, ctx| async move {
        service.get_property(&ctx, &id).await
    })
    .await?;
    Ok(Json(property))
}
