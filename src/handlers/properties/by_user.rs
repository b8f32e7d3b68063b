// handlers/properties/by_user.rs - GET /properties/user/:user_id handler

use axum::extract::{Extension, Path, State};
use axum::response::Json;

use super::run_operation;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::models::Property;

pub async fn property_by_user(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Property>>, ApiError> {
    let properties = run_operation(&state, caller, move |service, ctx| async move {
        service.list_by_owner(&ctx, &user_id).await
    })
    .await?;
    Ok(Json(properties))
}

/// GET /properties/user/ - owner id left out of the path
pub async fn property_by_user_missing(
    state: State<AppState>,
    caller: Extension<Caller>,
) -> Result<Json<Vec<Property>>, ApiError> {
    property_by_user(state, caller, Path(String::new())).await
}
