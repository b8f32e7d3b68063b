// handlers/properties/search.rs - GET /properties/search handler

use axum::extract::{Extension, Query, State};
use axum::response::Json;
use serde::Deserialize;

use super::run_operation;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::models::Property;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub location: Option<String>,
    #[serde(rename = "propertyType")]
    pub property_type: Option<String>,
}

/// GET /properties/search?location=&propertyType= - Case-insensitive literal
/// match of `location` against name, description and address fields.
/// `propertyType=All` (or absent) disables the type restriction.
pub async fn property_search(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Property>>, ApiError> {
    let properties = run_operation(&state, caller, move |service, ctx| async move {
        service
            .search_properties(&ctx, query.location.as_deref(), query.property_type.as_deref())
            .await
    })
    .await?;
    Ok(Json(properties))
}
