// handlers/properties/list.rs - GET /properties handler

use axum::extract::{Extension, Query, State};
use axum::response::Json;

use super::run_operation;
use crate::app::AppState;
use crate::error::ApiError;
use crate::filter::{PageQuery, Pagination};
use crate::middleware::Caller;
use crate::services::PropertyPage;

/// GET /properties?page=&pageSize= - One page of listings plus the total count.
/// Missing or non-numeric paging values fall back to page 1 and the default
/// page size; oversized pages are capped.
pub async fn property_list(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PropertyPage>, ApiError> {
    let pagination = Pagination::from_query(&query, state.service.pagination_config());
    let page = run_operation(&state, caller, move |service, ctx| async move {
        service.list_properties(&ctx, pagination).await
    })
    .await?;
    Ok(Json(page))
}
