use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::debug;

use super::{
    error::ApiError,
    models::{
        CallerQuery, ConflictsResponse, HandlerList, HandlerQuery, HealthResponse, OwnerQuery,
        RemovedResponse, ResolveQuery, SearchQuery, ValuesResponse,
    },
    state::AppState,
};
use crate::handlers::{Field, HandlerRecord, SearchMode};
use crate::observability::MetricsSnapshot;

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        handlers: state.registry.len().await,
    })
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.registry.metrics().snapshot())
}

/// `GET /handlers`
pub async fn list_handlers(State(state): State<AppState>) -> Json<HandlerList> {
    Json(state.registry.list().await.into())
}

/// `POST /handlers`
pub async fn register_handler(
    State(state): State<AppState>,
    Json(record): Json<HandlerRecord>,
) -> Result<(StatusCode, Json<HandlerRecord>), ApiError> {
    let registered = state.registry.register(record).await?;
    Ok((StatusCode::CREATED, Json(HandlerRecord::clone(&registered))))
}

/// `DELETE /handlers/{id}`
pub async fn unregister_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.registry.unregister(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("handler {id}")))
    }
}

/// `GET /handlers/{id}?caller=&mode=exact|prefix`
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HandlerQuery>,
) -> Result<Json<HandlerRecord>, ApiError> {
    let mode = match query.mode.as_deref() {
        Some(mode) => mode.parse::<SearchMode>()?,
        None => SearchMode::Exact,
    };

    state
        .registry
        .get_handler(&query.caller, &id, mode)
        .await
        .map(|record| Json(HandlerRecord::clone(&record)))
        .ok_or_else(|| ApiError::NotFound(format!("handler {id}")))
}

/// `GET /handlers/{id}/fields/{field}`
pub async fn get_array_field(
    State(state): State<AppState>,
    Path((id, field)): Path<(String, String)>,
) -> Result<Json<ValuesResponse>, ApiError> {
    let field: Field = field.parse()?;
    let values = state.registry.get_array_field(&id, field).await?;
    Ok(Json(ValuesResponse { field, values }))
}

/// `GET /search?caller=&field=&value=`
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<HandlerList>, ApiError> {
    let field: Field = query.field.parse()?;
    let found = state
        .registry
        .find_handler(&query.caller, field, &query.value)
        .await?;
    Ok(Json(found.into()))
}

/// `GET /values/{field}?caller=`
pub async fn list_values(
    State(state): State<AppState>,
    Path(field): Path<String>,
    Query(query): Query<CallerQuery>,
) -> Result<Json<ValuesResponse>, ApiError> {
    let field: Field = field.parse()?;
    let values = state.registry.get_values(&query.caller, field).await;
    Ok(Json(ValuesResponse { field, values }))
}

/// `GET /conflicts/{id}`
pub async fn conflicts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ConflictsResponse> {
    let found = state.registry.find_conflicted(&id).await;
    debug!(id = %id, conflicts = found.len(), "Conflict check");
    Json(ConflictsResponse {
        id,
        conflicts: HandlerList::from(found).handlers,
    })
}

/// `GET /owners/{owner}/handlers?class=`
pub async fn owner_handlers(
    State(state): State<AppState>,
    Path(owner): Path<u32>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<HandlerList>, ApiError> {
    let records: Vec<Arc<HandlerRecord>> = match query.class {
        Some(class) => state
            .registry
            .get_handler_by_owner(owner, &class)
            .await?
            .into_iter()
            .collect(),
        None => state.registry.records_for_owner(owner).await,
    };
    Ok(Json(records.into()))
}

/// `DELETE /owners/{owner}/handlers`
pub async fn unregister_owner(
    State(state): State<AppState>,
    Path(owner): Path<u32>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let removed = state.registry.unregister_owner(owner).await?;
    Ok(Json(RemovedResponse { removed }))
}

/// `GET /resolve?caller=&url=&action=`
pub async fn resolve(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<HandlerRecord>, ApiError> {
    state
        .registry
        .resolve_by_url(&query.caller, &query.url, &query.action)
        .await
        .map(|record| Json(HandlerRecord::clone(&record)))
        .ok_or_else(|| ApiError::NotFound(format!("handler for {}", query.url)))
}
