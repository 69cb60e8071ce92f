use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use marg_core::{
    Annotation, AnnotationRepository, AnnotationResult, Fields, SearchQuery, SearchResult,
    DEFAULT_LIMIT,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ServerError, ServerResult};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<AnnotationRepository>,
}

impl AppState {
    pub fn new(repository: AnnotationRepository) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }
}

/// Run a repository call on the blocking pool.
async fn blocking<T, F>(state: &AppState, op: F) -> ServerResult<T>
where
    F: FnOnce(&AnnotationRepository) -> AnnotationResult<T> + Send + 'static,
    T: Send + 'static,
{
    let repository = Arc::clone(&state.repository);
    tokio::task::spawn_blocking(move || op(&repository))
        .await
        .map_err(|e| ServerError::Internal(format!("repository task failed: {e}")))?
        .map_err(ServerError::from)
}

/// `GET /`
pub async fn info_handler() -> Json<Value> {
    Json(json!({
        "name": "marginalia",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /annotations`
pub async fn list_handler(State(state): State<AppState>) -> ServerResult<Json<Vec<Annotation>>> {
    let rows = blocking(&state, |repo| repo.fetch_all()).await?;
    Ok(Json(rows.into_iter().map(|(_, a)| a).collect()))
}

/// `POST /annotations`
pub async fn create_handler(
    State(state): State<AppState>,
    Json(fields): Json<Fields>,
) -> ServerResult<Json<Annotation>> {
    let created = blocking(&state, move |repo| repo.create(fields)).await?;
    Ok(Json(created))
}

/// `GET /annotations/:id`
pub async fn read_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Annotation>> {
    blocking(&state, move |repo| repo.fetch_by_id(&id))
        .await?
        .map(|(_, a)| Json(a))
        .ok_or(ServerError::NotFound)
}

/// `PUT /annotations/:id`
pub async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<Fields>,
) -> ServerResult<Json<Annotation>> {
    blocking(&state, move |repo| repo.update(&id, patch))
        .await?
        .map(Json)
        .ok_or(ServerError::NotFound)
}

/// `DELETE /annotations/:id`
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<StatusCode> {
    if blocking(&state, move |repo| repo.delete(&id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::NotFound)
    }
}

/// Raw `/search` query string. Numbers stay text so a bad value falls back
/// to its default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub uri: Option<String>,
    pub text: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl SearchParams {
    pub fn into_query(self) -> SearchQuery {
        let number = |raw: Option<String>, default: i64| {
            raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
        };
        SearchQuery {
            uri: self.uri.filter(|s| !s.is_empty()),
            text: self.text.filter(|s| !s.is_empty()),
            limit: number(self.limit, DEFAULT_LIMIT),
            offset: number(self.offset, 0),
        }
    }
}

/// `GET /search`
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ServerResult<Json<SearchResult>> {
    let query = params.into_query();
    let result = blocking(&state, move |repo| repo.search(&query)).await?;
    Ok(Json(result))
}
