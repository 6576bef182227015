use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::error::MultiverseError;
use crate::fetch::Transport;
use crate::record::{Character, Episode, Location, Record, RecordId, Ref};
use crate::view::View;

pub type SharedView<R, T> = Arc<Mutex<View<R, T>>>;

/// One view per record kind, each behind its own lock.
pub struct Views<T: Transport> {
    pub characters: SharedView<Character, T>,
    pub locations: SharedView<Location, T>,
    pub episodes: SharedView<Episode, T>,
}

impl<T: Transport> Views<T> {
    pub fn new(transport: T, base_url: &str, page_size: NonZeroUsize) -> Self {
        Self {
            characters: Arc::new(Mutex::new(View::new(transport.clone(), base_url, page_size))),
            locations: Arc::new(Mutex::new(View::new(transport.clone(), base_url, page_size))),
            episodes: Arc::new(Mutex::new(View::new(transport, base_url, page_size))),
        }
    }
}

#[derive(Serialize)]
pub struct PageResponse<R> {
    pub status: &'static str,
    pub items: Vec<Ref<R>>,
    pub page: usize,
    pub total_pages: usize,
    pub total_count: usize,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }
}

impl From<MultiverseError> for ApiError {
    fn from(e: MultiverseError) -> Self {
        let status = match &e {
            MultiverseError::UnknownField { .. } => StatusCode::BAD_REQUEST,
            MultiverseError::UnknownRecord { .. } => StatusCode::NOT_FOUND,
            MultiverseError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self { status, message: e.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(msg = %self.message, code = %self.status.as_u16(), "request error");
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

pub fn router<T: Transport>(views: Views<T>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);
    Router::new()
        .merge(view_routes(views.characters))
        .merge(view_routes(views.locations))
        .merge(view_routes(views.episodes))
        .layer(cors)
}

fn view_routes<R, T>(view: SharedView<R, T>) -> Router
where
    R: Record,
    T: Transport,
{
    let list_path = format!("/v1/{}", R::COLLECTION);
    let refs_path = format!("/v1/{}/:id/refs", R::COLLECTION);
    Router::new()
        .route(&list_path, get(list::<R, T>))
        .route(&refs_path, get(refs::<R, T>))
        .with_state(view)
}

fn parse_positive(name: &str, raw: &str) -> Result<NonZeroUsize, ApiError> {
    raw.trim()
        .parse::<NonZeroUsize>()
        .map_err(|_| ApiError::bad_request(format!("{name} must be a positive integer, got '{raw}'")))
}

/// `GET /v1/<collection>?<field>=…&page=…&page_size=…&refresh=1`
async fn list<R: Record, T: Transport>(
    State(view): State<SharedView<R, T>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PageResponse<R>>, ApiError> {
    let started = std::time::Instant::now();
    // one request at a time per view; a request arriving mid-aggregation waits
    // for it and then renders its own inputs
    let mut guard = view.lock().await;
    let mut next = guard.inputs().clone();
    for policy in R::FILTERS {
        next.filter.set(policy.field, params.get(policy.field).map(String::as_str).unwrap_or(""));
    }
    if let Some(raw) = params.get("page") {
        next.pagination = next.pagination.with_page(parse_positive("page", raw)?.get());
    }
    if let Some(raw) = params.get("page_size") {
        next.pagination = next.pagination.with_page_size(parse_positive("page_size", raw)?);
    }
    let refresh = params.get("refresh").is_some_and(|v| v == "1" || v == "true");
    let planned = guard.update(next)?;
    let pending = match planned {
        Some(pending) => Some(pending),
        None if refresh => Some(guard.reload()),
        None => None,
    };
    if let Some(pending) = pending {
        let done = pending.run().await;
        // a failed aggregation leaves the view empty, which is what gets rendered
        let _ = guard.apply(done);
    }
    let page = guard.page();
    let body = PageResponse {
        status: guard.status().as_str(),
        items: page.items.to_vec(),
        page: page.page,
        total_pages: page.total_pages,
        total_count: page.total_count,
    };
    drop(guard);
    let ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(collection = R::COLLECTION, ms, page = body.page, total_pages = body.total_pages, status = body.status, "list served");
    Ok(Json(body))
}

/// `GET /v1/<collection>/<id>/refs`
async fn refs<R: Record, T: Transport>(
    State(view): State<SharedView<R, T>>,
    Path(id): Path<RecordId>,
) -> Result<Json<Vec<R::Detail>>, ApiError> {
    let request = view.lock().await.details(id)?;
    let details = request.run().await?;
    info!(collection = R::COLLECTION, id, resolved = details.len(), "cross-references served");
    Ok(Json(details))
}
