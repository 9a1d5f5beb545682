//! HTTP handlers and router.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, instrument, warn};

use map_common::{Extent, ExtentRequest, MapError, MapResult, TileCoord};

use crate::metrics::Timer;
use crate::rendering::{render_geojson, render_map};
use crate::source::ServiceType;
use crate::state::AppState;

/// Build the service router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/metrics", get(api_metrics_handler))
        .route("/:key/tile/:z/:x/:y", get(tile_handler))
        .route(
            "/:key/image/:xmin/:ymin/:xmax/:ymax/:width/:height",
            get(image_handler),
        )
        .route("/:key/wms", get(wms_handler))
        .route("/:key/geojson", get(geojson_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

/// `/:key/image/:xmin/:ymin/:xmax/:ymax/:width/:height` segments.
type ImagePath = (String, f64, f64, f64, f64, u32, u32);

/// WMS-style query parameters.
#[derive(Debug, Deserialize)]
pub struct WmsParams {
    #[serde(rename = "BBOX", alias = "bbox")]
    bbox: Option<String>,
    #[serde(rename = "WIDTH", alias = "width")]
    width: Option<u32>,
    #[serde(rename = "HEIGHT", alias = "height")]
    height: Option<u32>,
}

/// Service index: every source and enabled service type.
pub async fn index_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(state.services())
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Prometheus text exposition.
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let body = state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

/// JSON metrics snapshot.
pub async fn api_metrics_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    Json(state.metrics.snapshot().await)
}

#[instrument(skip(state))]
pub async fn tile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((key, z, x, y)): Path<(String, u32, u32, String)>,
) -> Response {
    let (y_str, _) = y.rsplit_once('.').unwrap_or((&y, "png"));
    let y: u32 = match y_str.parse() {
        Ok(y) => y,
        Err(_) => {
            return error_response(MapError::InvalidRequest(format!("invalid tile row '{}'", y)))
        }
    };

    let request = ExtentRequest::from_tile(TileCoord::new(z, x, y));
    render_png(state, &key, ServiceType::Tile, request, None).await
}

#[instrument(skip(state))]
pub async fn image_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((key, xmin, ymin, xmax, ymax, width, height)): Path<ImagePath>,
) -> Response {
    let request = ExtentRequest::from_bounds(xmin, ymin, xmax, ymax);
    render_png(state, &key, ServiceType::Image, request, Some((width, height))).await
}

#[instrument(skip(state))]
pub async fn wms_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(key): Path<String>,
    Query(params): Query<WmsParams>,
) -> Response {
    let request = match params.bbox.as_deref() {
        Some(bbox) => match Extent::from_wms_string(bbox) {
            Ok(e) => ExtentRequest::from_bounds(e.min_x, e.min_y, e.max_x, e.max_y),
            Err(e) => return error_response(e),
        },
        None => match state.service_source(&key, ServiceType::Wms) {
            Ok(source) => {
                let e = source.descriptor.default_extent;
                ExtentRequest::from_bounds(e.min_x, e.min_y, e.max_x, e.max_y)
            }
            Err(e) => return error_response(e),
        },
    };

    let size = match (params.width, params.height) {
        (None, None) => None,
        (width, height) => match state.service_source(&key, ServiceType::Wms) {
            Ok(source) => Some((
                width.unwrap_or(source.descriptor.default_width),
                height.unwrap_or(source.descriptor.default_height),
            )),
            Err(e) => return error_response(e),
        },
    };

    render_png(state, &key, ServiceType::Wms, request, size).await
}

#[instrument(skip(state))]
pub async fn geojson_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(key): Path<String>,
) -> Response {
    state.metrics.record_request(ServiceType::Geojson);
    let source = match state.service_source(&key, ServiceType::Geojson) {
        Ok(source) => source,
        Err(e) => return error_response(e),
    };

    let result = tokio::task::spawn_blocking(move || render_geojson(&source)).await;
    match result {
        Ok(Ok(value)) => Json(value).into_response(),
        Ok(Err(e)) => error_response(e),
        Err(e) => join_error_response(e),
    }
}

/// Render a PNG for a service request. `size` defaults to the source's
/// default width and height.
async fn render_png(
    state: Arc<AppState>,
    key: &str,
    service: ServiceType,
    request: ExtentRequest,
    size: Option<(u32, u32)>,
) -> Response {
    state.metrics.record_request(service);
    let source = match state.service_source(key, service) {
        Ok(source) => source,
        Err(e) => return error_response(e),
    };
    let (width, height) =
        size.unwrap_or((source.descriptor.default_width, source.descriptor.default_height));

    let timer = Timer::start();
    let worker_state = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || -> MapResult<Vec<u8>> {
        let image = render_map(&source, &request, width, height, &worker_state.registry)?;
        image.to_png()
    })
    .await;

    match result {
        Ok(Ok(png)) => {
            state
                .metrics
                .record_render(service, timer.elapsed_us(), true)
                .await;
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "image/png")],
                png,
            )
                .into_response()
        }
        Ok(Err(e)) => {
            state
                .metrics
                .record_render(service, timer.elapsed_us(), false)
                .await;
            error_response(e)
        }
        Err(e) => {
            state
                .metrics
                .record_render(service, timer.elapsed_us(), false)
                .await;
            join_error_response(e)
        }
    }
}

/// JSON error body with the error's status code.
fn error_response(err: MapError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(error = %err, "Request failed");
    } else {
        warn!(error = %err, "Request rejected");
    }
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}

fn join_error_response(err: tokio::task::JoinError) -> Response {
    error!(error = %err, "Render task failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "InternalError",
            "message": format!("render task failed: {}", err),
        })),
    )
        .into_response()
}
