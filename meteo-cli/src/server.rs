use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use meteo_core::{Error, ErrorKind, MeteoReport, MeteoRequest, MeteoService};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

type AppState = Arc<MeteoService>;

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    detail: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn router(service: MeteoService) -> Router {
    // The dashboard is served from other origins, including `file://` pages.
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/meteo", post(check))
        .route("/health", get(health))
        .with_state(Arc::new(service))
        .layer(cors)
}

pub async fn serve(addr: SocketAddr, service: MeteoService) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(%addr, provider = %service.provider().id(), "serving POST /meteo");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("HTTP server failed")
}

async fn health() -> &'static str {
    "ok"
}

async fn check(
    State(service): State<AppState>,
    payload: Result<Json<MeteoRequest>, JsonRejection>,
) -> Result<Json<MeteoReport>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorBody { detail: rejection.body_text() }),
        )
    })?;

    service
        .check(&request, chrono::Utc::now())
        .await
        .map(Json)
        .map_err(|err| map_error(&request, err))
}

fn map_error(request: &MeteoRequest, err: Error) -> ApiError {
    match err.kind() {
        ErrorKind::Internal | ErrorKind::UpstreamDataInvalid => {
            tracing::error!(city = %request.city, weekday = %request.weekday, error = %err, "request failed");
        }
        _ => {
            tracing::warn!(city = %request.city, weekday = %request.weekday, error = %err, "request rejected");
        }
    }

    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorBody { detail: err.public_detail() }))
}
