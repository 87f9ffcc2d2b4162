use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::{Extension, Router};
use hyper::Server;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::producer::{parse_csv_rows, publish_rows};
use crate::storage::OrderStore;
use crate::transport::Transport;

#[derive(Debug, Deserialize)]
struct ListParams {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct OrdersResponse<T> {
    items: Vec<T>,
    count: usize,
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "orders-etl",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn validate_source(source: &str) -> Option<String> {
    let normalized = source.to_lowercase();
    if normalized == "online" || normalized == "offline" {
        Some(normalized)
    } else {
        None
    }
}

/// Accept a CSV upload and publish one message per data row.
async fn upload_csv(
    Path(source): Path<String>,
    Extension(transport): Extension<Arc<dyn Transport>>,
    body: String,
) -> impl IntoResponse {
    let source = match validate_source(&source) {
        Some(source) => source,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                "source must be 'online' or 'offline'".to_string(),
            )
                .into_response()
        }
    };

    let rows = match parse_csv_rows(&body) {
        Ok(rows) => rows,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, format!("invalid CSV upload: {e}")).into_response()
        }
    };
    if rows.is_empty() {
        return (StatusCode::BAD_REQUEST, "CSV file is empty".to_string()).into_response();
    }

    match publish_rows(transport.as_ref(), &source, rows).await {
        Ok(published) => {
            info!(source = %source, published, "upload published to queue");
            Json(serde_json::json!({ "published": published })).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn orders_clean(
    Query(params): Query<ListParams>,
    Extension(store): Extension<Arc<dyn OrderStore>>,
) -> impl IntoResponse {
    match store.list_clean(params.limit.unwrap_or(100)).await {
        Ok(items) => Json(OrdersResponse {
            count: items.len(),
            items,
        })
        .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn orders_error(
    Query(params): Query<ListParams>,
    Extension(store): Extension<Arc<dyn OrderStore>>,
) -> impl IntoResponse {
    match store.list_error(params.limit.unwrap_or(100)).await {
        Ok(items) => Json(OrdersResponse {
            count: items.len(),
            items,
        })
        .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Create the HTTP API with upload and listing routes.
pub fn create_router(store: Arc<dyn OrderStore>, transport: Arc<dyn Transport>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/upload/:source", post(upload_csv))
        .route("/orders/clean", get(orders_clean))
        .route("/orders/error", get(orders_error))
        .layer(Extension(store))
        .layer(Extension(transport))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port
pub async fn start_server(
    store: Arc<dyn OrderStore>,
    transport: Arc<dyn Transport>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(store, transport);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("HTTP server listening on http://{}", addr);

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}
