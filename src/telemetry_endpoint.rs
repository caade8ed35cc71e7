//! Here we expose prometheus metrics about zoom-proxy
use axum::{
    body::Body,
    extract::Extension,
    http::{header::CONTENT_TYPE, Response, StatusCode},
};
use prometheus::{Encoder, Registry, TextEncoder};

/// text exposition of every meter in the registry
pub async fn metrics_handler(Extension(registry): Extension<Registry>) -> Result<Response<Body>, StatusCode> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    encoder.encode(&metric_families, &mut buffer).map_err(|err| {
        tracing::error!("failed to encode metrics: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Response::builder()
        .status(200)
        .header(CONTENT_TYPE, encoder.format_type())
        .body(Body::from(buffer))
        .map_err(|err| {
            tracing::error!("failed to build metrics response: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
