//! Receives alertmanager webhook calls and relays them to zoom.
//!
//! `POST /webhook?channel-id={id}&token={token}` answers once every batch of the
//! alert group has been handed to the [Deliver] client. The answer doesn't
//! reflect the delivery outcome.
use std::{net::TcpListener, num::NonZeroUsize, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Extension, Json, Query},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use prometheus::Registry;
use serde::Serialize;

use crate::{
    alert, batcher,
    metrics::Metrics,
    telemetry_endpoint,
    zoom_client::{Deliver, RoutingParams},
};

/// shared by every request
pub struct State {
    client: Arc<dyn Deliver>,
    batch_limit: NonZeroUsize,
    metrics: Arc<Metrics>,
}

impl State {
    pub fn new(client: Arc<dyn Deliver>, batch_limit: NonZeroUsize, metrics: Arc<Metrics>) -> Self {
        Self {
            client,
            batch_limit,
            metrics,
        }
    }
}

/// body of every webhook answer
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reply {
    status: u16,
    message: String,
}

fn reply(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Reply>) {
    (
        status,
        Json(Reply {
            status: status.as_u16(),
            message: message.into(),
        }),
    )
}

async fn webhook(
    Extension(state): Extension<Arc<State>>,
    route: Result<Query<RoutingParams>, QueryRejection>,
    body: Bytes,
) -> (StatusCode, Json<Reply>) {
    let alert: alert::Data = match serde_json::from_slice(&body) {
        Ok(alert) => alert,
        Err(err) => {
            tracing::debug!("failed to deserialize alert: {}", err);
            return reply(StatusCode::BAD_REQUEST, err.to_string());
        }
    };

    let route = match route {
        Ok(Query(route)) => route,
        Err(err) => {
            tracing::debug!("invalid routing parameters: {}", err);
            return reply(StatusCode::BAD_REQUEST, err.to_string());
        }
    };

    if let Err(err) = route.validate() {
        tracing::debug!("invalid routing parameters: {}", err);
        return reply(StatusCode::BAD_REQUEST, err.to_string());
    }

    tracing::info!(
        receiver = %alert.receiver,
        status = %alert.status,
        group_key = %alert.group_key,
        alerts = alert.alerts.len(),
        "received alert group"
    );

    batcher::dispatch(
        &alert,
        &route,
        state.batch_limit,
        state.client.as_ref(),
        &state.metrics,
    )
    .await;

    reply(StatusCode::OK, "success")
}

async fn health() -> &'static str {
    "Ok!"
}

/// routes `/webhook`, `/health` and `/metrics`
pub fn router(state: Arc<State>, registry: Registry) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .route("/metrics", get(telemetry_endpoint::metrics_handler))
        .layer(Extension(state))
        .layer(Extension(registry))
}

/// serves [router] on `listener` until the server fails
pub async fn run_webhook_receiver(
    listener: TcpListener,
    state: Arc<State>,
    registry: Registry,
) -> Result<()> {
    let app = router(state, registry);

    axum::Server::from_tcp(listener)
        .context("failed to use listener")?
        .serve(app.into_make_service())
        .await
        .context("webhook endpoint crashed")?;

    Ok(())
}
