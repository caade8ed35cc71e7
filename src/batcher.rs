//! Splits alert groups into messages of bounded size.
//!
//! Alerts are sent in their original order, in chunks of exactly `limit`
//! alerts; only the last chunk may be shorter. A group without alerts still
//! results in one message carrying only the head.
use std::num::NonZeroUsize;

use crate::{
    alert,
    composer,
    metrics::Metrics,
    zoom_client::{Deliver, RoutingParams},
};

/// default maximum number of alerts per zoom message
pub const MAX_ALERTS_PER_MESSAGE: usize = 100;

/// Composes and delivers `group` to `route`, one message per chunk.
///
/// Chunks are delivered one after another. A failed delivery doesn't keep the
/// following chunks from being sent.
///
/// Returns the number of messages handed to `client`.
pub async fn dispatch<D>(
    group: &alert::Data,
    route: &RoutingParams,
    limit: NonZeroUsize,
    client: &D,
    metrics: &Metrics,
) -> usize
where
    D: Deliver + ?Sized,
{
    let mut batches = 0;

    for alerts in chunks(&group.alerts, limit) {
        let message = composer::compose(group, alerts, metrics);
        client.send(&message, route).await;
        batches += 1;
    }

    tracing::debug!(
        receiver = %group.receiver,
        alerts = group.alerts.len(),
        batches,
        "alert group dispatched"
    );

    batches
}

/// `alerts` cut into chunks of `limit`, an empty input yields one empty chunk
fn chunks<T>(alerts: &[T], limit: NonZeroUsize) -> Vec<&[T]> {
    if alerts.is_empty() {
        return vec![alerts];
    }

    alerts.chunks(limit.get()).collect()
}
