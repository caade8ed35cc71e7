//! Turns alert groups into zoom messages.
//!
//! Alert groups come from [alertmanager_webhook_receiver](crate::alertmanager_webhook_receiver)
//! through the [batcher](crate::batcher), which hands over one slice of alerts per message.

use crate::{
    alert::{self, Alert, Status},
    metrics::Metrics,
    zoom_message::{BodyItem, HeadColor, ZoomMessage},
};

/// head color for a group in `status` with common label `severity`
///
/// Unrecognized statuses are colored like critical alerts.
pub fn head_color(status: &Status, severity: &str) -> HeadColor {
    match status {
        Status::Resolved => HeadColor::Green,
        Status::Firing if severity == "warning" => HeadColor::Orange,
        Status::Firing | Status::Unknown(_) => HeadColor::Red,
    }
}

/// Renders `alerts` into a message carrying the head of `group`.
///
/// # Arguments
///
/// * `group` - alert group the head and sub head are taken from
///
/// * `alerts` - alerts rendered into body items, usually a slice of `group.alerts`
///
/// * `metrics` - counts every rendered alert
pub fn compose(group: &alert::Data, alerts: &[Alert], metrics: &Metrics) -> ZoomMessage {
    let severity = group.common_label("severity");

    let head = format!(
        "{} ({}) {}",
        group.common_annotation("summary"),
        group.status,
        severity
    );
    let sub_head = format!(
        "{}/#/alerts?receiver={}",
        group.external_url, group.receiver
    );

    let body = alerts
        .iter()
        .map(|alert| {
            metrics.record_alert_processed();

            let description = alert.annotation("description");
            if description.is_empty() {
                tracing::warn!(
                    alertname = alert.label("alertname"),
                    "alert description is empty"
                );
            }

            BodyItem::message(format!("{} {}", description, alert.annotation("runbook")))
        })
        .collect();

    ZoomMessage::new(head_color(&group.status, severity), head, sub_head, body)
}
