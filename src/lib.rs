//! prometheus alertmanager receiver that relays alert groups into zoom chat channels
//!
//! Features:
//! - destination channel and token are chosen per request through the query string
//! - head color follows the group status and severity
//! - large alert groups are split into several messages
//! - prometheus counters for processed alerts and webhook responses

pub mod alert;
pub mod alertmanager_webhook_receiver;
pub mod batcher;
pub mod composer;
pub mod log;
pub mod metrics;
pub mod settings;
pub mod telemetry_endpoint;
pub mod zoom_client;
pub mod zoom_message;
