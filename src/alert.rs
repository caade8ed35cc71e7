//! data structures for deserializing incoming alerts
use std::{collections::HashMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// alert group received by the alertmanager webhook receiver
///
/// Fields alertmanager leaves out decode to their empty value.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::missing_docs_in_private_items)]
pub struct Data {
    pub version: String,
    pub group_key: String,
    pub truncated_alerts: u64,

    pub receiver: String,
    pub status: Status,
    pub alerts: Vec<Alert>,
    pub group_labels: HashMap<String, String>,
    pub common_labels: HashMap<String, String>,
    pub common_annotations: HashMap<String, String>,
    #[serde(rename = "externalURL")]
    pub external_url: String,
}

impl Data {
    /// value of a common label, empty if absent
    pub fn common_label(&self, key: &str) -> &str {
        self.common_labels.get(key).map_or("", String::as_str)
    }

    /// value of a common annotation, empty if absent
    pub fn common_annotation(&self, key: &str) -> &str {
        self.common_annotations.get(key).map_or("", String::as_str)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::missing_docs_in_private_items)]
pub struct Alert {
    pub status: Option<Status>,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(rename = "generatorURL")]
    pub generator_url: String,
    pub fingerprint: String,
}

impl Alert {
    pub fn label(&self, key: &str) -> &str {
        self.labels.get(key).map_or("", String::as_str)
    }

    pub fn annotation(&self, key: &str) -> &str {
        self.annotations.get(key).map_or("", String::as_str)
    }
}

/// state of an alert group as reported by alertmanager
///
/// Anything besides `firing` and `resolved` is kept verbatim in
/// [Status::Unknown] so it can still be rendered.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Firing,
    Resolved,
    Unknown(String),
}

impl Default for Status {
    fn default() -> Self {
        Status::Unknown(String::new())
    }
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Firing => "firing",
            Status::Resolved => "resolved",
            Status::Unknown(raw) => raw.as_str(),
        }
    }
}

impl From<String> for Status {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "firing" => Status::Firing,
            "resolved" => Status::Resolved,
            _ => Status::Unknown(raw),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Unknown(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
