pub mod client;

pub use client::PromClient;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Status value reported for a usable query result.
pub const STATUS_SUCCESS: &str = "success";

/// Response envelope of an instantaneous query.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub status: String,

    #[serde(default)]
    pub data: Option<QueryData>,

    /// Error detail accompanying a non-success status, when the server
    /// provides one.
    #[serde(default)]
    pub error: Option<String>,
}

impl QueryResponse {
    /// Builds a non-success response carrying only a status string.
    pub fn failure(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            data: None,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// The result rows, empty when the payload carries none.
    pub fn rows(&self) -> &[Sample] {
        self.data.as_ref().map(|d| d.result.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryData {
    #[serde(default)]
    pub result: Vec<Sample>,
}

/// One label-set with its sampled value.
#[derive(Debug, Clone, Deserialize)]
pub struct Sample {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,

    /// `[timestamp, value]` pair of the instantaneous sample.
    #[serde(default)]
    pub value: Option<(f64, String)>,
}

/// Executes instantaneous queries against a metric source.
///
/// Transport failures surface as errors; a completed exchange the server
/// rejected surfaces as a response with a non-success status.
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn query(&self, expr: &str) -> Result<QueryResponse>;
}
