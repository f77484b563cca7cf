//! Data Transfer Objects for the HTTP API.
//!
//! Responses reuse [`StackReport`](crate::output::StackReport) directly; only
//! request shapes and the health response live here.

use serde::{Deserialize, Serialize};

use crate::config::{StackConfig, WindowScope, WindowingPolicy};
use crate::models::Measurement;
use crate::parsing::{IndexRange, InputFormat};

/// Request body for `POST /v1/stack`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackRequest {
    /// Label echoed back in the report
    #[serde(default)]
    pub source: Option<String>,
    pub measurements: Vec<Measurement>,
    /// Settings for this request. Fields left out take their defaults; when
    /// the whole object is absent the server's configuration is used.
    #[serde(default)]
    pub config: Option<StackConfig>,
    #[serde(default)]
    pub start_index: Option<usize>,
    #[serde(default)]
    pub end_index: Option<usize>,
}

impl StackRequest {
    pub fn index_range(&self) -> IndexRange {
        IndexRange::new(self.start_index, self.end_index)
    }
}

/// Query parameters for `POST /v1/stack/text`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TextStackQuery {
    /// Input layout; detected from the content when absent
    #[serde(default)]
    pub format: Option<InputFormat>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub window_width_days: Option<f64>,
    #[serde(default)]
    pub windowing_policy: Option<WindowingPolicy>,
    #[serde(default)]
    pub window_scope: Option<WindowScope>,
    #[serde(default)]
    pub start_index: Option<usize>,
    #[serde(default)]
    pub end_index: Option<usize>,
}

impl TextStackQuery {
    /// Apply the query's overrides on top of `base`.
    pub fn apply_to(&self, base: &StackConfig) -> StackConfig {
        let mut config = base.clone();
        if let Some(width) = self.window_width_days {
            config.window_width_days = qtty::Days::new(width);
        }
        if let Some(policy) = self.windowing_policy {
            config.windowing_policy = policy;
        }
        if let Some(scope) = self.window_scope {
            config.window_scope = scope;
        }
        config
    }

    pub fn index_range(&self) -> IndexRange {
        IndexRange::new(self.start_index, self.end_index)
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
}
