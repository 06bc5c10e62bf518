use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct AlertsList {
    pub alerts: Vec<serde_json::Value>,
}

/// Standard error envelope returned by the alerts API.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
}
