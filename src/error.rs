use rmcp::model::{CallToolResult, Content, ErrorData};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("response body exceeds {0} bytes")]
    BodyTooLarge(usize),
    #[error("unexpected non-JSON response (HTTP {0})")]
    NotJson(u16),
    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{message}")]
    Upstream { status: u16, message: String },
}

impl ApiError {
    /// Upstream failures are reported to the caller as tool errors; the rest
    /// surface as protocol errors.
    pub fn into_tool_result(self, context: &str) -> Result<CallToolResult, ErrorData> {
        match self {
            Self::Upstream { status, message } => {
                tracing::warn!(status, "{context}: {message}");
                Ok(domain_error(format!("[502] {context}: {message}")))
            }
            other => {
                tracing::warn!("{context}: {other}");
                Err(protocol_error(format!("{context}: {other}")))
            }
        }
    }
}

pub fn format_api_error(status_code: u16, body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(comment) = v.get("comment").and_then(|c| c.as_str()) {
            return comment.to_owned();
        }
        if let Some(msg) = v
            .get("errors")
            .and_then(|e| e.get(0))
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return msg.to_owned();
        }
    }
    let truncated: String = body.chars().take(500).collect();
    if truncated.trim().is_empty() {
        return format!("HTTP {status_code}");
    }
    format!("HTTP {status_code}: {truncated}")
}

pub fn bad_request(msg: impl Into<String>) -> CallToolResult {
    domain_error(format!("[400] {}", msg.into()))
}

pub fn not_found(msg: impl Into<String>) -> CallToolResult {
    domain_error(format!("[404] {}", msg.into()))
}

pub fn domain_error(msg: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(msg.into())])
}

pub fn protocol_error(msg: impl Into<String>) -> ErrorData {
    ErrorData::internal_error(msg.into(), None)
}
