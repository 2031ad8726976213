use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("resource not found")]
    NotFound,

    #[error("API error ({status}): {body}")]
    Status { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to parse response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Error payload returned by the server's JSON gateway
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiError {
    /// Render the error for an end user, without Rust error-chain noise
    pub fn humanize(&self) -> String {
        match self {
            ApiError::NotFound => "The requested resource was not found".to_string(),
            ApiError::Status { status, body } => humanize_status(*status, body),
            ApiError::Transport(err) if err.is_timeout() => {
                "Request to the server timed out".to_string()
            }
            ApiError::Transport(err) if err.is_connect() => match err.url() {
                Some(url) => format!(
                    "Unable to connect to the server at {}",
                    url.origin().ascii_serialization()
                ),
                None => "Unable to connect to the server".to_string(),
            },
            ApiError::Transport(err) => format!("Request failed: {}", err),
            ApiError::Decode(err) => format!("Unexpected response from the server: {}", err),
            ApiError::InvalidUrl(url) => format!("Invalid API URL: {}", url),
        }
    }
}

fn humanize_status(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error).filter(|m| !m.is_empty()) {
            return message;
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        body.to_string()
    }
}
