use serde::Deserialize;
use thiserror::Error;

/// Error code the API uses for every access token it refuses.
const TOKEN_NOT_VALID: &str = "token_not_valid";

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {}", unauthorized_message(.detail))]
    Unauthorized {
        body: String,
        detail: Option<AuthErrorBody>,
    },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error ({status}): {body}")]
    ServerError { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

fn unauthorized_message(detail: &Option<AuthErrorBody>) -> &str {
    detail
        .as_ref()
        .and_then(|d| d.detail.as_deref())
        .unwrap_or("credentials rejected")
}

/// Body of a 401 response as produced by the API's JWT layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub messages: Vec<TokenMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenMessage {
    #[serde(default)]
    pub token_class: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub message: String,
}

impl AuthErrorBody {
    /// An expired token is reported as `token_not_valid` with a message
    /// mentioning expiry. Other `token_not_valid` reasons (malformed,
    /// blacklisted) do not match.
    pub fn is_expired_token(&self) -> bool {
        self.code.as_deref() == Some(TOKEN_NOT_VALID)
            && self
                .messages
                .iter()
                .any(|m| m.message.to_lowercase().contains("expired"))
    }
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized {
                body: truncated,
                detail: serde_json::from_str(body).ok(),
            },
            400 | 422 => ApiError::Validation(truncated),
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError {
                status: status.as_u16(),
                body: truncated,
            },
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// True only for the expiry signature: a 401 whose body carries
    /// `token_not_valid` and an "expired" message.
    pub fn is_token_expired(&self) -> bool {
        match self {
            ApiError::Unauthorized {
                detail: Some(detail),
                ..
            } => detail.is_expired_token(),
            _ => false,
        }
    }

    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::AccessDenied(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::RateLimited => Some(429),
            ApiError::ServerError { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            ApiError::Validation(_) | ApiError::InvalidResponse(_) | ApiError::Encode(_) => None,
        }
    }

    /// Human readable message from the API's `detail` field, when present.
    pub fn detail(&self) -> Option<String> {
        let body = match self {
            ApiError::Unauthorized { detail, .. } => {
                return detail.as_ref().and_then(|d| d.detail.clone());
            }
            ApiError::AccessDenied(body)
            | ApiError::NotFound(body)
            | ApiError::Validation(body) => body,
            ApiError::ServerError { body, .. } => body,
            _ => return None,
        };
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        value.get("detail")?.as_str().map(str::to_string)
    }
}
