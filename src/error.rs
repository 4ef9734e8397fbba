//! Error types for the Azure Resource Manager transport.

use serde::Deserialize;

pub type ArmResult<T> = Result<T, ArmError>;

#[derive(Debug, thiserror::Error)]
pub enum ArmError {
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// ARM answered with a non-success status.
    #[error("ARM request failed (status {status}, code {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// A long-running operation reached a terminal state other than `Succeeded`.
    #[error("operation {status} (code {code}): {message}")]
    OperationFailed {
        status: String,
        code: String,
        message: String,
    },

    #[error("error getting credentials: {0}")]
    Credential(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// `{"error": {"code": ..., "message": ...}}` as returned by ARM on failures and
/// inside failed async-operation status documents.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl ArmError {
    /// Build an [`ArmError::Api`] from a failed response body, falling back to
    /// the raw body when it is not an ARM error document.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(parsed) if !parsed.error.code.is_empty() || !parsed.error.message.is_empty() => {
                Self::Api {
                    status,
                    code: parsed.error.code,
                    message: parsed.error.message,
                }
            }
            _ => Self::Api {
                status,
                code: "Unknown".into(),
                message: body.trim().to_string(),
            },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
