use thiserror::Error as ThisError;

/// Failure reported by an [`HttpTransport`](crate::bridge::HttpTransport).
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Failure of a single bridge round trip.
///
/// Every variant carries the target URL so the handler boundary can log
/// where the request went without inspecting the source error.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Connection to {url} failed: {detail}")]
    Connect { url: String, detail: String },

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Malformed response from {url}: {detail}")]
    Decode { url: String, detail: String },
}

impl BridgeError {
    /// Target URL of the failed request.
    pub fn url(&self) -> &str {
        match self {
            BridgeError::Connect { url, .. }
            | BridgeError::Http { url, .. }
            | BridgeError::Decode { url, .. } => url,
        }
    }

    /// HTTP status observed, if the bridge answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BridgeError::Http { status, .. } => Some(*status),
            // A decode failure only happens after a 200.
            BridgeError::Decode { .. } => Some(200),
            BridgeError::Connect { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
