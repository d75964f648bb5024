//! Error types.
//!
//! - `FetchError`: what can go wrong while acquiring a series (configuration,
//!   transport, upstream API, payload shape)
//! - `RenderError`: failures reported by a chart surface
//! - `AppError`: process-level error carrying the exit code for `ht`

use thiserror::Error;

/// Failure while resolving or fetching a remote series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Missing/placeholder API key, or an entity the lookup tables cannot resolve.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Transport failure (connect, TLS, timeout, body read).
    #[error("network error: {0}")]
    Network(String),
    /// Non-success status, or an error embedded in an otherwise successful body.
    #[error("upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },
    /// Body that doesn't match any known upstream shape.
    #[error("unexpected upstream payload: {0}")]
    Payload(String),
}

impl FetchError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Transient failures are answered with synthetic data instead of an error.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }
}

impl From<reqwest::Error> for FetchError {
    /// The request URL is dropped: upstream keys travel in its query string.
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            Self::Network(format!("request timed out: {err}"))
        } else if let Some(status) = err.status() {
            Self::Upstream {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Failure reported by a chart surface while drawing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("render failed: {0}")]
pub struct RenderError(pub String);

impl RenderError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        let code = match err {
            FetchError::Configuration(_) => 2,
            _ => 4,
        };
        AppError::new(code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_configuration_errors_are_fatal() {
        assert!(!FetchError::config("no key").is_transient());
        assert!(FetchError::Network("refused".into()).is_transient());
        assert!(
            FetchError::Upstream {
                status: 503,
                message: "down".into()
            }
            .is_transient()
        );
        assert!(FetchError::Payload("garbage".into()).is_transient());
    }

    #[test]
    fn fetch_errors_map_to_exit_codes() {
        let cfg: AppError = FetchError::config("missing key").into();
        assert_eq!(cfg.exit_code(), 2);
        let net: AppError = FetchError::Network("reset".into()).into();
        assert_eq!(net.exit_code(), 4);
        assert!(net.to_string().contains("reset"));
    }
}
