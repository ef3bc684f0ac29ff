/// Errors raised by the component CMS
///
/// The variants follow how a failure is surfaced to the user: configuration
/// problems get a fixed instructional message, everything that touches the
/// remote store gets a generic retry message.
#[derive(Debug, thiserror::Error)]
pub enum CmsError {
    /// Credential, store id, sheet name or range missing or invalid
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The remote store answered with a non-success status
    #[error("{operation} failed with HTTP status {status}")]
    Transport {
        operation: &'static str,
        status: u16,
    },

    /// Connection, timeout or body decoding failure in the HTTP client
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    /// A position outside the cached record list
    #[error("position {position} out of range for {len} records")]
    InvalidPosition { position: usize, len: usize },

    /// A save, delete or refresh is already running
    #[error("another operation is still in flight")]
    Busy,

    /// The action does not apply to the current modal state
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CmsError>;

pub const CONFIGURATION_MESSAGE: &str =
    "Error loading components. Please check your API configuration.";

impl CmsError {
    /// Text shown to the user for this failure
    pub fn user_message(&self, fallback: &'static str) -> &'static str {
        match self {
            CmsError::Configuration(_) => CONFIGURATION_MESSAGE,
            CmsError::Busy => "Another change is still being saved. Please wait.",
            _ => fallback,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, CmsError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_get_the_instructional_message() {
        let err = CmsError::Configuration("api key not set".to_string());
        assert_eq!(err.user_message("fallback"), CONFIGURATION_MESSAGE);
        assert!(err.is_configuration());
    }

    #[test]
    fn transport_errors_use_the_caller_fallback() {
        let err = CmsError::Transport {
            operation: "update",
            status: 503,
        };
        assert_eq!(err.user_message("try again"), "try again");
        assert_eq!(err.to_string(), "update failed with HTTP status 503");
    }
}
