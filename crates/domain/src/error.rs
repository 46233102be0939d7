/// Shared error type used across all tutor crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    /// The backend answered 2xx but reported an application error in the body.
    #[error("backend {endpoint}: {message}")]
    Backend { endpoint: String, message: String },

    /// The event stream failed at the transport level.
    #[error("stream: {0}")]
    Stream(String),

    /// Input rejected before any request was sent.
    #[error("validation: {0}")]
    Validation(String),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a [`Error::Backend`] for the given endpoint.
    pub fn backend(endpoint: &str, message: impl Into<String>) -> Self {
        Error::Backend {
            endpoint: endpoint.to_owned(),
            message: message.into(),
        }
    }

    /// Whether this error was raised before touching the network.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
