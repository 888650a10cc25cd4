use http::{Method, StatusCode};
use std::{error::Error as StdError, fmt};
use thiserror::Error;
use url::Url;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    Auth,
    NotFound,
    Api,
    Transport,
    Parse,
    Mapping,
    InvalidConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Other,
}

#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub method: Method,
    /// Sanitized URL: no query/fragment/userinfo.
    pub url: Box<Url>,
    pub body_snippet: Option<Box<str>>,
}

impl HttpError {
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// All errors returned by the client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("{0}")]
    Auth(HttpError),

    #[error("{0}")]
    NotFound(HttpError),

    #[error("{0}")]
    Api(HttpError),

    #[error("Transport error during {method} {path}: {source}")]
    Transport {
        method: Method,
        path: Box<str>,
        kind: TransportErrorKind,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The response body was not well-formed XML.
    #[error("Parse error (HTTP {status}) during {method} {path}: {source}")]
    Parse {
        status: StatusCode,
        method: Method,
        path: Box<str>,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Well-formed XML missing expected structure or holding
    /// values that do not convert to their declared type.
    #[error("Mapping error at {path}: element `{element}`: {message}")]
    Mapping {
        path: Box<str>,
        element: Box<str>,
        message: Box<str>,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: Box<str>,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Api(_) => ErrorKind::Api,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Mapping { .. } => ErrorKind::Mapping,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Auth(e) | Self::NotFound(e) | Self::Api(e) => Some(e.status),
            Self::Parse { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Mapping { .. } | Self::InvalidConfig { .. } => None,
        }
    }

    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Hint for the host's own polling loop; nothing retries inside the client.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api(e) => matches!(
                e.status,
                StatusCode::BAD_GATEWAY
                    | StatusCode::SERVICE_UNAVAILABLE
                    | StatusCode::GATEWAY_TIMEOUT
            ),
            Self::Transport { kind, .. } => matches!(
                kind,
                TransportErrorKind::Timeout | TransportErrorKind::Connect
            ),
            _ => false,
        }
    }

    pub(crate) fn from_http(error: HttpError) -> Self {
        match error.status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth(error),
            StatusCode::NOT_FOUND => Self::NotFound(error),
            _ => Self::Api(error),
        }
    }

    pub(crate) fn mapping(url: &Url, element: &str, message: impl Into<Box<str>>) -> Self {
        Self::Mapping {
            path: url.path().to_string().into_boxed_str(),
            element: element.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} ({} {})", self.status, self.method, self.path())?;
        if let Some(snippet) = self.body_snippet.as_deref() {
            write!(f, ": {snippet}")?;
        }
        Ok(())
    }
}
