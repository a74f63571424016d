use bytes::Bytes;
use http::HeaderMap;
use http::StatusCode;
use std::fmt;
use thiserror::Error;

/// The error type for s3sign operations
#[derive(Error, Debug)]
#[error("{}", self.display())]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
    context: Vec<String>,
    detail: Option<Box<ErrorDetail>>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Endpoint string matches none of the recognized host shapes
    InvalidHostFormat,

    /// HTTP verb is not one the signer understands
    UnsupportedMethod,

    /// Connection level failure (DNS, refused, timeout)
    Transport,

    /// Response status outside of `[200, 299]`
    Http,

    /// 2xx response whose body is an XML `Error` envelope
    ServiceErrorInBody,

    /// Credentials are missing or malformed
    CredentialInvalid,

    /// Request cannot be signed (missing required fields, etc.)
    RequestInvalid,

    /// Configuration error (missing fields, invalid values)
    ConfigInvalid,

    /// Unexpected errors
    Unexpected,
}

/// Structured payload attached to response errors.
#[derive(Debug, Clone)]
pub enum ErrorDetail {
    /// The full response of a non-2xx reply.
    Http {
        /// Response status.
        status: StatusCode,
        /// Response headers.
        headers: HeaderMap,
        /// Response body, untouched.
        body: Bytes,
    },
    /// Code and message extracted from an XML error envelope.
    Service {
        /// Error code, e.g. `NoSuchKey`.
        code: String,
        /// Human readable message.
        message: String,
    },
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            context: Vec::new(),
            detail: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Add a context line, rendered after the message.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attach a structured detail.
    pub fn with_detail(mut self, detail: ErrorDetail) -> Self {
        self.detail = Some(Box::new(detail));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message without context.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the context lines.
    pub fn context(&self) -> &[String] {
        &self.context
    }

    /// Get the structured detail if any.
    pub fn detail(&self) -> Option<&ErrorDetail> {
        self.detail.as_deref()
    }

    /// Response status of an [`ErrorKind::Http`] error.
    pub fn status(&self) -> Option<StatusCode> {
        match self.detail() {
            Some(ErrorDetail::Http { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Response headers of an [`ErrorKind::Http`] error.
    pub fn response_headers(&self) -> Option<&HeaderMap> {
        match self.detail() {
            Some(ErrorDetail::Http { headers, .. }) => Some(headers),
            _ => None,
        }
    }

    /// Response body of an [`ErrorKind::Http`] error.
    pub fn response_body(&self) -> Option<&Bytes> {
        match self.detail() {
            Some(ErrorDetail::Http { body, .. }) => Some(body),
            _ => None,
        }
    }

    /// Error code of an [`ErrorKind::ServiceErrorInBody`] error.
    pub fn service_code(&self) -> Option<&str> {
        match self.detail() {
            Some(ErrorDetail::Service { code, .. }) => Some(code),
            _ => None,
        }
    }

    /// Error message of an [`ErrorKind::ServiceErrorInBody`] error.
    pub fn service_message(&self) -> Option<&str> {
        match self.detail() {
            Some(ErrorDetail::Service { message, .. }) => Some(message),
            _ => None,
        }
    }

    /// Check if this error came back from the remote side.
    pub fn is_response_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Http | ErrorKind::ServiceErrorInBody)
    }

    fn display(&self) -> String {
        let mut s = format!("{}: {}", self.kind, self.message);
        for ctx in &self.context {
            s.push_str(", ");
            s.push_str(ctx);
        }
        s
    }
}

// Convenience constructors
impl Error {
    /// Create an invalid host format error
    pub fn invalid_host_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidHostFormat, message)
    }

    /// Create an unsupported method error
    pub fn unsupported_method(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedMethod, message)
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create an http error carrying the whole response.
    pub fn http(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self::new(ErrorKind::Http, format!("unexpected response status {status}"))
            .with_detail(ErrorDetail::Http {
                status,
                headers,
                body,
            })
    }

    /// Create a service error found in a successful response body.
    pub fn service_error_in_body(code: impl Into<String>, message: impl Into<String>) -> Self {
        let (code, message) = (code.into(), message.into());
        Self::new(ErrorKind::ServiceErrorInBody, format!("{code}: {message}"))
            .with_detail(ErrorDetail::Service { code, message })
    }

    /// Create a credential invalid error
    pub fn credential_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialInvalid, message)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidHostFormat => write!(f, "invalid host format"),
            ErrorKind::UnsupportedMethod => write!(f, "unsupported method"),
            ErrorKind::Transport => write!(f, "transport error"),
            ErrorKind::Http => write!(f, "http error"),
            ErrorKind::ServiceErrorInBody => write!(f, "service error"),
            ErrorKind::CredentialInvalid => write!(f, "invalid credentials"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(err: http::header::ToStrError) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUriParts> for Error {
    fn from(err: http::uri::InvalidUriParts) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}
