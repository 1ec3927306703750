//! Error types for the library.
//!
//! Internally, functions return `Res<T>`, an `anyhow::Result`, and attach context as errors bubble
//! up. Public functions return `Result<T>`, where the `Error` carries an `ErrorType` that tells the
//! caller (CLI or MCP client) what kind of failure occurred. Conversion happens at the boundary
//! with `IntoResult::pub_result`.

use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = anyhow::Result<T>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Categorizes a public error.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ErrorType {
    /// The configuration directory or file is missing or invalid.
    Config,
    /// OAuth credentials are missing, invalid or could not be refreshed.
    Auth,
    /// A read or write against the spreadsheet failed. Nothing is retried.
    SourceUnavailable,
    /// The requested reporting period is not one of the known periods.
    InvalidPeriod,
    /// A transaction filter (date, category or type) could not be understood.
    InvalidFilter,
    /// A write request is missing required fields or has bad values.
    InvalidInput,
    /// The MCP service could not be started or failed while running.
    Service,
    /// Anything else.
    Internal,
}

impl Display for ErrorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorType::Config => "configuration error",
            ErrorType::Auth => "authentication error",
            ErrorType::SourceUnavailable => "spreadsheet unavailable",
            ErrorType::InvalidPeriod => "invalid period",
            ErrorType::InvalidFilter => "invalid filter",
            ErrorType::InvalidInput => "invalid input",
            ErrorType::Service => "service error",
            ErrorType::Internal => "internal error",
        };
        f.write_str(s)
    }
}

/// The public error type.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    /// What kind of error this is.
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:#}", self.error_type, self.inner)
    }
}

impl std::error::Error for Error {}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::new(ErrorType::Internal, e)
    }
}

/// Converts an internal result into a public `Result` with the given `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}
