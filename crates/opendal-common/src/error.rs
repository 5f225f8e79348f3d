//! Errors returned by OpenDAL
//!
//! Every storage operation returns [`Error`]. Callers branch on
//! [`Error::kind`] and may retry when [`Error::is_temporary`] is true:
//!
//! ```
//! use opendal_common::{Error, ErrorKind};
//!
//! let err = Error::new(ErrorKind::ObjectNotFound, "no such key").with_operation("stat");
//! assert_eq!(err.kind(), ErrorKind::ObjectNotFound);
//! assert!(!err.is_temporary());
//! ```

use std::fmt::{self, Debug, Display, Formatter};
use std::io;

/// Result that is a wrapper of `std::result::Result<T, opendal_common::Error>`
pub type Result<T> = std::result::Result<T, Error>;

/// All kinds of errors a storage operation can end with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Nothing more specific is known, e.g. the service returned an internal error.
    Unexpected,
    /// Underlying service doesn't support this operation.
    Unsupported,

    /// The config for backend is invalid.
    BackendConfigInvalid,

    /// Object is not found.
    ObjectNotFound,
    /// Object doesn't have enough permission for this operation
    ObjectPermissionDenied,
    /// Object is a directory.
    ObjectIsADirectory,
    /// Object is not a directory.
    ObjectNotADirectory,
    /// Object already exists.
    ObjectAlreadyExists,
    /// Requests that sent to this object is over the limit, please slow down.
    ObjectRateLimited,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::Unsupported => "Unsupported",
            ErrorKind::BackendConfigInvalid => "BackendConfigInvalid",
            ErrorKind::ObjectNotFound => "ObjectNotFound",
            ErrorKind::ObjectPermissionDenied => "ObjectPermissionDenied",
            ErrorKind::ObjectIsADirectory => "ObjectIsADirectory",
            ErrorKind::ObjectNotADirectory => "ObjectNotADirectory",
            ErrorKind::ObjectAlreadyExists => "ObjectAlreadyExists",
            ErrorKind::ObjectRateLimited => "ObjectRateLimited",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ErrorStatus {
    /// Without external changes the error never changes; never retry.
    Permanent,
    /// The service is rate limited or unavailable for now; retry is allowed.
    Temporary,
    /// Used to be temporary but retries were exhausted.
    Persistent,
}

impl Display for ErrorStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorStatus::Permanent => write!(f, "permanent"),
            ErrorStatus::Temporary => write!(f, "temporary"),
            ErrorStatus::Persistent => write!(f, "persistent"),
        }
    }
}

/// Error returned by all OpenDAL operations
pub struct Error {
    kind: ErrorKind,
    message: String,

    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.context.is_empty() {
            let context = self
                .context
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, ", context: {{ {context} }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        if let Some(source) = &self.source {
            write!(f, ", source: {source}")?;
        }

        Ok(())
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("message", &self.message);
            de.field("status", &self.status);
            de.field("operation", &self.operation);
            de.field("context", &self.context);
            de.field("source", &self.source);
            return de.finish();
        }

        write!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        writeln!(f)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "    {k}: {v}")?;
            }
        }
        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "Source: {source:?}")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|v| v.as_ref())
    }
}

impl Error {
    /// Create a new permanent error with kind and message.
    pub fn new(kind: ErrorKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),

            status: ErrorStatus::Permanent,
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    /// Update the operation of this error.
    ///
    /// An operation that was already set is kept as context `called`.
    pub fn with_operation(mut self, operation: impl Into<&'static str>) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }

        self.operation = operation.into();
        self
    }

    /// Add more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl Display) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Set source for error.
    ///
    /// Setting the source twice is a bug and panics in debug builds.
    pub fn set_source(mut self, src: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "the source error has been set");

        self.source = Some(src.into());
        self
    }

    pub fn map<F>(self, f: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        f(self)
    }

    pub fn set_permanent(mut self) -> Self {
        self.status = ErrorStatus::Permanent;
        self
    }

    /// Mark this error as retryable.
    pub fn set_temporary(mut self) -> Self {
        self.status = ErrorStatus::Temporary;
        self
    }

    /// Mark this error as still failing after retries.
    pub fn set_persistent(mut self) -> Self {
        self.status = ErrorStatus::Persistent;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Look up a context value by key.
    pub fn context(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_temporary(&self) -> bool {
        self.status == ErrorStatus::Temporary
    }

    pub fn is_persistent(&self) -> bool {
        self.status == ErrorStatus::Persistent
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match err.kind() {
            ErrorKind::ObjectNotFound => io::ErrorKind::NotFound,
            ErrorKind::ObjectPermissionDenied => io::ErrorKind::PermissionDenied,
            _ => io::ErrorKind::Other,
        };

        io::Error::new(kind, err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        let (kind, retryable) = match err.kind() {
            io::ErrorKind::NotFound => (ErrorKind::ObjectNotFound, false),
            io::ErrorKind::PermissionDenied => (ErrorKind::ObjectPermissionDenied, false),
            io::ErrorKind::AlreadyExists => (ErrorKind::ObjectAlreadyExists, false),
            io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => (ErrorKind::Unexpected, true),
            _ => (ErrorKind::Unexpected, false),
        };

        let mut e = Error::new(kind, "io error").set_source(err);
        if retryable {
            e = e.set_temporary();
        }
        e
    }
}
