use derive_more::Display;
use ordex_core::error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Store(StoreErrorKind::NotFound) | ErrorKind::Query(QueryErrorKind::NotFound)
        )
    }

    #[must_use]
    pub const fn is_index_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::Store(StoreErrorKind::IndexNotFound))
    }

    /// The store was never provisioned for the entity; retrying cannot help.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::Store(StoreErrorKind::Unprovisioned))
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = match (err.class, err.origin) {
            (ErrorClass::NotFound, CoreErrorOrigin::Executor) => {
                ErrorKind::Query(QueryErrorKind::NotFound)
            }
            (ErrorClass::NotFound, _) => ErrorKind::Store(StoreErrorKind::NotFound),
            (ErrorClass::IndexNotFound, _) => ErrorKind::Store(StoreErrorKind::IndexNotFound),
            (ErrorClass::Provisioning, _) => ErrorKind::Store(StoreErrorKind::Unprovisioned),
            (ErrorClass::Validation, CoreErrorOrigin::Query) => {
                ErrorKind::Query(QueryErrorKind::Invalid)
            }
            (ErrorClass::Unsupported, _) => ErrorKind::Query(QueryErrorKind::Unsupported),
            (ErrorClass::Validation, _) => ErrorKind::Invalid,
            (ErrorClass::Corruption, _) => ErrorKind::Corruption,
            (ErrorClass::Internal, _) => ErrorKind::Internal,
        };

        Self::new(kind, err.origin.into(), err.message)
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    Query(QueryErrorKind),
    Store(StoreErrorKind),

    /// Entity key, index value, or payload was rejected before any write.
    Invalid,

    /// Stored state contradicts itself (dangling member, malformed master record).
    Corruption,

    /// The caller cannot remediate this.
    Internal,
}

///
/// QueryErrorKind
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum QueryErrorKind {
    /// Bound list has an invalid shape (too many bounds, empty values, mixed indexes).
    Invalid,

    /// The bounds are well formed but the combination is not supported.
    Unsupported,

    /// Valid query, but no rows matched.
    NotFound,
}

///
/// StoreErrorKind
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum StoreErrorKind {
    NotFound,
    IndexNotFound,
    Unprovisioned,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Config,
    Executor,
    Index,
    Query,
    Serialize,
    Store,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Executor => Self::Executor,
            CoreErrorOrigin::Index => Self::Index,
            CoreErrorOrigin::Query => Self::Query,
            CoreErrorOrigin::Serialize => Self::Serialize,
            CoreErrorOrigin::Store => Self::Store,
        }
    }
}
