//! Query bounds and their resolution into a single scan.

mod resolve;


use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::index::{IndexModel, IndexValue},
};
use std::fmt;
use thiserror::Error as ThisError;

// re-exports
pub use resolve::{ResolvedQuery, ResolvedScan, resolve};

///
/// QueryError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum QueryError {
    #[error("only one page bound is supported, got {0}")]
    MultiplePages(usize),

    #[error("at most two bounds are supported besides a page, got {0}")]
    TooManyBounds(usize),

    #[error("unsupported bound combination: {0} + {1}")]
    UnsupportedPair(&'static str, &'static str),

    #[error("cannot build range with two different indexes: {from} and {to}")]
    IndexMismatch {
        from: &'static str,
        to: &'static str,
    },

    #[error("{kind} bound on index {index} has an empty value")]
    EmptyValue {
        kind: &'static str,
        index: &'static str,
    },
}

impl From<QueryError> for InternalError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::UnsupportedPair(..) => {
                Self::new(ErrorClass::Unsupported, ErrorOrigin::Query, err.to_string())
            }
            _ => Self::query_validation(err.to_string()),
        }
    }
}

///
/// Page
/// Pagination window. Zero means unbounded in either dimension.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Page {
    pub skip: usize,
    pub limit: usize,
}

impl Page {
    #[must_use]
    pub const fn new(skip: usize, limit: usize) -> Self {
        Self { skip, limit }
    }

    /// True when applying this page changes nothing.
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        self.skip == 0 && self.limit == 0
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skip={} limit={}", self.skip, self.limit)
    }
}

///
/// Bound
///
/// One query condition. A query is a list of at most two scan bounds plus an
/// optional page; [`resolve`] rejects every other shape.
///
/// `From` and `To` are single-sided inclusive range bounds on the index their
/// value names. `Range` carries its index explicitly so either side may be
/// left open, and with neither side set it reads the whole index like `By`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Bound {
    Where(IndexValue),
    By(&'static IndexModel),
    From(IndexValue),
    To(IndexValue),
    Range {
        index: &'static IndexModel,
        from: Option<Vec<u8>>,
        to: Option<Vec<u8>>,
    },
    Page(Page),
}

impl Bound {
    #[must_use]
    pub const fn exact(value: IndexValue) -> Self {
        Self::Where(value)
    }

    #[must_use]
    pub const fn by(index: &'static IndexModel) -> Self {
        Self::By(index)
    }

    #[must_use]
    pub const fn gte(value: IndexValue) -> Self {
        Self::From(value)
    }

    #[must_use]
    pub const fn lte(value: IndexValue) -> Self {
        Self::To(value)
    }

    #[must_use]
    pub const fn range(
        index: &'static IndexModel,
        from: Option<Vec<u8>>,
        to: Option<Vec<u8>>,
    ) -> Self {
        Self::Range { index, from, to }
    }

    #[must_use]
    pub const fn page(skip: usize, limit: usize) -> Self {
        Self::Page(Page::new(skip, limit))
    }

    /// Short label used in error messages and debug logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Where(_) => "where",
            Self::By(_) => "by",
            Self::From(_) => "from",
            Self::To(_) => "to",
            Self::Range { .. } => "range",
            Self::Page(_) => "page",
        }
    }
}
