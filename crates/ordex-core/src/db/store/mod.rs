//! Storage substrate boundary.
//!
//! The engine never owns pages, durability, or isolation. It consumes an
//! ordered, byte-keyed, nestable namespace store through the traits below and
//! runs every operation inside one transaction handed to it by [`KvStore`].

mod memory;

use crate::error::InternalError;

// re-exports
pub use memory::{MemoryCursor, MemoryRead, MemoryStore, MemoryWrite};

///
/// Slot
///
/// What a cursor position holds: a plain value or a nested namespace.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Slot {
    Value(Vec<u8>),
    Namespace,
}

impl Slot {
    #[must_use]
    pub const fn is_namespace(&self) -> bool {
        matches!(self, Self::Namespace)
    }
}

/// One cursor position.
pub type CursorItem = (Vec<u8>, Slot);

///
/// Cursor
///
/// Forward cursor over one namespace in byte-lexicographic key order.
/// `next` before any positioning call yields `None`.
///

pub trait Cursor {
    fn first(&mut self) -> Result<Option<CursorItem>, InternalError>;

    fn last(&mut self) -> Result<Option<CursorItem>, InternalError>;

    /// Position at the first key greater than or equal to `key`.
    fn seek(&mut self, key: &[u8]) -> Result<Option<CursorItem>, InternalError>;

    fn next(&mut self) -> Result<Option<CursorItem>, InternalError>;
}

///
/// ReadTx
///
/// Read capability of a transaction. Namespaces are addressed by path: the
/// first segment names a top-level namespace, later segments nested ones.
///

pub trait ReadTx {
    type Cursor<'a>: Cursor
    where
        Self: 'a;

    fn namespace_exists(&self, ns: &[&[u8]]) -> Result<bool, InternalError>;

    /// Value stored at `key`, or `None` when absent or when `key` names a
    /// nested namespace.
    fn get(&self, ns: &[&[u8]], key: &[u8]) -> Result<Option<Vec<u8>>, InternalError>;

    /// Cursor over `ns`, or `None` when the namespace does not exist.
    fn cursor(&self, ns: &[&[u8]]) -> Result<Option<Self::Cursor<'_>>, InternalError>;
}

///
/// WriteTx
///
/// Mutation capability of a write transaction. Point writes require the
/// target namespace to exist already.
///

pub trait WriteTx: ReadTx {
    fn put(&mut self, ns: &[&[u8]], key: &[u8], value: &[u8]) -> Result<(), InternalError>;

    /// Remove a value; returns whether one existed.
    fn delete(&mut self, ns: &[&[u8]], key: &[u8]) -> Result<bool, InternalError>;

    /// Create every missing segment along `ns`.
    fn create_namespace_if_missing(&mut self, ns: &[&[u8]]) -> Result<(), InternalError>;

    /// Remove a namespace and everything under it; returns whether it existed.
    fn delete_namespace(&mut self, ns: &[&[u8]]) -> Result<bool, InternalError>;
}

///
/// KvStore
///
/// Transaction boundary. `update` commits iff the closure returns `Ok`;
/// `view` runs against a consistent read-only snapshot.
///

pub trait KvStore {
    type Read: ReadTx;
    type Write: WriteTx;

    fn view<T>(
        &self,
        f: impl FnOnce(&Self::Read) -> Result<T, InternalError>,
    ) -> Result<T, InternalError>;

    fn update<T>(
        &self,
        f: impl FnOnce(&mut Self::Write) -> Result<T, InternalError>,
    ) -> Result<T, InternalError>;
}

/// Render a namespace path for error messages.
#[must_use]
pub fn display_path(ns: &[&[u8]]) -> String {
    ns.iter()
        .map(|segment| String::from_utf8_lossy(segment))
        .collect::<Vec<_>>()
        .join("/")
}
