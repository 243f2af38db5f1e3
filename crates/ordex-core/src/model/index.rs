use std::fmt;

///
/// IndexModel
///
/// Identity of one secondary index. The name doubles as the top-level
/// namespace holding the index's member sets, so it must be unique across
/// every namespace the store holds.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct IndexModel {
    name: &'static str,
}

impl IndexModel {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Namespace key for this index.
    #[must_use]
    pub const fn namespace(&self) -> &'static [u8] {
        self.name.as_bytes()
    }

    /// Pair this index with a derived value.
    #[must_use]
    pub fn value(&'static self, value: impl Into<Vec<u8>>) -> IndexValue {
        IndexValue::new(self, value)
    }
}

impl fmt::Display for IndexModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

///
/// IndexValue
///
/// One index descriptor: the index an entity participates in and the value it
/// holds there. Also used by query bounds to name a point in an index.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct IndexValue {
    index: &'static IndexModel,
    value: Vec<u8>,
}

impl IndexValue {
    #[must_use]
    pub fn new(index: &'static IndexModel, value: impl Into<Vec<u8>>) -> Self {
        Self {
            index,
            value: value.into(),
        }
    }

    #[must_use]
    pub const fn index(&self) -> &'static IndexModel {
        self.index
    }

    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// True when both descriptors address the same index namespace.
    #[must_use]
    pub fn same_index(&self, other: &Self) -> bool {
        self.index.name == other.index.name
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.index, String::from_utf8_lossy(&self.value))
    }
}
