use crate::{
    db::store::{Cursor, ReadTx, Slot, WriteTx, display_path},
    error::InternalError,
};
use derive_more::Deref;
use std::collections::BTreeMap;

///
/// MasterRecord
///
/// Reverse record of one entity's current index memberships: index name to
/// the value the entity last declared there. Stored as a nested namespace
/// `[master_index, unique_key]` so stale memberships can always be located.
///
/// The map is read-only via `Deref`; records are assembled by the engine.
///

#[derive(Clone, Debug, Default, Deref, Eq, PartialEq)]
pub struct MasterRecord(BTreeMap<String, Vec<u8>>);

impl MasterRecord {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub(crate) fn insert(&mut self, index: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.0.insert(index.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<Vec<u8>>> FromIterator<(K, V)> for MasterRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Load the master record for `key`, or `None` when the entity has none.
pub(crate) fn load_master<T: ReadTx>(
    tx: &T,
    master: &str,
    key: &[u8],
) -> Result<Option<MasterRecord>, InternalError> {
    let ns: [&[u8]; 2] = [master.as_bytes(), key];
    let Some(mut cursor) = tx.cursor(&ns)? else {
        return Ok(None);
    };

    let mut record = MasterRecord::new();
    let mut item = cursor.first()?;
    while let Some((name, slot)) = item {
        let Slot::Value(value) = slot else {
            return Err(InternalError::store_corruption(format!(
                "master record {} holds a nested namespace",
                display_path(&ns)
            )));
        };
        let name = String::from_utf8(name).map_err(|_| {
            InternalError::store_corruption(format!(
                "master record {} holds a non-UTF-8 index name",
                display_path(&ns)
            ))
        })?;
        record.insert(name, value);

        item = cursor.next()?;
    }

    Ok(Some(record))
}

/// Write a fresh master record. The record namespace is created even when
/// the entity declares no indexes.
pub(crate) fn store_master<W: WriteTx>(
    tx: &mut W,
    master: &str,
    key: &[u8],
    record: &MasterRecord,
) -> Result<(), InternalError> {
    let ns: [&[u8]; 2] = [master.as_bytes(), key];
    tx.create_namespace_if_missing(&ns)?;
    for (name, value) in record.iter() {
        tx.put(&ns, name.as_bytes(), value)?;
    }

    Ok(())
}

/// Drop the master record for `key`; returns whether one existed.
pub(crate) fn remove_master<W: WriteTx>(
    tx: &mut W,
    master: &str,
    key: &[u8],
) -> Result<bool, InternalError> {
    tx.delete_namespace(&[master.as_bytes(), key])
}
