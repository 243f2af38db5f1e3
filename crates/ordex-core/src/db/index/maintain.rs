use crate::{
    db::{
        index::master::{MasterRecord, load_master, remove_master, store_master},
        store::{ReadTx, WriteTx},
    },
    error::InternalError,
    model::index::IndexValue,
    traits::EntityKind,
};
use std::collections::BTreeSet;

///
/// IndexDelta
/// Membership writes performed by one maintenance pass.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct IndexDelta {
    pub(crate) inserts: u64,
    pub(crate) removes: u64,
    pub(crate) master_inserts: u64,
    pub(crate) master_removes: u64,
}

/// Store `entity` and bring every index namespace in line with it.
///
/// All checks (namespaces, key, descriptor values, payload encoding) run
/// before the first mutation, so a rejected write touches nothing even on a
/// substrate that would not roll back.
pub(crate) fn put_entity<E: EntityKind, W: WriteTx>(
    tx: &mut W,
    entity: &E,
    max_payload_bytes: usize,
) -> Result<IndexDelta, InternalError> {
    require_namespace(tx, E::PATH)?;
    require_namespace(tx, E::MASTER_INDEX)
        .map_err(|err| err.with_context("process indexes"))?;

    let key = entity.unique_key();
    if key.is_empty() {
        return Err(InternalError::executor_validation("unique key cannot be empty"));
    }

    let values = entity.index_values();
    check_descriptors(tx, &values).map_err(|err| {
        err.with_context("create indexes")
            .with_context("process indexes")
    })?;
    let payload = encode_payload(entity, max_payload_bytes).map_err(|err| err.with_context("put"))?;

    let mut delta = IndexDelta::default();
    process_indexes(tx, E::MASTER_INDEX, &key, &values, &mut delta)
        .map_err(|err| err.with_context("process indexes"))?;

    tx.put(&[E::PATH.as_bytes()], &key, &payload)
        .map_err(|err| err.with_context("put"))?;

    Ok(delta)
}

/// Remove the row stored under `key` together with its memberships and
/// master record. Returns whether a row existed.
pub(crate) fn delete_entity<E: EntityKind, W: WriteTx>(
    tx: &mut W,
    key: &[u8],
) -> Result<(bool, IndexDelta), InternalError> {
    require_namespace(tx, E::PATH)?;
    require_namespace(tx, E::MASTER_INDEX)?;

    if key.is_empty() {
        return Err(InternalError::executor_validation("unique key cannot be empty"));
    }

    let mut delta = IndexDelta::default();
    cleanup_indexes(tx, E::MASTER_INDEX, key, &mut delta)
        .map_err(|err| err.with_context("cleanup indexes"))?;
    let existed = tx.delete(&[E::PATH.as_bytes()], key)?;

    Ok((existed, delta))
}

// ----------------------------------------------------------------------------
// Phases
// ----------------------------------------------------------------------------

fn process_indexes<W: WriteTx>(
    tx: &mut W,
    master: &str,
    key: &[u8],
    values: &[IndexValue],
    delta: &mut IndexDelta,
) -> Result<(), InternalError> {
    cleanup_indexes(tx, master, key, delta).map_err(|err| err.with_context("cleanup indexes"))?;
    create_indexes(tx, key, values, delta).map_err(|err| err.with_context("create indexes"))?;

    let record: MasterRecord = values
        .iter()
        .map(|v| (v.index().name(), v.value().to_vec()))
        .collect();
    store_master(tx, master, key, &record)?;
    delta.master_inserts += 1;

    Ok(())
}

// Drop `key` from every member set the master record lists, then drop the
// record. Member sets or namespaces that vanished are skipped.
fn cleanup_indexes<W: WriteTx>(
    tx: &mut W,
    master: &str,
    key: &[u8],
    delta: &mut IndexDelta,
) -> Result<(), InternalError> {
    let Some(record) = load_master(tx, master, key)? else {
        return Ok(());
    };

    for (index, value) in record.iter() {
        let ns: [&[u8]; 2] = [index.as_bytes(), value];
        if tx.namespace_exists(&ns)? && tx.delete(&ns, key)? {
            delta.removes += 1;
        }
    }

    if remove_master(tx, master, key)? {
        delta.master_removes += 1;
    }

    Ok(())
}

fn create_indexes<W: WriteTx>(
    tx: &mut W,
    key: &[u8],
    values: &[IndexValue],
    delta: &mut IndexDelta,
) -> Result<(), InternalError> {
    for value in values {
        let ns: [&[u8]; 2] = [value.index().namespace(), value.value()];
        tx.create_namespace_if_missing(&ns)?;
        tx.put(&ns, key, &[])?;
        delta.inserts += 1;
    }

    Ok(())
}

// ----------------------------------------------------------------------------
// Checks
// ----------------------------------------------------------------------------

fn require_namespace<T: ReadTx>(tx: &T, name: &str) -> Result<(), InternalError> {
    if tx.namespace_exists(&[name.as_bytes()])? {
        Ok(())
    } else {
        Err(InternalError::provisioning(name))
    }
}

fn check_descriptors<T: ReadTx>(tx: &T, values: &[IndexValue]) -> Result<(), InternalError> {
    let mut seen = BTreeSet::new();

    for value in values {
        let index = value.index();
        if !seen.insert(index.name()) {
            return Err(InternalError::index_validation(format!(
                "index {index} declared more than once"
            )));
        }
        require_namespace(tx, index.name())?;
        if value.is_empty() {
            return Err(InternalError::index_validation(format!(
                "index {index} key cannot be empty"
            )));
        }
    }

    Ok(())
}

fn encode_payload<E: EntityKind>(
    entity: &E,
    max_payload_bytes: usize,
) -> Result<Vec<u8>, InternalError> {
    let payload = entity
        .marshal()
        .map_err(|err| InternalError::from(err).with_context("can't marshal storable"))?;

    if payload.len() > max_payload_bytes {
        return Err(InternalError::executor_validation(format!(
            "payload of {} bytes exceeds the {max_payload_bytes} byte ceiling",
            payload.len()
        )));
    }

    Ok(payload)
}
