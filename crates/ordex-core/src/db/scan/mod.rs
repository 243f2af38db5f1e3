//! Module: db::scan
//! Responsibility: cursor traversal of primary and index namespaces.
//! Does not own: bound validation (see `db::query`) or payload decoding.
//! Boundary: every primitive pushes raw payloads into a [`Sink`] and returns
//! the number of payloads it offered, halting on the first `Flow::Stop`.


use crate::{
    db::{
        query::ResolvedScan,
        sink::{Flow, Sink},
        store::{Cursor, ReadTx, Slot, display_path},
    },
    error::InternalError,
    model::index::{IndexModel, IndexValue},
};

/// Drive the primitive a resolved query selected.
pub(crate) fn run<T: ReadTx>(
    tx: &T,
    primary: &str,
    scan: &ResolvedScan,
    sink: &mut dyn Sink,
) -> Result<u64, InternalError> {
    match scan {
        ResolvedScan::Full => full(tx, primary, sink),
        ResolvedScan::By(index) => by(tx, primary, index, sink),
        ResolvedScan::Where(value) => where_(tx, primary, value, sink),
        ResolvedScan::Range { index, from, to } => {
            range(tx, primary, index, from.as_deref(), to.as_deref(), sink)
        }
    }
}

/// Every row of the primary namespace in key order.
pub(crate) fn full<T: ReadTx>(
    tx: &T,
    primary: &str,
    sink: &mut dyn Sink,
) -> Result<u64, InternalError> {
    let ns: [&[u8]; 1] = [primary.as_bytes()];
    let Some(mut rows) = tx.cursor(&ns)? else {
        return Err(InternalError::index_not_found(primary));
    };

    let mut scanned = 0;
    let mut item = rows.first()?;
    while let Some((key, slot)) = item {
        let Slot::Value(raw) = slot else {
            return Err(InternalError::store_corruption(format!(
                "primary namespace {primary} holds nested namespace {}",
                String::from_utf8_lossy(&key)
            )));
        };

        scanned += 1;
        if sink.accept(&raw)?.is_stop() {
            break;
        }
        item = rows.next()?;
    }

    Ok(scanned)
}

/// Every indexed row ordered by (index value, unique key).
pub(crate) fn by<T: ReadTx>(
    tx: &T,
    primary: &str,
    index: &IndexModel,
    sink: &mut dyn Sink,
) -> Result<u64, InternalError> {
    walk_index(tx, primary, index, None, None, sink)
}

/// Members of exactly one index value. An absent member set yields nothing.
pub(crate) fn where_<T: ReadTx>(
    tx: &T,
    primary: &str,
    value: &IndexValue,
    sink: &mut dyn Sink,
) -> Result<u64, InternalError> {
    require_namespace(tx, primary)?;
    require_namespace(tx, value.index().name())?;

    let mut scanned = 0;
    drain_members(
        tx,
        primary,
        &[value.index().namespace(), value.value()],
        sink,
        &mut scanned,
    )?;

    Ok(scanned)
}

/// Rows whose index value lies in `[from, to]`; a missing side is unbounded.
pub(crate) fn range<T: ReadTx>(
    tx: &T,
    primary: &str,
    index: &IndexModel,
    from: Option<&[u8]>,
    to: Option<&[u8]>,
    sink: &mut dyn Sink,
) -> Result<u64, InternalError> {
    walk_index(tx, primary, index, from, to, sink)
}

// ----------------------------------------------------------------------------
// Traversal
// ----------------------------------------------------------------------------

fn walk_index<T: ReadTx>(
    tx: &T,
    primary: &str,
    index: &IndexModel,
    from: Option<&[u8]>,
    to: Option<&[u8]>,
    sink: &mut dyn Sink,
) -> Result<u64, InternalError> {
    require_namespace(tx, primary)?;
    let Some(mut values) = tx.cursor(&[index.namespace()])? else {
        return Err(InternalError::index_not_found(index.name()));
    };

    let mut scanned = 0;
    let mut item = match from {
        Some(from) => values.seek(from)?,
        None => values.first()?,
    };

    while let Some((value, slot)) = item {
        if to.is_some_and(|to| value.as_slice() > to) {
            break;
        }
        if !slot.is_namespace() {
            return Err(InternalError::index_corruption(format!(
                "index {index} holds a plain value at {}",
                String::from_utf8_lossy(&value)
            )));
        }

        let flow = drain_members(
            tx,
            primary,
            &[index.namespace(), &value],
            sink,
            &mut scanned,
        )?;
        if flow.is_stop() {
            break;
        }
        item = values.next()?;
    }

    Ok(scanned)
}

// Push the primary payload of every member of one member set.
fn drain_members<T: ReadTx>(
    tx: &T,
    primary: &str,
    members_ns: &[&[u8]],
    sink: &mut dyn Sink,
    scanned: &mut u64,
) -> Result<Flow, InternalError> {
    let Some(mut members) = tx.cursor(members_ns)? else {
        return Ok(Flow::Continue);
    };

    let mut item = members.first()?;
    while let Some((key, _)) = item {
        let Some(raw) = tx.get(&[primary.as_bytes()], &key)? else {
            return Err(InternalError::index_corruption(format!(
                "{} lists key {} missing from {primary}",
                display_path(members_ns),
                String::from_utf8_lossy(&key)
            )));
        };

        *scanned += 1;
        if sink.accept(&raw)?.is_stop() {
            return Ok(Flow::Stop);
        }
        item = members.next()?;
    }

    Ok(Flow::Continue)
}

fn require_namespace<T: ReadTx>(tx: &T, name: &str) -> Result<(), InternalError> {
    if tx.namespace_exists(&[name.as_bytes()])? {
        Ok(())
    } else {
        Err(InternalError::index_not_found(name))
    }
}
