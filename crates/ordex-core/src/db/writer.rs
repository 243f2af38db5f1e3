use crate::{
    db::{
        ExecContext, Reader,
        index::{IndexDelta, delete_entity, put_entity},
        store::WriteTx,
    },
    error::InternalError,
    obs::sink::{ExecKind, MetricsEvent, Span},
    traits::EntityKind,
};

///
/// Writer
///
/// Write executor bound to one write transaction. Every mutation runs the
/// full index-maintenance protocol before it returns.
///

pub struct Writer<'t, W: WriteTx> {
    tx: &'t mut W,
    ctx: ExecContext,
}

impl<'t, W: WriteTx> Writer<'t, W> {
    pub(crate) const fn new(tx: &'t mut W, ctx: ExecContext) -> Self {
        Self { tx, ctx }
    }

    /// Read executor over the same transaction, seeing this writer's changes.
    #[must_use]
    pub fn reader(&self) -> Reader<'_, W> {
        Reader::new(&*self.tx, self.ctx)
    }

    /// Raw substrate access for callers that need it.
    pub fn tx_mut(&mut self) -> &mut W {
        &mut *self.tx
    }

    /// Insert or replace `entity`, reindexing it.
    pub fn put<E: EntityKind>(&mut self, entity: &E) -> Result<(), InternalError> {
        let mut span = Span::<E>::new(ExecKind::Save, self.ctx.metrics);
        let delta = put_entity(&mut *self.tx, entity, self.ctx.max_payload_bytes)?;

        record_delta::<E>(&span, delta);
        span.set_rows(1);

        if self.ctx.debug {
            tracing::debug!(
                entity = E::PATH,
                key = %String::from_utf8_lossy(&entity.unique_key()),
                index_inserts = delta.inserts,
                index_removes = delta.removes,
                "put"
            );
        }

        Ok(())
    }

    /// Remove the row under `key` and every index entry pointing at it.
    /// Returns whether a row existed.
    pub fn delete<E: EntityKind>(&mut self, key: &[u8]) -> Result<bool, InternalError> {
        let mut span = Span::<E>::new(ExecKind::Delete, self.ctx.metrics);
        let (existed, delta) = delete_entity::<E, W>(&mut *self.tx, key)?;

        record_delta::<E>(&span, delta);
        span.set_rows(u64::from(existed));

        if self.ctx.debug {
            tracing::debug!(
                entity = E::PATH,
                key = %String::from_utf8_lossy(key),
                existed,
                index_removes = delta.removes,
                "delete"
            );
        }

        Ok(existed)
    }
}

fn record_delta<E: EntityKind>(span: &Span<E>, delta: IndexDelta) {
    span.record(MetricsEvent::IndexDelta {
        entity_path: E::PATH,
        inserts: delta.inserts,
        removes: delta.removes,
    });
    span.record(MetricsEvent::MasterIndexDelta {
        entity_path: E::PATH,
        inserts: delta.master_inserts,
        removes: delta.master_removes,
    });
}
