use crate::Error;
use ordex_core::{
    config::DbConfig,
    db::{Db, Reader, Writer, index::MasterRecord, query::Bound, sink::Sink, store::KvStore},
    error::InternalError,
    obs::{MetricsSink, with_metrics_sink},
    traits::EntityKind,
};
use std::rc::Rc;

///
/// DbSession
///
/// Session-scoped database handle with policy (debug, metrics) and one-shot
/// shortcuts. Each shortcut runs in its own transaction; use [`view`] and
/// [`update`] to group several operations atomically.
///
/// [`view`]: DbSession::view
/// [`update`]: DbSession::update
///

pub struct DbSession<S: KvStore> {
    db: Db<S>,
    metrics: Option<Rc<dyn MetricsSink>>,
}

impl<S: KvStore> DbSession<S> {
    #[must_use]
    pub const fn new(db: Db<S>) -> Self {
        Self { db, metrics: None }
    }

    /// Open a session over `store` with a parsed configuration.
    pub fn with_config(store: S, config: DbConfig) -> Result<Self, Error> {
        Ok(Self::new(Db::with_config(store, config)?))
    }

    #[must_use]
    pub fn debug(mut self) -> Self {
        self.db = self.db.debug();
        self
    }

    /// Route this session's metrics events to `sink` instead of the
    /// process-local counters.
    #[must_use]
    pub fn metrics_sink(mut self, sink: Rc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    #[must_use]
    pub const fn db(&self) -> &Db<S> {
        &self.db
    }

    fn with_metrics<T>(&self, f: impl FnOnce() -> T) -> T {
        if let Some(sink) = &self.metrics {
            with_metrics_sink(Rc::clone(sink), f)
        } else {
            f()
        }
    }

    // ---------------------------------------------------------------------
    // Transactions
    // ---------------------------------------------------------------------

    pub fn provision<E: EntityKind>(&self) -> Result<(), Error> {
        Ok(self.db.provision::<E>()?)
    }

    pub fn view<T>(
        &self,
        f: impl FnOnce(&Reader<'_, S::Read>) -> Result<T, InternalError>,
    ) -> Result<T, Error> {
        Ok(self.with_metrics(|| self.db.view(f))?)
    }

    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut Writer<'_, S::Write>) -> Result<T, InternalError>,
    ) -> Result<T, Error> {
        Ok(self.with_metrics(|| self.db.update(f))?)
    }

    // ---------------------------------------------------------------------
    // Read shortcuts
    // ---------------------------------------------------------------------

    pub fn get<E: EntityKind>(&self, key: impl AsRef<[u8]>) -> Result<E, Error> {
        self.view(|r| r.get(key.as_ref()))
    }

    pub fn first<E: EntityKind>(&self) -> Result<E, Error> {
        self.view(|r| r.first())
    }

    pub fn last<E: EntityKind>(&self) -> Result<E, Error> {
        self.view(|r| r.last())
    }

    pub fn first_by<E: EntityKind>(&self, bounds: &[Bound]) -> Result<E, Error> {
        self.view(|r| r.first_by(bounds))
    }

    pub fn list<E: EntityKind>(&self, bounds: &[Bound]) -> Result<Vec<E>, Error> {
        self.view(|r| r.list(bounds))
    }

    pub fn count<E: EntityKind>(&self, bounds: &[Bound]) -> Result<u64, Error> {
        self.view(|r| r.count::<E>(bounds))
    }

    pub fn scan<E: EntityKind>(&self, bounds: &[Bound], sink: &mut dyn Sink) -> Result<u64, Error> {
        self.view(|r| r.scan::<E>(bounds, sink))
    }

    pub fn master_record<E: EntityKind>(
        &self,
        key: impl AsRef<[u8]>,
    ) -> Result<Option<MasterRecord>, Error> {
        self.view(|r| r.master_record::<E>(key.as_ref()))
    }

    // ---------------------------------------------------------------------
    // Write shortcuts
    // ---------------------------------------------------------------------

    /// Insert or replace one entity.
    pub fn put<E: EntityKind>(&self, entity: &E) -> Result<(), Error> {
        self.update(|w| w.put(entity))
    }

    /// Insert or replace several entities atomically.
    pub fn put_many<'a, E: EntityKind + 'a>(
        &self,
        entities: impl IntoIterator<Item = &'a E>,
    ) -> Result<usize, Error> {
        self.update(|w| {
            let mut written = 0;
            for entity in entities {
                w.put(entity)?;
                written += 1;
            }

            Ok(written)
        })
    }

    /// Delete by key; returns whether a row existed.
    pub fn delete<E: EntityKind>(&self, key: impl AsRef<[u8]>) -> Result<bool, Error> {
        self.update(|w| w.delete::<E>(key.as_ref()))
    }
}
