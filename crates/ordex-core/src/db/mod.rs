pub mod index;
pub mod query;
pub(crate) mod scan;
pub mod sink;
pub mod store;

mod reader;
mod writer;

#[cfg(test)]
mod tests;

use crate::{
    config::DbConfig,
    db::store::{KvStore, WriteTx},
    error::{ErrorClass, ErrorOrigin, InternalError},
    traits::EntityKind,
};
use std::collections::BTreeSet;

// re-exports
pub use reader::Reader;
pub use writer::Writer;

///
/// ExecContext
/// Per-handle execution policy copied into every reader and writer.
///

#[derive(Clone, Copy, Debug)]
pub(crate) struct ExecContext {
    pub(crate) debug: bool,
    pub(crate) metrics: bool,
    pub(crate) max_payload_bytes: usize,
}

impl From<&DbConfig> for ExecContext {
    fn from(config: &DbConfig) -> Self {
        Self {
            debug: config.debug,
            metrics: config.metrics,
            max_payload_bytes: config.max_payload_bytes as usize,
        }
    }
}

///
/// Db
///
/// Handle over one substrate. Readers and writers exist only inside the
/// closures passed to [`Db::view`] and [`Db::update`]; an `update` closure
/// that returns `Err` leaves the store exactly as it was.
///

pub struct Db<S: KvStore> {
    store: S,
    config: DbConfig,
}

impl<S: KvStore> Db<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: DbConfig::default(),
        }
    }

    pub fn with_config(store: S, config: DbConfig) -> Result<Self, InternalError> {
        config.validate()?;

        Ok(Self { store, config })
    }

    /// Enable debug logging for every subsequent call on this handle.
    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.config.debug = true;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &DbConfig {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn context(&self) -> ExecContext {
        ExecContext::from(&self.config)
    }

    /// Create the primary, master-index, and declared index namespaces of
    /// `E`. Safe to repeat.
    pub fn provision<E: EntityKind>(&self) -> Result<(), InternalError> {
        let mut names = BTreeSet::new();
        let all = [E::PATH, E::MASTER_INDEX]
            .into_iter()
            .chain(E::INDEXES.iter().map(|index| index.name()));
        for name in all {
            if name.is_empty() || !names.insert(name) {
                return Err(InternalError::new(
                    ErrorClass::Validation,
                    ErrorOrigin::Store,
                    format!("{} declares empty or duplicate namespace '{name}'", E::PATH),
                ));
            }
        }

        self.store
            .update(|tx| {
                for name in &names {
                    tx.create_namespace_if_missing(&[name.as_bytes()])?;
                }

                Ok(())
            })
            .inspect_err(log_failure)?;

        if self.config.debug {
            tracing::debug!(entity = E::PATH, namespaces = names.len(), "provisioned");
        }

        Ok(())
    }

    /// Run `f` against a read-only snapshot.
    pub fn view<T>(
        &self,
        f: impl FnOnce(&Reader<'_, S::Read>) -> Result<T, InternalError>,
    ) -> Result<T, InternalError> {
        let ctx = self.context();

        self.store
            .view(|tx| f(&Reader::new(tx, ctx)))
            .inspect_err(log_failure)
    }

    /// Run `f` inside a write transaction that commits iff `f` returns `Ok`.
    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut Writer<'_, S::Write>) -> Result<T, InternalError>,
    ) -> Result<T, InternalError> {
        let ctx = self.context();

        self.store
            .update(|tx| f(&mut Writer::new(tx, ctx)))
            .inspect_err(log_failure)
    }
}

// Provisioning defects and corruption are surfaced whatever the debug flag.
fn log_failure(err: &InternalError) {
    if err.is_fatal() || err.is_corruption() {
        tracing::warn!(
            class = %err.class,
            origin = %err.origin,
            error = %err.message,
            "transaction aborted"
        );
    }
}
