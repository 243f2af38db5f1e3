use crate::{
    db::{
        ExecContext,
        index::{MasterRecord, load_master},
        query::{Bound, resolve},
        scan,
        sink::{Collector, Counter, Flow, Paginator, Sink, Tally, decode_payload},
        store::{Cursor, ReadTx, Slot},
    },
    error::{ErrorClass, ErrorOrigin, InternalError},
    obs::sink::{ExecKind, MetricsEvent, Span},
    traits::EntityKind,
};

///
/// Reader
///
/// Read executor bound to one transaction. Every call records a load span
/// and, with debug enabled, a `tracing` event describing the resolved scan.
///

pub struct Reader<'t, T: ReadTx> {
    tx: &'t T,
    ctx: ExecContext,
}

impl<'t, T: ReadTx> Reader<'t, T> {
    pub(crate) const fn new(tx: &'t T, ctx: ExecContext) -> Self {
        Self { tx, ctx }
    }

    /// Raw substrate access for callers that need it.
    #[must_use]
    pub const fn tx(&self) -> &'t T {
        self.tx
    }

    // ---------------------------------------------------------------------
    // Point lookups
    // ---------------------------------------------------------------------

    /// Load the entity stored under `key`.
    pub fn get<E: EntityKind>(&self, key: &[u8]) -> Result<E, InternalError> {
        let mut span = Span::<E>::new(ExecKind::Load, self.ctx.metrics);
        if key.is_empty() {
            return Err(InternalError::executor_validation("key cannot be empty"));
        }
        self.require_primary::<E>()?;

        let raw = self
            .tx
            .get(&[E::PATH.as_bytes()], key)?
            .ok_or_else(|| InternalError::store_not_found(String::from_utf8_lossy(key)))?;
        let entity = decode_payload(&raw, self.ctx.max_payload_bytes)?;
        span.set_rows(1);

        self.debug_log::<E>("get", "primary key lookup", 1);

        Ok(entity)
    }

    /// First row of the primary namespace in key order.
    pub fn first<E: EntityKind>(&self) -> Result<E, InternalError> {
        self.edge::<E>(true)
    }

    /// Last row of the primary namespace in key order.
    pub fn last<E: EntityKind>(&self) -> Result<E, InternalError> {
        self.edge::<E>(false)
    }

    fn edge<E: EntityKind>(&self, first: bool) -> Result<E, InternalError> {
        let mut span = Span::<E>::new(ExecKind::Load, self.ctx.metrics);
        let Some(mut cursor) = self.tx.cursor(&[E::PATH.as_bytes()])? else {
            return Err(InternalError::provisioning(E::PATH));
        };

        let item = if first { cursor.first()? } else { cursor.last()? };
        let raw = match item {
            Some((_, Slot::Value(raw))) => raw,
            Some((key, Slot::Namespace)) => {
                return Err(InternalError::store_corruption(format!(
                    "primary namespace {} holds nested namespace {}",
                    E::PATH,
                    String::from_utf8_lossy(&key)
                )));
            }
            None => {
                return Err(InternalError::new(
                    ErrorClass::NotFound,
                    ErrorOrigin::Store,
                    format!("{} holds no rows", E::PATH),
                ));
            }
        };

        let entity = decode_payload(&raw, self.ctx.max_payload_bytes)?;
        span.set_rows(1);

        let label = if first { "first" } else { "last" };
        self.debug_log::<E>(label, "primary edge lookup", 1);

        Ok(entity)
    }

    // ---------------------------------------------------------------------
    // Bounded scans
    // ---------------------------------------------------------------------

    /// Decode every row the bounds select.
    pub fn list<E: EntityKind>(&self, bounds: &[Bound]) -> Result<Vec<E>, InternalError> {
        let mut collector = Collector::<E>::new(self.ctx.max_payload_bytes);
        self.execute::<E>("list", bounds, &mut collector)?;

        Ok(collector.into_items())
    }

    /// Number of rows the bounds select, after pagination.
    pub fn count<E: EntityKind>(&self, bounds: &[Bound]) -> Result<u64, InternalError> {
        let mut counter = Counter::new();
        self.execute::<E>("count", bounds, &mut counter)?;

        Ok(counter.count())
    }

    /// First row the bounds select.
    pub fn first_by<E: EntityKind>(&self, bounds: &[Bound]) -> Result<E, InternalError> {
        let mut first = FirstRow::default();
        self.execute::<E>("first_by", bounds, &mut first)?;

        let raw = first.0.ok_or_else(|| {
            InternalError::new(
                ErrorClass::NotFound,
                ErrorOrigin::Executor,
                format!("no {} row matches the bounds", E::PATH),
            )
        })?;

        decode_payload(&raw, self.ctx.max_payload_bytes)
    }

    /// Push every selected payload into a caller-owned sink.
    /// Returns how many payloads reached it.
    pub fn scan<E: EntityKind>(
        &self,
        bounds: &[Bound],
        sink: &mut dyn Sink,
    ) -> Result<u64, InternalError> {
        self.execute::<E>("scan", bounds, sink)
    }

    /// The master record of `key`, if the entity has ever been written.
    pub fn master_record<E: EntityKind>(
        &self,
        key: &[u8],
    ) -> Result<Option<MasterRecord>, InternalError> {
        if !self.tx.namespace_exists(&[E::MASTER_INDEX.as_bytes()])? {
            return Err(InternalError::provisioning(E::MASTER_INDEX));
        }

        load_master(self.tx, E::MASTER_INDEX, key)
    }

    // Resolve, paginate, and drive one scan. Returns rows forwarded to `sink`.
    fn execute<E: EntityKind>(
        &self,
        op: &'static str,
        bounds: &[Bound],
        sink: &mut dyn Sink,
    ) -> Result<u64, InternalError> {
        let mut span = Span::<E>::new(ExecKind::Load, self.ctx.metrics);
        let query = resolve(bounds)?;
        span.record(MetricsEvent::Plan {
            kind: query.scan.kind(),
        });

        let mut tally = Tally::new(sink);
        let scanned = match query.page {
            Some(page) if !page.is_identity() => {
                let mut paged = Paginator::new(&mut tally, page.skip, page.limit);
                scan::run(self.tx, E::PATH, &query.scan, &mut paged)?
            }
            _ => scan::run(self.tx, E::PATH, &query.scan, &mut tally)?,
        };
        let returned = tally.seen();

        span.record(MetricsEvent::RowsScanned {
            entity_path: E::PATH,
            rows_scanned: scanned,
        });
        span.set_rows(returned);

        if self.ctx.debug {
            tracing::debug!(
                entity = E::PATH,
                op,
                scan = %query.scan.debug_summary(),
                page = ?query.page,
                scanned,
                returned,
                "load"
            );
        }

        Ok(returned)
    }

    fn require_primary<E: EntityKind>(&self) -> Result<(), InternalError> {
        if self.tx.namespace_exists(&[E::PATH.as_bytes()])? {
            Ok(())
        } else {
            Err(InternalError::provisioning(E::PATH))
        }
    }

    fn debug_log<E: EntityKind>(&self, op: &'static str, access: &'static str, rows: u64) {
        if self.ctx.debug {
            tracing::debug!(entity = E::PATH, op, access, rows, "load");
        }
    }
}

///
/// FirstRow
/// Keeps the first payload offered and stops the scan.
///

#[derive(Default)]
struct FirstRow(Option<Vec<u8>>);

impl Sink for FirstRow {
    fn accept(&mut self, raw: &[u8]) -> Result<Flow, InternalError> {
        self.0 = Some(raw.to_vec());

        Ok(Flow::Stop)
    }
}
