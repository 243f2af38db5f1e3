//! Push-based consumer protocol driven by the scan primitives.
//!
//! Scans hand every matched raw payload to a [`Sink`] and stop the moment it
//! answers [`Flow::Stop`]. Decorators compose without the scans knowing.

#[cfg(test)]
mod tests;

use crate::{error::InternalError, traits::EntityCodec};

///
/// Flow
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    Continue,
    Stop,
}

impl Flow {
    #[must_use]
    pub const fn is_stop(self) -> bool {
        matches!(self, Self::Stop)
    }
}

///
/// Sink
///

pub trait Sink {
    fn accept(&mut self, raw: &[u8]) -> Result<Flow, InternalError>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn accept(&mut self, raw: &[u8]) -> Result<Flow, InternalError> {
        (**self).accept(raw)
    }
}

///
/// FnSink
/// Adapter turning a closure into a sink.
///

pub struct FnSink<F>(pub F);

impl<F> Sink for FnSink<F>
where
    F: FnMut(&[u8]) -> Result<Flow, InternalError>,
{
    fn accept(&mut self, raw: &[u8]) -> Result<Flow, InternalError> {
        (self.0)(raw)
    }
}

///
/// Collector
///
/// Decodes every payload into `E` and appends it. Payloads above the ceiling
/// are rejected before the entity codec sees them.
///

pub struct Collector<E> {
    items: Vec<E>,
    max_payload_bytes: usize,
}

impl<E: EntityCodec> Collector<E> {
    #[must_use]
    pub const fn new(max_payload_bytes: usize) -> Self {
        Self {
            items: Vec::new(),
            max_payload_bytes,
        }
    }

    #[must_use]
    pub fn into_items(self) -> Vec<E> {
        self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<E: EntityCodec> Sink for Collector<E> {
    fn accept(&mut self, raw: &[u8]) -> Result<Flow, InternalError> {
        self.items.push(decode_payload(raw, self.max_payload_bytes)?);

        Ok(Flow::Continue)
    }
}

/// Decode one stored payload, enforcing the configured ceiling.
pub(crate) fn decode_payload<E: EntityCodec>(
    raw: &[u8],
    max_payload_bytes: usize,
) -> Result<E, InternalError> {
    if raw.len() > max_payload_bytes {
        return Err(InternalError::executor_validation(format!(
            "stored payload of {} bytes exceeds the {max_payload_bytes} byte ceiling",
            raw.len()
        )));
    }

    E::unmarshal(raw)
        .map_err(|err| InternalError::from(err).with_context("failed to unmarshal storable"))
}

///
/// Counter
///

#[derive(Debug, Default)]
pub struct Counter {
    count: u64,
}

impl Counter {
    #[must_use]
    pub const fn new() -> Self {
        Self { count: 0 }
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }
}

impl Sink for Counter {
    fn accept(&mut self, _: &[u8]) -> Result<Flow, InternalError> {
        self.count = self.count.saturating_add(1);

        Ok(Flow::Continue)
    }
}

///
/// Paginator
///
/// Skips the first `skip` payloads, then forwards at most `limit` of them to
/// the inner sink. Zero means unbounded in either dimension, so
/// `Paginator::new(inner, 0, 0)` forwards everything.
///

pub struct Paginator<S> {
    inner: S,
    skip: usize,
    remaining: usize,
    limited: bool,
}

impl<S: Sink> Paginator<S> {
    #[must_use]
    pub const fn new(inner: S, skip: usize, limit: usize) -> Self {
        Self {
            inner,
            skip,
            remaining: limit,
            limited: limit > 0,
        }
    }

    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Sink> Sink for Paginator<S> {
    fn accept(&mut self, raw: &[u8]) -> Result<Flow, InternalError> {
        if self.skip > 0 {
            self.skip -= 1;
            return Ok(Flow::Continue);
        }
        if self.limited && self.remaining == 0 {
            return Ok(Flow::Stop);
        }

        let flow = self.inner.accept(raw)?;
        if self.limited {
            self.remaining -= 1;
            if self.remaining == 0 {
                return Ok(Flow::Stop);
            }
        }

        Ok(flow)
    }
}

///
/// Tally
///
/// Pass-through that counts how many payloads reached the wrapped sink.
/// Executors use it to report rows returned, as opposed to rows scanned.
///

pub(crate) struct Tally<S> {
    inner: S,
    seen: u64,
}

impl<S: Sink> Tally<S> {
    pub(crate) const fn new(inner: S) -> Self {
        Self { inner, seen: 0 }
    }

    pub(crate) const fn seen(&self) -> u64 {
        self.seen
    }
}

impl<S: Sink> Sink for Tally<S> {
    fn accept(&mut self, raw: &[u8]) -> Result<Flow, InternalError> {
        self.seen = self.seen.saturating_add(1);
        self.inner.accept(raw)
    }
}
