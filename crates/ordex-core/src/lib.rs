//! Core runtime for ordex: substrate traits, entity traits, index
//! maintenance, scan primitives, bound resolution, and the sink protocol.
#![warn(unreachable_pub)]

#[macro_use]
mod macros;

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod serialize;
pub mod traits;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Domain vocabulary only: entity traits, index descriptors, bounds, and
/// the consumer protocol. No stores or executors.
///

pub mod prelude {
    pub use crate::{
        db::{
            query::{Bound, Page},
            sink::{Collector, Counter, Flow, Paginator, Sink},
        },
        model::index::{IndexModel, IndexValue},
        traits::{EntityCodec, EntityKind, Path},
    };
}
