//! ## Crate layout
//! - `core`: the engine (substrate traits, index maintenance, scans, sinks).
//! - `error`: the stable public error type.
//! - `session`: a handle that runs one-shot reads and writes and maps errors.
//!
//! Most callers need only the `prelude`.

pub use ordex_core as core;

pub mod error;
pub mod session;

pub use error::{Error, ErrorKind, ErrorOrigin, QueryErrorKind, StoreErrorKind};
pub use ordex_core::impl_cbor_codec;
pub use session::DbSession;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::{
        DbSession, Error,
        core::{
            config::DbConfig,
            db::{
                Db,
                query::{Bound, Page},
                sink::{Collector, Counter, Flow, FnSink, Paginator, Sink},
                store::{KvStore, MemoryStore},
            },
            model::index::{IndexModel, IndexValue},
            traits::{EntityCodec as _, EntityKind, Path},
        },
    };
    pub use serde::{Deserialize, Serialize};
}
