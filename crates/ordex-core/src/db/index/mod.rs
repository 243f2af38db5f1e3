//! Module: db::index
//! Responsibility: secondary-index membership and the per-entity master record.
//! Does not own: read-side traversal (see `db::scan`).
//! Boundary: writers call `put_entity` / `delete_entity` inside one write tx.

mod maintain;
mod master;


pub(crate) use maintain::{IndexDelta, delete_entity, put_entity};
pub use master::MasterRecord;
pub(crate) use master::load_master;
