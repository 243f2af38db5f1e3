use crate::{
    model::index::{IndexModel, IndexValue},
    serialize::SerializeError,
};

// ============================================================================
// FOUNDATIONAL KINDS
// ============================================================================
//
// These traits define *where* an entity lives, not what it contains.
//

///
/// Path
/// Name of the primary namespace holding an entity kind.
///

pub trait Path {
    const PATH: &'static str;
}

// ============================================================================
// ENTITY CODEC
// ============================================================================

///
/// EntityCodec
///
/// Binary marshal/unmarshal pair owned by the entity type. The engine never
/// looks inside payloads; it only moves the bytes this trait produces.
/// `impl_cbor_codec!` provides the CBOR default for serde types.
///

pub trait EntityCodec: Sized {
    fn marshal(&self) -> Result<Vec<u8>, SerializeError>;

    fn unmarshal(bytes: &[u8]) -> Result<Self, SerializeError>;
}

// ============================================================================
// ENTITY KIND
// ============================================================================

///
/// EntityKind
///
/// Everything index maintenance needs from an entity:
/// - `MASTER_INDEX` names the reverse-lookup namespace for this kind
/// - `INDEXES` lists every index namespace the kind may declare (provisioning)
/// - `unique_key` must be non-empty
/// - `index_values` is recomputed fresh on every write, at most one value per index
///

pub trait EntityKind: Path + EntityCodec {
    const MASTER_INDEX: &'static str;
    const INDEXES: &'static [&'static IndexModel];

    fn unique_key(&self) -> Vec<u8>;

    fn index_values(&self) -> Vec<IndexValue>;
}
