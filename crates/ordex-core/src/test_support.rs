//! Shared fixtures for unit tests: two entity kinds, a provisioned in-memory
//! database, and a recursive dump of raw store state.

use crate::{
    db::{
        Db,
        store::{Cursor, MemoryStore, ReadTx, Slot},
    },
    error::InternalError,
    model::index::{IndexModel, IndexValue},
    serialize::SerializeError,
    traits::{EntityCodec, EntityKind, Path},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Item
// ============================================================================

pub(crate) static ITEM_TAG: IndexModel = IndexModel::new("item_tag");

///
/// Item
/// JSON-coded entity with a single index over `tag`.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct Item {
    pub(crate) id: String,
    pub(crate) tag: String,
}

impl Item {
    pub(crate) fn new(id: &str, tag: &str) -> Self {
        Self {
            id: id.to_string(),
            tag: tag.to_string(),
        }
    }
}

impl Path for Item {
    const PATH: &'static str = "item";
}

impl EntityCodec for Item {
    fn marshal(&self) -> Result<Vec<u8>, SerializeError> {
        serde_json::to_vec(self).map_err(|e| SerializeError::Serialize(e.to_string()))
    }

    fn unmarshal(bytes: &[u8]) -> Result<Self, SerializeError> {
        serde_json::from_slice(bytes).map_err(|e| SerializeError::Deserialize(e.to_string()))
    }
}

impl EntityKind for Item {
    const MASTER_INDEX: &'static str = "item_master";
    const INDEXES: &'static [&'static IndexModel] = &[&ITEM_TAG];

    fn unique_key(&self) -> Vec<u8> {
        self.id.as_bytes().to_vec()
    }

    fn index_values(&self) -> Vec<IndexValue> {
        vec![ITEM_TAG.value(self.tag.as_bytes())]
    }
}

// ============================================================================
// Account
// ============================================================================

pub(crate) static ACCOUNT_REGION: IndexModel = IndexModel::new("account_region");
pub(crate) static ACCOUNT_TIER: IndexModel = IndexModel::new("account_tier");

///
/// Account
/// CBOR-coded entity with two indexes; `tier` is only indexed when set.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct Account {
    pub(crate) id: String,
    pub(crate) region: String,
    pub(crate) tier: Option<String>,
}

impl Account {
    pub(crate) fn new(id: &str, region: &str, tier: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            region: region.to_string(),
            tier: tier.map(str::to_string),
        }
    }
}

impl_cbor_codec!(Account);

impl Path for Account {
    const PATH: &'static str = "account";
}

impl EntityKind for Account {
    const MASTER_INDEX: &'static str = "account_master";
    const INDEXES: &'static [&'static IndexModel] = &[&ACCOUNT_REGION, &ACCOUNT_TIER];

    fn unique_key(&self) -> Vec<u8> {
        self.id.as_bytes().to_vec()
    }

    fn index_values(&self) -> Vec<IndexValue> {
        let mut values = vec![ACCOUNT_REGION.value(self.region.as_bytes())];
        if let Some(tier) = &self.tier {
            values.push(ACCOUNT_TIER.value(tier.as_bytes()));
        }

        values
    }
}

// ============================================================================
// Database fixtures
// ============================================================================

/// Fresh in-memory database with both fixture kinds provisioned.
pub(crate) fn provisioned_db() -> Db<MemoryStore> {
    let db = Db::new(MemoryStore::new());
    db.provision::<Item>().expect("provision item");
    db.provision::<Account>().expect("provision account");

    db
}

/// Provisioned database holding `(id, tag)` items.
pub(crate) fn item_db(rows: &[(&str, &str)]) -> Db<MemoryStore> {
    let db = provisioned_db();
    db.update(|w| {
        for (id, tag) in rows {
            w.put(&Item::new(id, tag))?;
        }

        Ok(())
    })
    .expect("seed items");

    db
}

pub(crate) fn item_ids(items: &[Item]) -> Vec<&str> {
    items.iter().map(|i| i.id.as_str()).collect()
}

// ============================================================================
// Raw state dump
// ============================================================================

///
/// Dump
/// Recursive snapshot of a namespace tree, for whole-state assertions.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Dump {
    Value(Vec<u8>),
    Namespace(BTreeMap<Vec<u8>, Dump>),
}

pub(crate) fn value(bytes: impl Into<Vec<u8>>) -> Dump {
    Dump::Value(bytes.into())
}

pub(crate) fn marker() -> Dump {
    Dump::Value(Vec::new())
}

pub(crate) fn namespace<'a>(entries: impl IntoIterator<Item = (&'a str, Dump)>) -> Dump {
    Dump::Namespace(
        entries
            .into_iter()
            .map(|(k, v)| (k.as_bytes().to_vec(), v))
            .collect(),
    )
}

/// Snapshot the named top-level namespaces; absent ones are left out.
pub(crate) fn dump_state(db: &Db<MemoryStore>, names: &[&str]) -> Dump {
    db.view(|r| {
        let mut out = BTreeMap::new();
        for name in names {
            let path = vec![name.as_bytes().to_vec()];
            if r.tx().namespace_exists(&[name.as_bytes()])? {
                out.insert(path[0].clone(), Dump::Namespace(dump_tree(r.tx(), &path)?));
            }
        }

        Ok(Dump::Namespace(out))
    })
    .expect("dump state")
}

fn dump_tree<T: ReadTx>(
    tx: &T,
    path: &[Vec<u8>],
) -> Result<BTreeMap<Vec<u8>, Dump>, InternalError> {
    let ns: Vec<&[u8]> = path.iter().map(Vec::as_slice).collect();
    let mut out = BTreeMap::new();
    let Some(mut cursor) = tx.cursor(&ns)? else {
        return Ok(out);
    };

    let mut item = cursor.first()?;
    while let Some((key, slot)) = item {
        let node = match slot {
            Slot::Value(bytes) => Dump::Value(bytes),
            Slot::Namespace => {
                let mut child = path.to_vec();
                child.push(key.clone());
                Dump::Namespace(dump_tree(tx, &child)?)
            }
        };
        out.insert(key, node);
        item = cursor.next()?;
    }

    Ok(out)
}
