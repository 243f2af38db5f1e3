use crate::{
    db::store::{Cursor, CursorItem, KvStore, ReadTx, Slot, WriteTx, display_path},
    error::InternalError,
};
use std::{
    collections::BTreeMap,
    ops::Bound,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

type Tree = BTreeMap<Vec<u8>, Node>;

// Nested namespaces sit behind `Arc` so a write transaction copies only the
// paths it touches; untouched subtrees stay shared with live snapshots.
#[derive(Clone, Debug)]
enum Node {
    Value(Vec<u8>),
    Namespace(Arc<Tree>),
}

impl Node {
    fn slot(&self) -> Slot {
        match self {
            Self::Value(value) => Slot::Value(value.clone()),
            Self::Namespace(_) => Slot::Namespace,
        }
    }
}

///
/// MemoryStore
///
/// In-process substrate with serialized writers and snapshot readers.
/// A write transaction works on a private copy of the root and swaps it in on
/// success; dropping the copy is the abort path.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    root: RwLock<Arc<Tree>>,
    writer: Mutex<()>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking writer never swaps the root, so poisoned locks still guard
    // a committed tree and are safe to recover.
    fn snapshot(&self) -> Arc<Tree> {
        let root = self.root.read().unwrap_or_else(PoisonError::into_inner);

        Arc::clone(&root)
    }
}

impl KvStore for MemoryStore {
    type Read = MemoryRead;
    type Write = MemoryWrite;

    fn view<T>(
        &self,
        f: impl FnOnce(&Self::Read) -> Result<T, InternalError>,
    ) -> Result<T, InternalError> {
        let tx = MemoryRead {
            root: self.snapshot(),
        };

        f(&tx)
    }

    fn update<T>(
        &self,
        f: impl FnOnce(&mut Self::Write) -> Result<T, InternalError>,
    ) -> Result<T, InternalError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut tx = MemoryWrite {
            root: Tree::clone(&self.snapshot()),
        };
        let out = f(&mut tx)?;

        let mut root = self.root.write().unwrap_or_else(PoisonError::into_inner);
        *root = Arc::new(tx.root);

        Ok(out)
    }
}

///
/// MemoryRead
/// Read-only snapshot transaction.
///

pub struct MemoryRead {
    root: Arc<Tree>,
}

impl ReadTx for MemoryRead {
    type Cursor<'a> = MemoryCursor<'a>;

    fn namespace_exists(&self, ns: &[&[u8]]) -> Result<bool, InternalError> {
        Ok(lookup(&self.root, ns).is_some())
    }

    fn get(&self, ns: &[&[u8]], key: &[u8]) -> Result<Option<Vec<u8>>, InternalError> {
        Ok(lookup(&self.root, ns).and_then(|tree| value_at(tree, key)))
    }

    fn cursor(&self, ns: &[&[u8]]) -> Result<Option<Self::Cursor<'_>>, InternalError> {
        Ok(lookup(&self.root, ns).map(MemoryCursor::new))
    }
}

///
/// MemoryWrite
/// Exclusive write transaction over a private copy of the root.
///

pub struct MemoryWrite {
    root: Tree,
}

impl ReadTx for MemoryWrite {
    type Cursor<'a> = MemoryCursor<'a>;

    fn namespace_exists(&self, ns: &[&[u8]]) -> Result<bool, InternalError> {
        Ok(lookup(&self.root, ns).is_some())
    }

    fn get(&self, ns: &[&[u8]], key: &[u8]) -> Result<Option<Vec<u8>>, InternalError> {
        Ok(lookup(&self.root, ns).and_then(|tree| value_at(tree, key)))
    }

    fn cursor(&self, ns: &[&[u8]]) -> Result<Option<Self::Cursor<'_>>, InternalError> {
        Ok(lookup(&self.root, ns).map(MemoryCursor::new))
    }
}

impl WriteTx for MemoryWrite {
    fn put(&mut self, ns: &[&[u8]], key: &[u8], value: &[u8]) -> Result<(), InternalError> {
        let tree = lookup_mut(&mut self.root, ns).ok_or_else(|| {
            InternalError::store_internal(format!("put into missing namespace {}", display_path(ns)))
        })?;

        if let Some(Node::Namespace(_)) = tree.get(key) {
            return Err(InternalError::store_internal(format!(
                "put would overwrite nested namespace {}/{}",
                display_path(ns),
                String::from_utf8_lossy(key)
            )));
        }
        tree.insert(key.to_vec(), Node::Value(value.to_vec()));

        Ok(())
    }

    fn delete(&mut self, ns: &[&[u8]], key: &[u8]) -> Result<bool, InternalError> {
        let Some(tree) = lookup_mut(&mut self.root, ns) else {
            return Ok(false);
        };

        match tree.get(key) {
            Some(Node::Value(_)) => Ok(tree.remove(key).is_some()),
            Some(Node::Namespace(_)) => Err(InternalError::store_internal(format!(
                "delete targets nested namespace {}/{}",
                display_path(ns),
                String::from_utf8_lossy(key)
            ))),
            None => Ok(false),
        }
    }

    fn create_namespace_if_missing(&mut self, ns: &[&[u8]]) -> Result<(), InternalError> {
        if ns.is_empty() {
            return Err(InternalError::store_internal("namespace path cannot be empty"));
        }

        let mut tree = &mut self.root;
        for segment in ns {
            if segment.is_empty() {
                return Err(InternalError::store_internal(format!(
                    "namespace path {} has an empty segment",
                    display_path(ns)
                )));
            }

            let node = tree
                .entry(segment.to_vec())
                .or_insert_with(|| Node::Namespace(Arc::new(Tree::new())));
            match node {
                Node::Namespace(child) => tree = Arc::make_mut(child),
                Node::Value(_) => {
                    return Err(InternalError::store_internal(format!(
                        "namespace path {} collides with a value",
                        display_path(ns)
                    )));
                }
            }
        }

        Ok(())
    }

    fn delete_namespace(&mut self, ns: &[&[u8]]) -> Result<bool, InternalError> {
        let Some((last, parent)) = ns.split_last() else {
            return Ok(false);
        };
        let tree = if parent.is_empty() {
            &mut self.root
        } else {
            let Some(tree) = lookup_mut(&mut self.root, parent) else {
                return Ok(false);
            };
            tree
        };

        match tree.get(*last) {
            Some(Node::Namespace(_)) => Ok(tree.remove(*last).is_some()),
            Some(Node::Value(_)) => Err(InternalError::store_internal(format!(
                "{} is a value, not a namespace",
                display_path(ns)
            ))),
            None => Ok(false),
        }
    }
}

///
/// MemoryCursor
///

pub struct MemoryCursor<'a> {
    tree: &'a Tree,
    position: Option<Vec<u8>>,
}

impl<'a> MemoryCursor<'a> {
    const fn new(tree: &'a Tree) -> Self {
        Self {
            tree,
            position: None,
        }
    }

    // Positioning calls that find nothing unpark the cursor.
    fn settle(&mut self, item: Option<(&'a Vec<u8>, &'a Node)>) -> Option<CursorItem> {
        self.position = item.map(|(key, _)| key.clone());
        let (key, node) = item?;

        Some((key.clone(), node.slot()))
    }
}

impl Cursor for MemoryCursor<'_> {
    fn first(&mut self) -> Result<Option<CursorItem>, InternalError> {
        let tree = self.tree;
        let item = tree.iter().next();

        Ok(self.settle(item))
    }

    fn last(&mut self) -> Result<Option<CursorItem>, InternalError> {
        let tree = self.tree;
        let item = tree.iter().next_back();

        Ok(self.settle(item))
    }

    fn seek(&mut self, key: &[u8]) -> Result<Option<CursorItem>, InternalError> {
        let tree = self.tree;
        let item = tree
            .range::<[u8], _>((Bound::Included(key), Bound::Unbounded))
            .next();

        Ok(self.settle(item))
    }

    fn next(&mut self) -> Result<Option<CursorItem>, InternalError> {
        let Some(position) = self.position.take() else {
            return Ok(None);
        };

        let tree = self.tree;
        let item = tree
            .range::<[u8], _>((Bound::Excluded(position.as_slice()), Bound::Unbounded))
            .next();
        match item {
            Some(item) => Ok(self.settle(Some(item))),
            None => {
                // stay parked on the last key so repeated `next` keeps yielding None
                self.position = Some(position);
                Ok(None)
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Path resolution
// ----------------------------------------------------------------------------

fn lookup<'t>(root: &'t Tree, ns: &[&[u8]]) -> Option<&'t Tree> {
    if ns.is_empty() {
        return None;
    }

    let mut tree = root;
    for segment in ns {
        match tree.get(*segment) {
            Some(Node::Namespace(child)) => tree = child.as_ref(),
            _ => return None,
        }
    }

    Some(tree)
}

fn lookup_mut<'t>(root: &'t mut Tree, ns: &[&[u8]]) -> Option<&'t mut Tree> {
    if ns.is_empty() {
        return None;
    }

    let mut tree = root;
    for segment in ns {
        match tree.get_mut(*segment) {
            Some(Node::Namespace(child)) => tree = Arc::make_mut(child),
            _ => return None,
        }
    }

    Some(tree)
}

fn value_at(tree: &Tree, key: &[u8]) -> Option<Vec<u8>> {
    match tree.get(key) {
        Some(Node::Value(value)) => Some(value.clone()),
        _ => None,
    }
}
