use std::sync::{
  Arc,
  OnceLock,
  atomic::{
    AtomicU64,
    Ordering,
  },
};

use lindoc_core::{
  Item,
  MetaSlot,
  Range,
};
use thiserror::Error;

use crate::{
  linear::LinearData,
  metadata::{
    MetaLinearData,
    MetadataReplace,
  },
  node::{
    NodeRegistry,
    NodeTypes,
  },
  tree::{
    Node,
    NodeId,
    NodeTree,
    SelectMode,
    SelectedNode,
  },
};

pub type Result<T> = std::result::Result<T, DocumentError>;

static NEXT_STAMP: AtomicU64 = AtomicU64::new(0);

fn next_stamp() -> u64 {
  NEXT_STAMP.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentError {
  #[error("unbalanced element at offset {offset}")]
  Unbalanced { offset: usize },
  #[error("expected {expected} metadata slots, found {found}")]
  MetadataLength { expected: usize, found: usize },
}

/// Snapshot of a document: linear data, metadata slots and the node types
/// used to interpret them.
///
/// Only the processor mutates a document. Every mutation bumps
/// [`Document::version`] and takes a fresh tree stamp, which invalidates the
/// cached node tree and any [`NodeId`] handed out before. Clones share the
/// stamp until one of them changes.
#[derive(Debug, Clone)]
pub struct Document {
  data:     LinearData,
  metadata: MetaLinearData,
  types:    Arc<dyn NodeTypes>,
  version:  u64,
  stamp:    u64,
  tree:     OnceLock<NodeTree>,
}

impl Document {
  /// Document without metadata using the built-in node types.
  pub fn new(items: Vec<Item>) -> Result<Self> {
    let metadata = MetaLinearData::empty(items.len());
    Self::from_parts(LinearData::new(items), metadata)
  }

  pub fn with_metadata(items: Vec<Item>, slots: Vec<MetaSlot>) -> Result<Self> {
    if slots.len() != items.len() + 1 {
      return Err(DocumentError::MetadataLength {
        expected: items.len() + 1,
        found:    slots.len(),
      });
    }
    Self::from_parts(LinearData::new(items), MetaLinearData::new(slots))
  }

  fn from_parts(data: LinearData, metadata: MetaLinearData) -> Result<Self> {
    if let Some(offset) = data.first_unbalanced() {
      return Err(DocumentError::Unbalanced { offset });
    }
    Ok(Self {
      data,
      metadata,
      types: NodeRegistry::builtin(),
      version: 0,
      stamp: next_stamp(),
      tree: OnceLock::new(),
    })
  }

  #[must_use]
  pub fn with_node_types(mut self, types: Arc<dyn NodeTypes>) -> Self {
    self.types = types;
    self.stamp = next_stamp();
    self.tree = OnceLock::new();
    self
  }

  pub fn data(&self) -> &LinearData {
    &self.data
  }

  pub fn metadata(&self) -> &MetaLinearData {
    &self.metadata
  }

  pub fn node_types(&self) -> &dyn NodeTypes {
    self.types.as_ref()
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn version(&self) -> u64 {
    self.version
  }

  pub fn tree(&self) -> &NodeTree {
    self.tree.get_or_init(|| {
      tracing::trace!(version = self.version, len = self.data.len(), "building node tree");
      NodeTree::build(self.data.items(), self.types.as_ref(), self.stamp)
    })
  }

  pub fn node(&self, id: NodeId) -> Option<&Node> {
    self.tree().get(id)
  }

  pub fn select_nodes(&self, range: Range, mode: SelectMode) -> Vec<SelectedNode> {
    self.tree().select_nodes(range, mode)
  }

  /// Slot rewrite needed to replace `remove` items at `offset` with `insert`
  /// items without losing metadata.
  pub fn metadata_replace(&self, offset: usize, remove: usize, insert: usize) -> Option<MetadataReplace> {
    self.metadata.replace_carry(offset, remove, insert)
  }

  pub(crate) fn replace_contents(&mut self, data: LinearData, metadata: MetaLinearData) {
    debug_assert_eq!(data.len() + 1, metadata.len());
    self.data = data;
    self.metadata = metadata;
    self.version += 1;
    self.stamp = next_stamp();
    self.tree = OnceLock::new();
  }
}
