//! Node tree derived from the linear data.
//!
//! The tree is an arena of nodes built in one pass over the items. Runs of
//! consecutive characters become a single text node; every open/close pair
//! becomes an element node whose outer range spans both tokens.
//!
//! ```text
//! offset   0    1   2   3     4      5   6
//! item     <p>  a   b   </p>  <h1>   c   </h1>
//! nodes    [paragraph ... ]   [heading .... ]
//!               [text ]              [text]
//! ```

use lindoc_core::{
  Item,
  Range,
  Tendril,
};

use crate::node::{
  NodeCategory,
  NodeTypes,
};

/// Handle to a node of one document snapshot.
///
/// Handles carry the stamp of the tree that handed them out. Stamps are
/// unique per document and per edit, so a handle resolved against another
/// document, or the same one after it changed, yields `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
  index: u32,
  stamp: u64,
}

impl NodeId {
  pub fn stamp(&self) -> u64 {
    self.stamp
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
  Root,
  Text,
  Element {
    ty:       Tendril,
    category: NodeCategory,
  },
}

#[derive(Debug, Clone)]
pub struct Node {
  kind:     NodeKind,
  parent:   Option<u32>,
  children: Vec<u32>,
  outer:    Range,
}

impl Node {
  pub fn kind(&self) -> &NodeKind {
    &self.kind
  }

  pub fn type_name(&self) -> &str {
    match &self.kind {
      NodeKind::Root => "document",
      NodeKind::Text => "text",
      NodeKind::Element { ty, .. } => ty,
    }
  }

  /// Whether the node is delimited by open/close tokens.
  pub fn is_wrapped(&self) -> bool {
    matches!(self.kind, NodeKind::Element { .. })
  }

  /// Text and inline content nodes.
  pub fn is_content(&self) -> bool {
    match self.kind {
      NodeKind::Text => true,
      NodeKind::Element { category, .. } => category == NodeCategory::Content,
      NodeKind::Root => false,
    }
  }

  pub fn can_contain_content(&self) -> bool {
    matches!(
      self.kind,
      NodeKind::Element {
        category: NodeCategory::ContentBranch,
        ..
      }
    )
  }

  pub fn has_children(&self) -> bool {
    !self.children.is_empty()
  }

  /// Offsets covered including the open and close tokens.
  pub fn outer_range(&self) -> Range {
    self.outer
  }

  /// Offsets between the open and close tokens.
  pub fn range(&self) -> Range {
    if self.is_wrapped() {
      Range::new(self.outer.start + 1, self.outer.end.saturating_sub(1))
    } else {
      self.outer
    }
  }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
  /// Outermost nodes entirely inside the range, plus partially covered leaves.
  Covered,
  /// Like `Covered`, but covered branches are replaced by their leaves.
  Leaves,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedNode {
  pub node:             NodeId,
  /// Covered part of the node's inner range when only partially selected.
  pub range:            Option<Range>,
  pub node_range:       Range,
  pub node_outer_range: Range,
}

#[derive(Debug, Clone)]
pub struct NodeTree {
  nodes: Vec<Node>,
  stamp: u64,
}

const ROOT: u32 = 0;

impl NodeTree {
  pub fn build(items: &[Item], types: &dyn NodeTypes, stamp: u64) -> Self {
    let mut nodes = vec![Node {
      kind:     NodeKind::Root,
      parent:   None,
      children: Vec::new(),
      outer:    Range::new(0, items.len()),
    }];
    let mut stack = vec![ROOT];

    let push = |nodes: &mut Vec<Node>, parent: u32, kind: NodeKind, outer: Range| {
      let index = nodes.len() as u32;
      nodes.push(Node {
        kind,
        parent: Some(parent),
        children: Vec::new(),
        outer,
      });
      nodes[parent as usize].children.push(index);
      index
    };

    let mut offset = 0;
    while offset < items.len() {
      let parent = stack.last().copied().unwrap_or(ROOT);
      match &items[offset] {
        Item::Content { .. } => {
          let end = items[offset..]
            .iter()
            .position(Item::is_element)
            .map_or(items.len(), |len| offset + len);
          push(&mut nodes, parent, NodeKind::Text, Range::new(offset, end));
          offset = end;
          continue;
        },
        Item::Open(open) => {
          let kind = NodeKind::Element {
            ty:       open.ty.clone(),
            category: types.category(&open.ty),
          };
          // End is patched when the close token is reached.
          let index = push(&mut nodes, parent, kind, Range::new(offset, items.len()));
          stack.push(index);
        },
        Item::Close { .. } => {
          if stack.len() > 1
            && let Some(index) = stack.pop()
          {
            nodes[index as usize].outer.end = offset + 1;
          }
        },
      }
      offset += 1;
    }

    Self { nodes, stamp }
  }

  pub fn stamp(&self) -> u64 {
    self.stamp
  }

  pub fn root(&self) -> NodeId {
    self.id(ROOT)
  }

  fn id(&self, index: u32) -> NodeId {
    NodeId {
      index,
      stamp: self.stamp,
    }
  }

  pub fn get(&self, id: NodeId) -> Option<&Node> {
    if id.stamp != self.stamp {
      return None;
    }
    self.nodes.get(id.index as usize)
  }

  pub fn parent(&self, id: NodeId) -> Option<NodeId> {
    self.get(id)?.parent.map(|index| self.id(index))
  }

  pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    self
      .get(id)
      .map(|node| node.children.as_slice())
      .unwrap_or_default()
      .iter()
      .map(move |&index| self.id(index))
  }

  /// Innermost node whose outer range strictly contains `offset`, or whose
  /// range touches it for text.
  pub fn node_at(&self, offset: usize) -> NodeId {
    let mut current = ROOT;
    'descend: loop {
      for &child in &self.nodes[current as usize].children {
        let node = &self.nodes[child as usize];
        if touches_point(node, offset) {
          current = child;
          continue 'descend;
        }
      }
      return self.id(current);
    }
  }

  /// Whether removing everything between `a` and `b` may join them.
  ///
  /// Walks both ancestor chains in step; every pair of nodes on the way to
  /// the common ancestor must have the same type.
  pub fn can_be_merged(&self, a: NodeId, b: NodeId) -> bool {
    let (Some(_), Some(_)) = (self.get(a), self.get(b)) else {
      return false;
    };
    let (mut a, mut b) = (Some(a.index), Some(b.index));
    while a != b {
      let (Some(na), Some(nb)) = (a, b) else {
        return false;
      };
      let (na, nb) = (&self.nodes[na as usize], &self.nodes[nb as usize]);
      if na.type_name() != nb.type_name() {
        return false;
      }
      a = na.parent;
      b = nb.parent;
    }
    true
  }

  /// Nodes touched by `range`, in document order.
  ///
  /// A node entirely inside the range is reported whole (`range: None`). A
  /// partially covered branch is descended into; a partially covered node
  /// with nothing selectable below it is reported with the covered part of
  /// its inner range.
  pub fn select_nodes(&self, range: Range, mode: SelectMode) -> Vec<SelectedNode> {
    let mut selection = Vec::new();
    self.select_in(ROOT, range.normalized(), mode, &mut selection);
    selection
  }

  fn select_in(&self, parent: u32, range: Range, mode: SelectMode, out: &mut Vec<SelectedNode>) -> bool {
    let before = out.len();
    for &index in &self.nodes[parent as usize].children {
      let node = &self.nodes[index as usize];
      if !touches(node, range) {
        continue;
      }
      let outer = node.outer_range();
      let covered =
        !range.is_collapsed() && range.from() <= outer.from() && range.to() >= outer.to();
      if covered {
        if mode == SelectMode::Leaves && node.has_children() {
          self.push_leaves(index, out);
        } else {
          out.push(self.selected(index, None));
        }
        continue;
      }
      if !(node.has_children() && self.select_in(index, range, mode, out)) {
        out.push(self.selected(index, Some(range.clamp(node.range()))));
      }
    }
    out.len() > before
  }

  fn push_leaves(&self, index: u32, out: &mut Vec<SelectedNode>) {
    for &child in &self.nodes[index as usize].children {
      if self.nodes[child as usize].has_children() {
        self.push_leaves(child, out);
      } else {
        out.push(self.selected(child, None));
      }
    }
  }

  fn selected(&self, index: u32, range: Option<Range>) -> SelectedNode {
    let node = &self.nodes[index as usize];
    SelectedNode {
      node: self.id(index),
      range,
      node_range: node.range(),
      node_outer_range: node.outer_range(),
    }
  }
}

fn touches(node: &Node, range: Range) -> bool {
  if range.is_collapsed() {
    return touches_point(node, range.start);
  }
  let outer = node.outer_range();
  range.from() < outer.to() && range.to() > outer.from()
}

fn touches_point(node: &Node, offset: usize) -> bool {
  let outer = node.outer_range();
  if node.is_wrapped() {
    outer.from() < offset && offset < outer.to()
  } else {
    outer.from() <= offset && offset <= outer.to()
  }
}
