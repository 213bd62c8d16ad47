//! Repair of inserted data so the document stays balanced.

use lindoc_core::{
  Item,
  OpenElement,
};

use crate::{
  Document,
  node::NodeTypes,
  transaction::{
    Result,
    TransactionError,
  },
};

/// Element type wrapped around content inserted outside a content branch.
const WRAPPER: &str = "paragraph";

/// Where and what to insert once the raw data has been fixed up.
#[derive(Debug, Clone, PartialEq)]
pub struct Insertion {
  pub offset: usize,
  pub remove: usize,
  pub data:   Vec<Item>,
}

impl Document {
  /// Adjust `data` so inserting it at `offset` leaves the document balanced.
  ///
  /// - closes without an inserted counterpart close the enclosing element and
  ///   are retyped to match it; closes with nothing left to close are dropped
  /// - elements the insertion leaves open are closed, and enclosing elements
  ///   it closed are reopened, unless the two already match
  /// - a structural element inserted inside a content branch first closes it
  /// - content inserted where content is not allowed is wrapped in a paragraph
  /// - an offset inside an inline node moves past its close
  ///
  /// Nothing is ever removed.
  pub fn fixup_insertion(&self, data: Vec<Item>, offset: usize) -> Result<Insertion> {
    let len = self.len();
    if offset > len {
      return Err(TransactionError::OffsetOutOfBounds { offset, len });
    }
    let types = self.node_types();
    let items = self.data().items();

    let mut offset = offset;
    let mut ancestors = open_ancestors(items, offset);
    while let Some(top) = ancestors.last()
      && types.is_content(&top.ty)
      && let Some(close) = matching_close(items, offset)
    {
      tracing::trace!(from = offset, to = close + 1, "moving insertion out of inline node");
      offset = close + 1;
      ancestors.pop();
    }

    let mut fixer = Fixer {
      types,
      ancestors,
      opened: Vec::new(),
      closed: Vec::new(),
      wrapper: None,
      out: Vec::with_capacity(data.len()),
    };
    for item in data {
      fixer.push(item);
    }
    let data = fixer.finish();

    Ok(Insertion {
      offset,
      remove: 0,
      data,
    })
  }
}

struct Fixer<'a> {
  types:     &'a dyn NodeTypes,
  /// Elements enclosing the insertion point that are still open.
  ancestors: Vec<OpenElement>,
  /// Elements opened by the insertion and not yet closed.
  opened:    Vec<OpenElement>,
  /// Enclosing elements closed by the insertion, innermost first.
  closed:    Vec<OpenElement>,
  /// Depth in `opened` of the wrapper added here, if one is open.
  wrapper:   Option<usize>,
  out:       Vec<Item>,
}

impl Fixer<'_> {
  fn parent(&self) -> Option<&OpenElement> {
    self.opened.last().or(self.ancestors.last())
  }

  fn parent_allows_content(&self) -> bool {
    self
      .parent()
      .is_some_and(|parent| self.types.can_contain_content(&parent.ty))
  }

  fn push(&mut self, item: Item) {
    match item {
      Item::Content { .. } => {
        self.ensure_content_allowed();
        self.out.push(item);
      },
      Item::Open(open) if self.types.is_content(&open.ty) => {
        self.ensure_content_allowed();
        self.opened.push(open.clone());
        self.out.push(Item::Open(open));
      },
      Item::Open(open) => {
        self.end_wrapper();
        while self.parent_allows_content() {
          self.close_parent();
        }
        self.opened.push(open.clone());
        self.out.push(Item::Open(open));
      },
      Item::Close { ty } => {
        if self.wrapper.is_some_and(|depth| self.opened.len() > depth + 1) {
          self.close_parent();
          return;
        }
        self.end_wrapper();
        if self.parent().is_none() {
          tracing::trace!(%ty, "dropping unmatched close");
          return;
        }
        self.close_parent();
      },
    }
  }

  fn ensure_content_allowed(&mut self) {
    if self.wrapper.is_some() || self.parent_allows_content() {
      return;
    }
    let wrapper = OpenElement::new(WRAPPER);
    self.out.push(Item::Open(wrapper.clone()));
    self.wrapper = Some(self.opened.len());
    self.opened.push(wrapper);
  }

  /// Close the wrapper along with any inline nodes still open inside it.
  fn end_wrapper(&mut self) {
    let Some(depth) = self.wrapper.take() else {
      return;
    };
    for open in self.opened.drain(depth..).rev() {
      self.out.push(open.closing());
    }
  }

  /// Close the innermost open element, inserted or enclosing.
  fn close_parent(&mut self) {
    if let Some(open) = self.opened.pop() {
      self.out.push(open.closing());
    } else if let Some(ancestor) = self.ancestors.pop() {
      self.out.push(ancestor.closing());
      self.closed.push(ancestor);
    }
  }

  fn finish(mut self) -> Vec<Item> {
    self.end_wrapper();
    let reopens_closed = self.opened.len() == self.closed.len()
      && self
        .opened
        .iter()
        .zip(self.closed.iter().rev())
        .all(|(opened, closed)| opened.ty == closed.ty);
    if !reopens_closed {
      while let Some(open) = self.opened.pop() {
        self.out.push(open.closing());
      }
      for ancestor in self.closed.iter().rev() {
        self.out.push(Item::Open(ancestor.clone()));
      }
    }
    self.out
  }
}

/// Elements enclosing `offset`, outermost first.
fn open_ancestors(items: &[Item], offset: usize) -> Vec<OpenElement> {
  let mut stack = Vec::new();
  for item in &items[..offset] {
    match item {
      Item::Open(open) => stack.push(open.clone()),
      Item::Close { .. } => {
        stack.pop();
      },
      Item::Content { .. } => {},
    }
  }
  stack
}

/// Offset of the close token ending the element enclosing `offset`.
fn matching_close(items: &[Item], offset: usize) -> Option<usize> {
  let mut depth = 0usize;
  for (index, item) in items.iter().enumerate().skip(offset) {
    match item {
      Item::Open(_) => depth += 1,
      Item::Close { .. } if depth == 0 => return Some(index),
      Item::Close { .. } => depth -= 1,
      Item::Content { .. } => {},
    }
  }
  None
}
