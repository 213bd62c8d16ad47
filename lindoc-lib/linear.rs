//! Read-only view over the linear item sequence.

use lindoc_core::{
  AnnotationSet,
  Item,
  Range,
};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LinearData {
  items: Vec<Item>,
}

impl LinearData {
  pub fn new(items: Vec<Item>) -> Self {
    Self { items }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.items.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn items(&self) -> &[Item] {
    &self.items
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Item> {
    self.items.iter()
  }

  pub fn get(&self, offset: usize) -> Option<&Item> {
    self.items.get(offset)
  }

  /// Items in `range`, or `None` if it reaches past the end.
  pub fn slice(&self, range: Range) -> Option<&[Item]> {
    self.items.get(range.from()..range.to())
  }

  pub fn is_element_data(&self, offset: usize) -> bool {
    self.get(offset).is_some_and(Item::is_element)
  }

  pub fn is_open_element_data(&self, offset: usize) -> bool {
    self.get(offset).is_some_and(Item::is_open)
  }

  pub fn is_close_element_data(&self, offset: usize) -> bool {
    self.get(offset).is_some_and(Item::is_close)
  }

  pub fn element_type(&self, offset: usize) -> Option<&str> {
    self.get(offset).and_then(Item::element_type)
  }

  /// Annotations of the character or inline node opening at `offset`.
  pub fn annotations_at(&self, offset: usize) -> Option<&AnnotationSet> {
    self.get(offset).and_then(Item::annotations)
  }

  /// Offset of the first token that breaks balance: a close with no matching
  /// open, a close of the wrong type, or (at `len`) an element never closed.
  pub fn first_unbalanced(&self) -> Option<usize> {
    let mut stack: Vec<&str> = Vec::new();
    for (offset, item) in self.items.iter().enumerate() {
      match item {
        Item::Open(open) => stack.push(&open.ty),
        Item::Close { ty } => {
          if stack.pop() != Some(ty.as_str()) {
            return Some(offset);
          }
        },
        Item::Content { .. } => {},
      }
    }
    (!stack.is_empty()).then_some(self.items.len())
  }

  pub fn is_balanced(&self) -> bool {
    self.first_unbalanced().is_none()
  }

  pub(crate) fn into_items(self) -> Vec<Item> {
    self.items
  }
}

impl From<Vec<Item>> for LinearData {
  fn from(items: Vec<Item>) -> Self {
    Self::new(items)
  }
}
