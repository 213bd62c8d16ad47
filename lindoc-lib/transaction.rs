//! Transactions over the linear document model.
//!
//! A [`Transaction`] is a list of [`Operation`]s that walks the document from
//! its first item to its last exactly once:
//!
//! - **Retain(n)** - keep `n` items
//! - **Replace** - remove the literal items `remove`, insert `insert`
//! - **ReplaceWithMetadata** - a replace that also rewrites the metadata slots
//!   it would otherwise drop
//! - **RetainMetadata(n)** / **ReplaceMetadata** - the same, inside the
//!   metadata slot at the current offset
//! - **Attribute** - change one attribute of the element at the cursor
//! - **Annotate** - start or stop setting/clearing an annotation on the
//!   content retained in between
//!
//! ```text
//! document   <p>  a  b  c  </p>
//! ops        Retain(2) Replace{[b] -> [x y]} Retain(2)
//! result     <p>  a  x  y  c  </p>
//! ```
//!
//! Replaces store what they remove, so every transaction can be reversed
//! without looking at the document again. Transactions are built from a
//! [`Document`] snapshot by the `Transaction::from_*` builders and applied by
//! [`crate::process`].
//!
//! # Offset translation
//!
//! [`Transaction::translate_offset`] maps an offset in the document before
//! the transaction to the document after it (or back, when `reversed`).
//! Offsets inside a removed span snap to the end of the removal. At the
//! boundary of an insertion, `exclude_insertion` decides whether the offset
//! stays in front of the inserted items or moves past them.

use lindoc_core::{
  Annotation,
  Item,
  MetaItem,
  Range,
  Tendril,
};
use serde::{
  Deserialize,
  Deserializer,
  Serialize,
};
use serde_json::Value;
use thiserror::Error;

use crate::{
  Document,
  metadata::MetadataReplace,
};

pub type Result<T> = std::result::Result<T, TransactionError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransactionError {
  #[error("invalid retain: end {to} is before start {from}")]
  InvalidRetain { from: usize, to: usize },
  #[error("range {from}..{to} does not select anything")]
  InvalidRange { from: usize, to: usize },
  #[error("invalid argument: {0}")]
  InvalidArgument(&'static str),
  #[error("replace at offset {offset} does not start where the transaction ends ({covered})")]
  ReplaceOutOfOrder { offset: usize, covered: usize },
  #[error("offset {offset} is not an element")]
  NotAnElement { offset: usize },
  #[error("offset {offset} is a closing element")]
  ClosingElement { offset: usize },
  #[error("no metadata at offset {offset}")]
  EmptyMetadata { offset: usize },
  #[error("range {from}..{to} is out of bounds for length {len}")]
  RangeOutOfBounds { from: usize, to: usize, len: usize },
  #[error("metadata index {index} is out of bounds for slot {offset} of length {len}")]
  MetadataIndexOutOfBounds {
    offset: usize,
    index:  usize,
    len:    usize,
  },
  #[error("expected {expected} at offset {offset}, found {found:?}")]
  MismatchedUnwrap {
    offset:   usize,
    expected: Tendril,
    found:    Option<Tendril>,
  },
  #[error("offset {offset} is out of bounds for length {len}")]
  OffsetOutOfBounds { offset: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationMethod {
  Set,
  Clear,
}

impl AnnotationMethod {
  #[must_use]
  pub fn flip(self) -> Self {
    match self {
      Self::Set => Self::Clear,
      Self::Clear => Self::Set,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationBias {
  Start,
  Stop,
}

/// Operation kinds, with both replace variants counted as [`Replace`].
///
/// [`Replace`]: OperationKind::Replace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
  Retain,
  Replace,
  RetainMetadata,
  ReplaceMetadata,
  Attribute,
  Annotate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
  Retain(usize),
  Replace {
    remove: Vec<Item>,
    insert: Vec<Item>,
  },
  ReplaceWithMetadata {
    remove:   Vec<Item>,
    insert:   Vec<Item>,
    metadata: MetadataReplace,
  },
  RetainMetadata(usize),
  ReplaceMetadata {
    remove: Vec<MetaItem>,
    insert: Vec<MetaItem>,
  },
  /// `None` means the attribute is absent.
  Attribute {
    key:  Tendril,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    from: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    to:   Option<Value>,
  },
  Annotate {
    method:     AnnotationMethod,
    bias:       AnnotationBias,
    annotation: Annotation,
  },
}

/// Keeps an explicit `null` distinct from a missing attribute value.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Value>, D::Error> {
  Value::deserialize(deserializer).map(Some)
}

impl Operation {
  pub fn kind(&self) -> OperationKind {
    match self {
      Operation::Retain(_) => OperationKind::Retain,
      Operation::Replace { .. } | Operation::ReplaceWithMetadata { .. } => OperationKind::Replace,
      Operation::RetainMetadata(_) => OperationKind::RetainMetadata,
      Operation::ReplaceMetadata { .. } => OperationKind::ReplaceMetadata,
      Operation::Attribute { .. } => OperationKind::Attribute,
      Operation::Annotate { .. } => OperationKind::Annotate,
    }
  }

  /// `(remove, insert)` lengths of a replace.
  pub fn replace_lengths(&self) -> Option<(usize, usize)> {
    match self {
      Operation::Replace { remove, insert } | Operation::ReplaceWithMetadata { remove, insert, .. } => {
        Some((remove.len(), insert.len()))
      },
      _ => None,
    }
  }

  /// The operation that undoes this one.
  #[must_use]
  pub fn reversed(&self) -> Self {
    match self {
      Operation::Retain(length) => Operation::Retain(*length),
      Operation::RetainMetadata(length) => Operation::RetainMetadata(*length),
      Operation::Replace { remove, insert } => Operation::Replace {
        remove: insert.clone(),
        insert: remove.clone(),
      },
      Operation::ReplaceWithMetadata {
        remove,
        insert,
        metadata,
      } => Operation::ReplaceWithMetadata {
        remove:   insert.clone(),
        insert:   remove.clone(),
        metadata: metadata.reversed(),
      },
      Operation::ReplaceMetadata { remove, insert } => Operation::ReplaceMetadata {
        remove: insert.clone(),
        insert: remove.clone(),
      },
      Operation::Attribute { key, from, to } => Operation::Attribute {
        key:  key.clone(),
        from: to.clone(),
        to:   from.clone(),
      },
      Operation::Annotate {
        method,
        bias,
        annotation,
      } => Operation::Annotate {
        method:     method.flip(),
        bias:       *bias,
        annotation: annotation.clone(),
      },
    }
  }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
  operations:        Vec<Operation>,
  /// Net change in document length.
  length_difference: isize,
  #[serde(default)]
  applied:           bool,
}

impl Transaction {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn operations(&self) -> &[Operation] {
    &self.operations
  }

  pub fn length_difference(&self) -> isize {
    self.length_difference
  }

  pub fn has_been_applied(&self) -> bool {
    self.applied
  }

  /// Flip the applied flag. Only the processor should call this.
  pub fn toggle_applied(&mut self) {
    self.applied = !self.applied;
  }

  /// Whether the transaction changes nothing: no operations, or a single
  /// retain.
  pub fn is_no_op(&self) -> bool {
    match self.operations.as_slice() {
      [] => true,
      [op] => op.kind() == OperationKind::Retain,
      _ => false,
    }
  }

  pub fn has_operation_with_type(&self, kind: OperationKind) -> bool {
    self.operations.iter().any(|op| op.kind() == kind)
  }

  pub fn has_content_data_operations(&self) -> bool {
    self.has_operation_with_type(OperationKind::Replace)
  }

  pub fn has_element_attribute_operations(&self) -> bool {
    self.has_operation_with_type(OperationKind::Attribute)
  }

  pub fn has_annotation_operations(&self) -> bool {
    self.has_operation_with_type(OperationKind::Annotate)
  }

  /// Document length the transaction walks: retains plus removals.
  pub fn covered_length(&self) -> usize {
    self
      .operations
      .iter()
      .map(|op| {
        match op {
          Operation::Retain(length) => *length,
          op => op.replace_lengths().map_or(0, |(remove, _)| remove),
        }
      })
      .sum()
  }

  // Builder operations: retain/replace/attribute/annotate.
  //

  pub fn push_retain(&mut self, length: usize) {
    if length == 0 {
      return;
    }
    if let Some(Operation::Retain(count)) = self.operations.last_mut() {
      *count += length;
    } else {
      self.operations.push(Operation::Retain(length));
    }
  }

  /// Retain from offset `from` up to `to`.
  pub fn retain_between(&mut self, from: usize, to: usize) -> Result<()> {
    if to < from {
      return Err(TransactionError::InvalidRetain { from, to });
    }
    self.push_retain(to - from);
    Ok(())
  }

  pub fn push_retain_metadata(&mut self, length: usize) {
    if length == 0 {
      return;
    }
    if let Some(Operation::RetainMetadata(count)) = self.operations.last_mut() {
      *count += length;
    } else {
      self.operations.push(Operation::RetainMetadata(length));
    }
  }

  /// Retain metadata from index `from` up to `to` of the current slot.
  pub fn retain_metadata_between(&mut self, from: usize, to: usize) -> Result<()> {
    if to < from {
      return Err(TransactionError::InvalidRetain { from, to });
    }
    self.push_retain_metadata(to - from);
    Ok(())
  }

  /// Replace `remove_len` items at `offset` with `insert`.
  ///
  /// `offset` must be where the operations pushed so far end. A replace
  /// directly following another replace is merged into it, and the metadata
  /// carried by the combined span is recomputed from `doc`.
  pub fn push_replace(
    &mut self,
    doc: &Document,
    offset: usize,
    remove_len: usize,
    insert: Vec<Item>,
  ) -> Result<()> {
    if remove_len == 0 && insert.is_empty() {
      return Ok(());
    }
    let len = doc.len();
    let removed = doc
      .data()
      .slice(Range::new(offset, offset + remove_len))
      .ok_or(TransactionError::RangeOutOfBounds {
        from: offset,
        to: offset + remove_len,
        len,
      })?;
    let covered = self.covered_length();
    if offset != covered {
      return Err(TransactionError::ReplaceOutOfOrder { offset, covered });
    }
    self.length_difference += insert.len() as isize - remove_len as isize;

    let mut start = offset;
    let mut remove = Vec::with_capacity(remove_len);
    let mut insert = insert;
    if let Some((prev_remove, prev_insert)) = self.pop_trailing_replace() {
      start -= prev_remove.len();
      remove = prev_remove;
      insert.splice(0..0, prev_insert);
    }
    remove.extend_from_slice(removed);

    let op = match doc.metadata_replace(start, remove.len(), insert.len()) {
      Some(metadata) => {
        Operation::ReplaceWithMetadata {
          remove,
          insert,
          metadata,
        }
      },
      None => Operation::Replace { remove, insert },
    };
    self.operations.push(op);
    Ok(())
  }

  fn pop_trailing_replace(&mut self) -> Option<(Vec<Item>, Vec<Item>)> {
    match self.operations.pop()? {
      Operation::Replace { remove, insert } | Operation::ReplaceWithMetadata { remove, insert, .. } => {
        Some((remove, insert))
      },
      op => {
        self.operations.push(op);
        None
      },
    }
  }

  pub fn push_replace_metadata(&mut self, remove: Vec<MetaItem>, insert: Vec<MetaItem>) {
    if remove.is_empty() && insert.is_empty() {
      return;
    }
    self
      .operations
      .push(Operation::ReplaceMetadata { remove, insert });
  }

  pub fn push_replace_element_attribute(
    &mut self,
    key: impl Into<Tendril>,
    from: Option<Value>,
    to: Option<Value>,
  ) {
    self.operations.push(Operation::Attribute {
      key: key.into(),
      from,
      to,
    });
  }

  pub fn push_start_annotating(&mut self, method: AnnotationMethod, annotation: Annotation) {
    self.operations.push(Operation::Annotate {
      method,
      bias: AnnotationBias::Start,
      annotation,
    });
  }

  pub fn push_stop_annotating(&mut self, method: AnnotationMethod, annotation: Annotation) {
    self.operations.push(Operation::Annotate {
      method,
      bias: AnnotationBias::Stop,
      annotation,
    });
  }

  /// Remove `[start, end)` without tearing internal nodes.
  ///
  /// Internal subtrees met inside the span are retained whole and the
  /// removal is split around them. When the span starts or ends inside an
  /// internal node, the part of the span inside that node is retained too.
  pub fn add_safe_remove_ops(&mut self, doc: &Document, start: usize, end: usize) -> Result<()> {
    let len = doc.len();
    if start > end || end > len {
      return Err(TransactionError::RangeOutOfBounds {
        from: start,
        to: end,
        len,
      });
    }
    let data = doc.data();
    let types = doc.node_types();

    let mut depth = 0usize;
    let mut remove_from = start;
    let mut retain_from = start;
    for offset in start..end {
      let Some(item) = data.get(offset) else {
        continue;
      };
      let Some(ty) = item.element_type() else {
        continue;
      };
      if !types.is_internal(ty) {
        continue;
      }
      if item.is_open() {
        if depth == 0 {
          tracing::trace!(offset, %ty, "splitting removal around internal node");
          self.push_replace(doc, remove_from, offset - remove_from, Vec::new())?;
          retain_from = offset;
        }
        depth += 1;
      } else if depth > 0 {
        depth -= 1;
        if depth == 0 {
          self.push_retain(offset + 1 - retain_from);
          remove_from = offset + 1;
        }
      } else {
        tracing::trace!(offset, %ty, "removal starts inside internal node");
        self.push_retain(offset + 1 - remove_from);
        remove_from = offset + 1;
      }
    }
    if depth > 0 {
      self.push_retain(end - retain_from);
    } else {
      self.push_replace(doc, remove_from, end - remove_from, Vec::new())?;
    }
    Ok(())
  }

  // Translation.
  //

  /// Map `offset` through the transaction.
  ///
  /// With `reversed`, map an offset in the resulting document back to the
  /// original. `exclude_insertion` keeps an offset at the end of a replace in
  /// front of the inserted items instead of after them.
  pub fn translate_offset(&self, offset: usize, reversed: bool, exclude_insertion: bool) -> usize {
    let shift = |pos: usize, by: isize| pos.saturating_add_signed(by);

    let mut cursor = 0usize;
    let mut adjustment = 0isize;
    for op in &self.operations {
      if let Operation::Retain(length) = op {
        if offset >= cursor && offset < cursor + length {
          return shift(offset, adjustment);
        }
        cursor += length;
        continue;
      }
      let Some((remove_len, insert_len)) = op.replace_lengths() else {
        continue;
      };
      let (remove_len, insert_len) = if reversed {
        (insert_len, remove_len)
      } else {
        (remove_len, insert_len)
      };
      let grow = insert_len as isize - remove_len as isize;
      let prev_adjustment = adjustment;
      adjustment += grow;
      if offset == cursor + remove_len {
        // Past the removal; before or after the insertion.
        if exclude_insertion && grow > 0 {
          return shift(offset, adjustment - grow);
        }
        return shift(offset, adjustment);
      } else if offset == cursor {
        // At the start of a replace that removes something.
        if insert_len == 0 {
          return shift(cursor + remove_len, adjustment);
        }
        return shift(offset, prev_adjustment);
      } else if offset > cursor && offset < cursor + remove_len {
        // Inside the removal.
        return shift(cursor + remove_len, adjustment);
      }
      cursor += remove_len;
    }
    shift(offset, adjustment)
  }

  /// Map both ends of `range`, keeping its direction. The start stays in
  /// front of an insertion at its boundary and the end moves past one, so
  /// text inserted at either edge ends up inside the range.
  pub fn translate_range(&self, range: Range, reversed: bool) -> Range {
    let from = self.translate_offset(range.from(), reversed, true);
    let to = self.translate_offset(range.to(), reversed, false);
    if range.is_backwards() {
      Range::new(to, from)
    } else {
      Range::new(from, to)
    }
  }

  /// The transaction that undoes this one, not yet applied.
  #[must_use]
  pub fn reversed(&self) -> Self {
    Self {
      operations:        self.operations.iter().map(Operation::reversed).collect(),
      length_difference: -self.length_difference,
      applied:           false,
    }
  }
}

#[cfg(test)]
mod tests {
  use lindoc_core::{
    MetaSlot,
    OpenElement,
  };

  use super::*;

  fn paragraph(text: &str) -> Vec<Item> {
    let mut items = vec![Item::open("paragraph")];
    items.extend(Item::text(text));
    items.push(Item::close("paragraph"));
    items
  }

  fn text(text: &str) -> Vec<Item> {
    Item::text(text).collect()
  }

  #[test]
  fn retains_merge() {
    let mut tx = Transaction::new();
    tx.push_retain(0);
    assert!(tx.is_no_op());
    tx.push_retain(2);
    tx.push_retain(3);
    assert_eq!(tx.operations(), &[Operation::Retain(5)]);
    assert!(tx.is_no_op());

    tx.push_retain_metadata(1);
    tx.push_retain_metadata(1);
    tx.push_retain(1);
    assert_eq!(tx.operations(), &[
      Operation::Retain(5),
      Operation::RetainMetadata(2),
      Operation::Retain(1),
    ]);
    assert!(!tx.is_no_op());
    assert_eq!(tx.covered_length(), 6);
  }

  #[test]
  fn backwards_retain_is_an_error() {
    let mut tx = Transaction::new();
    assert_eq!(
      tx.retain_between(4, 2),
      Err(TransactionError::InvalidRetain { from: 4, to: 2 })
    );
    assert_eq!(
      tx.retain_metadata_between(1, 0),
      Err(TransactionError::InvalidRetain { from: 1, to: 0 })
    );
    tx.retain_between(2, 4).unwrap();
    assert_eq!(tx.operations(), &[Operation::Retain(2)]);
  }

  #[test]
  fn replace_records_removed_data() {
    let doc = Document::new(paragraph("abc")).unwrap();
    let mut tx = Transaction::new();
    tx.push_retain(2);
    tx.push_replace(&doc, 2, 1, text("xy")).unwrap();
    tx.push_retain(2);
    assert_eq!(tx.operations()[1], Operation::Replace {
      remove: text("b"),
      insert: text("xy"),
    });
    assert_eq!(tx.length_difference(), 1);
    assert_eq!(tx.covered_length(), doc.len());
    assert!(tx.has_content_data_operations());
    assert!(!tx.has_annotation_operations());

    tx.push_replace(&doc, 0, 0, Vec::new()).unwrap();
    assert_eq!(tx.operations().len(), 3);
    assert_eq!(
      tx.push_replace(&doc, 4, 2, Vec::new()),
      Err(TransactionError::RangeOutOfBounds {
        from: 4,
        to:   6,
        len:  5,
      })
    );
  }

  #[test]
  fn adjacent_replaces_merge() {
    let doc = Document::new(paragraph("abc")).unwrap();
    let mut tx = Transaction::new();
    tx.push_retain(1);
    tx.push_replace(&doc, 1, 1, text("x")).unwrap();
    tx.push_replace(&doc, 2, 1, Vec::new()).unwrap();
    assert_eq!(tx.operations(), &[
      Operation::Retain(1),
      Operation::Replace {
        remove: text("ab"),
        insert: text("x"),
      },
    ]);
    assert_eq!(tx.length_difference(), -1);
  }

  #[test]
  fn replaces_start_where_the_transaction_ends() {
    let doc = Document::new(paragraph("abc")).unwrap();
    let mut tx = Transaction::new();
    tx.push_retain(1);
    tx.push_replace(&doc, 1, 1, text("x")).unwrap();
    assert_eq!(
      tx.push_replace(&doc, 3, 1, Vec::new()),
      Err(TransactionError::ReplaceOutOfOrder {
        offset:  3,
        covered: 2,
      })
    );
    assert_eq!(
      tx.push_replace(&doc, 1, 1, Vec::new()),
      Err(TransactionError::ReplaceOutOfOrder {
        offset:  1,
        covered: 2,
      })
    );
    assert_eq!(tx.operations().len(), 2);
    assert_eq!(tx.length_difference(), 0);
  }

  #[test]
  fn replace_carries_metadata() {
    let mut slots: Vec<MetaSlot> = vec![Vec::new(); 6];
    slots[2].push(MetaItem::new("comment"));
    let doc = Document::with_metadata(paragraph("abc"), slots).unwrap();

    let mut tx = Transaction::new();
    tx.push_retain(1);
    tx.push_replace(&doc, 1, 2, Vec::new()).unwrap();
    tx.push_retain(2);
    let Operation::ReplaceWithMetadata { metadata, .. } = &tx.operations()[1] else {
      panic!("expected a metadata replace: {:?}", tx.operations());
    };
    assert_eq!(metadata.retain, 0);
    assert_eq!(metadata.remove.len(), 3);
    assert_eq!(metadata.insert, vec![vec![MetaItem::new("comment")]]);
    assert!(tx.has_operation_with_type(OperationKind::Replace));
  }

  #[test]
  fn translate_insertion() {
    let doc = Document::new(paragraph("abc")).unwrap();
    let mut tx = Transaction::new();
    tx.push_retain(2);
    tx.push_replace(&doc, 2, 1, text("xy")).unwrap();
    tx.push_retain(2);

    assert_eq!(tx.translate_offset(1, false, false), 1);
    assert_eq!(tx.translate_offset(2, false, false), 2);
    assert_eq!(tx.translate_offset(3, false, false), 4);
    assert_eq!(tx.translate_offset(3, false, true), 3);
    assert_eq!(tx.translate_offset(4, false, false), 5);
    assert_eq!(tx.translate_offset(5, false, false), 6);

    assert_eq!(tx.translate_offset(4, true, false), 3);
    assert_eq!(tx.translate_offset(6, true, false), 5);
  }

  #[test]
  fn translate_removal() {
    let doc = Document::new(paragraph("abc")).unwrap();
    let mut tx = Transaction::new();
    tx.push_retain(1);
    tx.push_replace(&doc, 1, 2, Vec::new()).unwrap();
    tx.push_retain(2);

    for offset in 1..=3 {
      assert_eq!(tx.translate_offset(offset, false, false), 1);
    }
    assert_eq!(tx.translate_offset(4, false, false), 2);
    assert_eq!(tx.translate_offset(0, false, false), 0);
  }

  #[test]
  fn translate_range_keeps_direction() {
    let doc = Document::new(paragraph("abc")).unwrap();
    let mut tx = Transaction::new();
    tx.push_retain(2);
    tx.push_replace(&doc, 2, 0, text("xy")).unwrap();
    tx.push_retain(3);

    // Insertions at either edge end up inside the range.
    assert_eq!(tx.translate_range(Range::new(2, 4), false), Range::new(2, 6));
    assert_eq!(tx.translate_range(Range::new(1, 2), false), Range::new(1, 4));
    assert_eq!(tx.translate_range(Range::new(2, 1), false), Range::new(4, 1));
  }

  #[test]
  fn reversal() {
    let doc = Document::new(paragraph("abc")).unwrap();
    let bold = Annotation::new("bold");
    let mut tx = Transaction::new();
    tx.push_replace_element_attribute("align", None, Some(Value::from("center")));
    tx.push_retain(1);
    tx.push_start_annotating(AnnotationMethod::Set, bold.clone());
    tx.push_retain(1);
    tx.push_stop_annotating(AnnotationMethod::Set, bold.clone());
    tx.push_replace(&doc, 2, 1, text("xy")).unwrap();
    tx.push_retain(2);
    tx.toggle_applied();

    let reversed = tx.reversed();
    assert!(!reversed.has_been_applied());
    assert_eq!(reversed.length_difference(), -1);
    assert_eq!(reversed.operations()[0], Operation::Attribute {
      key:  "align".into(),
      from: Some(Value::from("center")),
      to:   None,
    });
    assert_eq!(reversed.operations()[2], Operation::Annotate {
      method:     AnnotationMethod::Clear,
      bias:       AnnotationBias::Start,
      annotation: bold,
    });
    assert_eq!(reversed.operations()[5], Operation::Replace {
      remove: text("xy"),
      insert: text("b"),
    });
    let mut twice = reversed.reversed();
    twice.toggle_applied();
    assert_eq!(twice, tx);
  }

  #[test]
  fn serde_round_trip() {
    let doc = Document::new(paragraph("abc")).unwrap();
    let mut tx = Transaction::new();
    tx.push_replace_element_attribute("level", Some(Value::Null), Some(Value::from(2)));
    tx.push_retain(1);
    tx.push_start_annotating(
      AnnotationMethod::Clear,
      Annotation::new("link").with_attribute("href", "https://example.org"),
    );
    tx.push_retain(1);
    tx.push_stop_annotating(
      AnnotationMethod::Clear,
      Annotation::new("link").with_attribute("href", "https://example.org"),
    );
    tx.push_replace(&doc, 2, 1, vec![Item::Open(OpenElement::new("inlineImage"))])
      .unwrap();
    tx.push_replace(&doc, 3, 0, vec![Item::close("inlineImage")])
      .unwrap();
    tx.push_retain_metadata(1);
    tx.push_replace_metadata(Vec::new(), vec![MetaItem::new("comment").with_attribute("text", "hi")]);
    tx.push_retain(2);

    let json = serde_json::to_string(&tx).unwrap();
    let back: Transaction = serde_json::from_str(&json).unwrap();
    assert_eq!(back, tx);

    let Operation::Attribute { from, .. } = &back.operations()[0] else {
      panic!("expected an attribute operation");
    };
    assert_eq!(from, &Some(Value::Null));
  }
}
