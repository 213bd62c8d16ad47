//! Transaction builders.
//!
//! Each builder inspects a [`Document`] snapshot and an edit intent and
//! returns one transaction that walks the whole document. Builders never
//! mutate the document, and a builder that fails returns no transaction.

use lindoc_core::{
  Annotation,
  Attributes,
  Item,
  MetaItem,
  OpenElement,
  Range,
  Tendril,
};
use serde_json::Value;

use crate::{
  Document,
  node::NodeTypes,
  transaction::{
    AnnotationMethod,
    Result,
    Transaction,
    TransactionError,
  },
  tree::{
    NodeId,
    SelectMode,
  },
};

/// What [`Transaction::from_node_replacement`] replaces: the content of a
/// node, or an arbitrary range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceTarget {
  Node(NodeId),
  Range(Range),
}

impl From<NodeId> for ReplaceTarget {
  fn from(node: NodeId) -> Self {
    ReplaceTarget::Node(node)
  }
}

impl From<Range> for ReplaceTarget {
  fn from(range: Range) -> Self {
    ReplaceTarget::Range(range)
  }
}

fn check_range(doc: &Document, range: Range) -> Result<Range> {
  let range = range.normalized();
  if range.to() > doc.len() {
    return Err(TransactionError::RangeOutOfBounds {
      from: range.from(),
      to:   range.to(),
      len:  doc.len(),
    });
  }
  Ok(range)
}

fn check_offset(doc: &Document, offset: usize) -> Result<()> {
  if offset > doc.len() {
    return Err(TransactionError::OffsetOutOfBounds {
      offset,
      len: doc.len(),
    });
  }
  Ok(())
}

fn closings(openings: &[OpenElement]) -> Vec<Item> {
  openings.iter().rev().map(OpenElement::closing).collect()
}

fn openings(openings: &[OpenElement]) -> Vec<Item> {
  openings.iter().cloned().map(Item::Open).collect()
}

/// Check that `expected` opens in order at `offset`.
fn verify_opens(doc: &Document, offset: usize, expected: &[OpenElement]) -> Result<()> {
  for (i, open) in expected.iter().enumerate() {
    let item = doc.data().get(offset + i);
    if !item
      .and_then(Item::as_open)
      .is_some_and(|found| found.ty == open.ty)
    {
      return Err(mismatch(offset + i, &open.ty, item));
    }
  }
  Ok(())
}

/// Check that `expected` closes, innermost first, at `offset`.
fn verify_closes(doc: &Document, offset: usize, expected: &[OpenElement]) -> Result<()> {
  for (i, open) in expected.iter().rev().enumerate() {
    let item = doc.data().get(offset + i);
    let matches = matches!(item, Some(Item::Close { ty }) if *ty == open.ty);
    if !matches {
      return Err(mismatch(offset + i, &open.ty, item));
    }
  }
  Ok(())
}

/// Every element opened in `[start, end)` closes inside it and nothing
/// closes that opened before it.
fn verify_balanced(doc: &Document, start: usize, end: usize, expected: &Tendril) -> Result<()> {
  let mut depth = 0usize;
  for offset in start..end {
    match doc.data().get(offset) {
      Some(Item::Open(_)) => depth += 1,
      Some(Item::Close { .. }) if depth == 0 => {
        return Err(mismatch(offset, expected, doc.data().get(offset)));
      },
      Some(Item::Close { .. }) => depth -= 1,
      _ => {},
    }
  }
  if depth != 0 {
    return Err(mismatch(end, expected, doc.data().get(end)));
  }
  Ok(())
}

fn mismatch(offset: usize, expected: &Tendril, found: Option<&Item>) -> TransactionError {
  TransactionError::MismatchedUnwrap {
    offset,
    expected: expected.clone(),
    found: found.and_then(Item::element_type).map(Tendril::from),
  }
}

impl Transaction {
  fn built(self, builder: &'static str) -> Self {
    tracing::debug!(
      builder,
      ops = self.operations().len(),
      length_difference = self.length_difference(),
      "built transaction"
    );
    self
  }

  /// Insert `data` at `offset`, fixed up so the document stays balanced.
  pub fn from_insertion(doc: &Document, offset: usize, data: Vec<Item>) -> Result<Self> {
    let insertion = doc.fixup_insertion(data, offset)?;
    let mut tx = Transaction::new();
    tx.push_retain(insertion.offset);
    tx.push_replace(doc, insertion.offset, insertion.remove, insertion.data)?;
    tx.push_retain(doc.len() - insertion.offset - insertion.remove);
    Ok(tx.built("insertion"))
  }

  /// Remove `range`.
  ///
  /// When the first and last selected nodes can be merged, everything
  /// between their selected parts goes in one removal, joining them.
  /// Otherwise covered nodes are removed whole and partially covered ones
  /// are stripped of the covered part, with touching removals coalesced.
  pub fn from_removal(doc: &Document, range: Range) -> Result<Self> {
    let range = check_range(doc, range)?;
    let len = doc.len();
    let mut tx = Transaction::new();
    if range.is_collapsed() {
      tx.push_retain(len);
      return Ok(tx.built("removal"));
    }

    let selection = doc.select_nodes(range, SelectMode::Covered);
    let (Some(first), Some(last)) = (selection.first(), selection.last()) else {
      return Err(TransactionError::InvalidRange {
        from: range.from(),
        to:   range.to(),
      });
    };

    if doc.tree().can_be_merged(first.node, last.node) {
      let (start, end) = if first.range.is_none() && last.range.is_none() {
        (first.node_outer_range.from(), last.node_outer_range.to())
      } else {
        (
          first.range.unwrap_or(first.node_range).from(),
          last.range.unwrap_or(last.node_range).to(),
        )
      };
      tracing::trace!(start, end, "merging removal");
      tx.push_retain(start);
      tx.add_safe_remove_ops(doc, start, end)?;
      tx.push_retain(len - end);
      return Ok(tx.built("removal"));
    }

    let mut offset = 0;
    let mut pending: Option<Range> = None;
    for selected in &selection {
      let span = selected.range.unwrap_or(selected.node_outer_range);
      pending = match pending {
        None => Some(span),
        Some(removal) if removal.to() == span.from() => Some(Range::new(removal.from(), span.to())),
        Some(removal) => {
          tx.retain_between(offset, removal.from())?;
          tx.add_safe_remove_ops(doc, removal.from(), removal.to())?;
          offset = removal.to();
          Some(span)
        },
      };
    }
    if let Some(removal) = pending {
      tx.retain_between(offset, removal.from())?;
      tx.add_safe_remove_ops(doc, removal.from(), removal.to())?;
      offset = removal.to();
    }
    tx.retain_between(offset, len)?;
    Ok(tx.built("removal"))
  }

  /// Replace the content of a node, or a range, with `data`.
  pub fn from_node_replacement(
    doc: &Document,
    target: impl Into<ReplaceTarget>,
    data: Vec<Item>,
  ) -> Result<Self> {
    let range = match target.into() {
      ReplaceTarget::Range(range) => range,
      ReplaceTarget::Node(id) => {
        doc
          .node(id)
          .ok_or(TransactionError::InvalidArgument(
            "node does not belong to this document snapshot",
          ))?
          .range()
      },
    };
    let range = check_range(doc, range)?;
    let mut tx = Transaction::new();
    tx.push_retain(range.from());
    tx.push_replace(doc, range.from(), range.len(), data)?;
    tx.push_retain(doc.len() - range.to());
    Ok(tx.built("node replacement"))
  }

  /// Change attributes of the element opening at `offset`. A `None` value
  /// removes the attribute; keys whose value would not change are skipped.
  pub fn from_attribute_changes<K: Into<Tendril>>(
    doc: &Document,
    offset: usize,
    changes: impl IntoIterator<Item = (K, Option<Value>)>,
  ) -> Result<Self> {
    let open = match doc.data().get(offset) {
      None => {
        return Err(TransactionError::OffsetOutOfBounds {
          offset,
          len: doc.len(),
        });
      },
      Some(Item::Content { .. }) => return Err(TransactionError::NotAnElement { offset }),
      Some(Item::Close { .. }) => return Err(TransactionError::ClosingElement { offset }),
      Some(Item::Open(open)) => open,
    };

    let mut tx = Transaction::new();
    tx.push_retain(offset);
    for (key, to) in changes {
      let key = key.into();
      let from = open.attribute(&key).cloned();
      if from == to {
        continue;
      }
      tx.push_replace_element_attribute(key, from, to);
    }
    tx.push_retain(doc.len() - offset);
    Ok(tx.built("attribute changes"))
  }

  /// Set or clear `annotation` over the content in `range`.
  ///
  /// Content already in the requested state is skipped. Inline content nodes
  /// are annotated as a unit at their opening; structural tokens end the
  /// current annotation run.
  pub fn from_annotation(
    doc: &Document,
    range: Range,
    method: AnnotationMethod,
    annotation: Annotation,
  ) -> Result<Self> {
    let range = check_range(doc, range)?;
    let data = doc.data();
    let types = doc.node_types();
    let mut tx = Transaction::new();

    let mut span = range.from();
    let mut on = false;
    let mut inside_content_node = false;
    for offset in range.from()..range.to() {
      let Some(item) = data.get(offset) else {
        break;
      };
      let structural = item.element_type().is_some_and(|ty| !types.is_content(ty));
      if structural || (inside_content_node && !item.is_close()) {
        if on {
          tx.push_retain(span);
          tx.push_stop_annotating(method, annotation.clone());
          span = 0;
          on = false;
        }
      } else if !item.is_close() && !inside_content_node {
        if item.is_open() {
          inside_content_node = true;
        }
        let covered = data
          .annotations_at(offset)
          .is_some_and(|set| set.contains(&annotation));
        let done = match method {
          AnnotationMethod::Set => covered,
          AnnotationMethod::Clear => !covered,
        };
        if done {
          if on {
            tx.push_retain(span);
            tx.push_stop_annotating(method, annotation.clone());
            span = 0;
            on = false;
          }
        } else if !on {
          tracing::trace!(offset, name = %annotation.name, "starting annotation run");
          tx.push_retain(span);
          tx.push_start_annotating(method, annotation.clone());
          span = 0;
          on = true;
        }
      } else if item.is_close() {
        inside_content_node = false;
      }
      span += 1;
    }
    tx.push_retain(span);
    if on {
      tx.push_stop_annotating(method, annotation);
    }
    tx.push_retain(doc.len() - range.to());
    Ok(tx.built("annotation"))
  }

  /// Insert `items` into the metadata slot at `offset`, before `index`.
  pub fn from_metadata_insertion(
    doc: &Document,
    offset: usize,
    index: usize,
    items: Vec<MetaItem>,
  ) -> Result<Self> {
    check_offset(doc, offset)?;
    let slot_len = doc.metadata().slot(offset).map_or(0, Vec::len);
    let mut tx = Transaction::new();
    tx.push_retain(offset);
    tx.push_retain_metadata(index);
    tx.push_replace_metadata(Vec::new(), items);
    tx.retain_metadata_between(index, slot_len)?;
    tx.push_retain(doc.len() - offset);
    Ok(tx.built("metadata insertion"))
  }

  /// Remove the metadata items in `range` of the slot at `offset`.
  pub fn from_metadata_removal(doc: &Document, offset: usize, range: Range) -> Result<Self> {
    check_offset(doc, offset)?;
    let slot = doc.metadata().slot(offset).map_or(&[][..], Vec::as_slice);
    if slot.is_empty() {
      return Err(TransactionError::EmptyMetadata { offset });
    }
    let range = range.normalized();
    let Some(removed) = slot.get(range.from()..range.to()) else {
      return Err(TransactionError::RangeOutOfBounds {
        from: range.from(),
        to:   range.to(),
        len:  slot.len(),
      });
    };

    let mut tx = Transaction::new();
    tx.push_retain(offset);
    tx.push_retain_metadata(range.from());
    tx.push_replace_metadata(removed.to_vec(), Vec::new());
    tx.push_retain_metadata(slot.len() - range.to());
    tx.push_retain(doc.len() - offset);
    Ok(tx.built("metadata removal"))
  }

  /// Replace the metadata item at `index` of the slot at `offset`.
  pub fn from_metadata_element_replacement(
    doc: &Document,
    offset: usize,
    index: usize,
    item: MetaItem,
  ) -> Result<Self> {
    check_offset(doc, offset)?;
    let slot = doc.metadata().slot(offset).map_or(&[][..], Vec::as_slice);
    let Some(old) = slot.get(index) else {
      return Err(TransactionError::MetadataIndexOutOfBounds {
        offset,
        index,
        len: slot.len(),
      });
    };

    let mut tx = Transaction::new();
    tx.push_retain(offset);
    tx.push_retain_metadata(index);
    tx.push_replace_metadata(vec![old.clone()], vec![item]);
    tx.push_retain_metadata(slot.len() - index - 1);
    tx.push_retain(doc.len() - offset);
    Ok(tx.built("metadata element replacement"))
  }

  /// Convert every content branch touched by `range` to `ty` with
  /// `attributes`, keeping its content.
  pub fn from_content_branch_conversion(
    doc: &Document,
    range: Range,
    ty: &str,
    attributes: Attributes,
  ) -> Result<Self> {
    let range = check_range(doc, range)?;
    let tree = doc.tree();
    let opening = Item::Open(OpenElement::with_attributes(ty, attributes.clone()));
    let closing = Item::close(ty);

    let mut tx = Transaction::new();
    let mut previous: Option<(NodeId, Range)> = None;
    for selected in doc.select_nodes(range, SelectMode::Leaves) {
      let Some(node) = tree.get(selected.node) else {
        continue;
      };
      let branch_id = if node.is_content() {
        match tree.parent(selected.node) {
          Some(parent) => parent,
          None => continue,
        }
      } else {
        selected.node
      };
      let Some(branch) = tree.get(branch_id) else {
        continue;
      };
      if !branch.can_contain_content() {
        continue;
      }
      let outer = branch.outer_range();
      let current = doc.data().get(outer.from()).and_then(Item::as_open);
      if branch.type_name() == ty && current.is_some_and(|open| open.attributes == attributes) {
        continue;
      }
      if previous.is_some_and(|(id, _)| id == branch_id) {
        continue;
      }
      tracing::trace!(from = branch.type_name(), to = ty, at = outer.from(), "converting branch");
      tx.retain_between(previous.map_or(0, |(_, range)| range.to()), outer.from())?;
      tx.push_replace(doc, outer.from(), 1, vec![opening.clone()])?;
      tx.push_retain(branch.range().len());
      tx.push_replace(doc, outer.to() - 1, 1, vec![closing.clone()])?;
      previous = Some((branch_id, outer));
    }
    tx.retain_between(previous.map_or(0, |(_, range)| range.to()), doc.len())?;
    Ok(tx.built("content branch conversion"))
  }

  /// Re-wrap the content of `range`.
  ///
  /// `unwrap_outer` must be the elements opening directly before `range`
  /// (closing directly after it); they are replaced by `wrap_outer`. Each
  /// top-level element inside `range` must open with `unwrap_each` (and
  /// close with its closings); those are replaced by `wrap_each`. Element
  /// types are checked, attributes are taken from the document. Whether the
  /// resulting nesting is valid is up to the caller.
  ///
  /// ```text
  /// <list><listItem><p>a</p></listItem></list>
  ///   range [1, 8), unwrap_outer [list], unwrap_each [listItem]
  /// <p>a</p>
  /// ```
  pub fn from_wrap(
    doc: &Document,
    range: Range,
    unwrap_outer: &[OpenElement],
    wrap_outer: &[OpenElement],
    unwrap_each: &[OpenElement],
    wrap_each: &[OpenElement],
  ) -> Result<Self> {
    let range = check_range(doc, range)?;
    let (start, end) = (range.from(), range.to());
    let len = doc.len();

    let outer = unwrap_outer.len();
    let Some(outer_start) = start.checked_sub(outer) else {
      return Err(mismatch(0, &unwrap_outer[0].ty, doc.data().get(0)));
    };
    verify_opens(doc, outer_start, unwrap_outer)?;
    verify_closes(doc, end, unwrap_outer)?;
    if let Some(outer) = unwrap_outer.first().or(wrap_outer.first()) {
      verify_balanced(doc, start, end, &outer.ty)?;
    }

    let mut tx = Transaction::new();
    tx.push_retain(outer_start);
    if !wrap_outer.is_empty() || !unwrap_outer.is_empty() {
      tx.push_replace(doc, outer_start, outer, openings(wrap_outer))?;
    }

    if !wrap_each.is_empty() || !unwrap_each.is_empty() {
      let each = unwrap_each.len();
      let mut cursor = start;
      let mut depth = 0usize;
      let mut element_start = start;
      for offset in start..end {
        match doc.data().get(offset) {
          Some(Item::Open(_)) => {
            if depth == 0 {
              verify_opens(doc, offset, unwrap_each)?;
              tx.retain_between(cursor, offset)?;
              tx.push_replace(doc, offset, each, openings(wrap_each))?;
              cursor = offset + each;
              element_start = offset;
            }
            depth += 1;
          },
          Some(Item::Close { .. }) if depth > 0 => {
            depth -= 1;
            if depth == 0 {
              let close_start = offset + 1 - each;
              if close_start < element_start + each {
                return Err(mismatch(offset, &unwrap_each[0].ty, doc.data().get(offset)));
              }
              verify_closes(doc, close_start, unwrap_each)?;
              tx.retain_between(cursor, close_start)?;
              tx.push_replace(doc, close_start, each, closings(wrap_each))?;
              cursor = offset + 1;
            }
          },
          _ => {},
        }
      }
      if depth != 0 {
        let expected = unwrap_each.first().or(wrap_each.first()).map(|open| &open.ty);
        if let Some(expected) = expected {
          return Err(mismatch(end, expected, doc.data().get(end)));
        }
      }
      tx.retain_between(cursor, end)?;
    } else {
      tx.push_retain(end - start);
    }

    if !wrap_outer.is_empty() || !unwrap_outer.is_empty() {
      tx.push_replace(doc, end, outer, closings(wrap_outer))?;
    }
    tx.push_retain(len - end - outer);
    Ok(tx.built("wrap"))
  }
}

#[cfg(test)]
mod tests {
  use lindoc_core::MetaSlot;

  use super::*;
  use crate::transaction::{
    AnnotationBias,
    Operation,
  };

  fn paragraph(text: &str) -> Vec<Item> {
    element("paragraph", Item::text(text).collect())
  }

  fn element(ty: &str, content: Vec<Item>) -> Vec<Item> {
    let mut items = vec![Item::open(ty)];
    items.extend(content);
    items.push(Item::close(ty));
    items
  }

  fn doc(blocks: &[Vec<Item>]) -> Document {
    Document::new(blocks.concat()).unwrap()
  }

  fn text(text: &str) -> Vec<Item> {
    Item::text(text).collect()
  }

  fn replace(remove: Vec<Item>, insert: Vec<Item>) -> Operation {
    Operation::Replace { remove, insert }
  }

  fn heading(level: u64) -> OpenElement {
    OpenElement::new("heading").with_attribute("level", level)
  }

  fn assert_covers(tx: &Transaction, doc: &Document) {
    assert_eq!(tx.covered_length(), doc.len(), "{:?}", tx.operations());
  }

  #[test]
  fn insertion() {
    let doc = doc(&[paragraph("abc")]);
    let tx = Transaction::from_insertion(&doc, 2, text("xy")).unwrap();
    assert_eq!(tx.operations(), &[
      Operation::Retain(2),
      replace(Vec::new(), text("xy")),
      Operation::Retain(3),
    ]);
    assert_eq!(tx.length_difference(), 2);
    assert_covers(&tx, &doc);

    assert!(Transaction::from_insertion(&doc, 2, Vec::new()).unwrap().is_no_op());
    assert!(Transaction::from_insertion(&doc, 9, text("x")).is_err());
  }

  #[test]
  fn insertion_between_blocks_is_wrapped() {
    let doc = doc(&[paragraph("a"), paragraph("b")]);
    let tx = Transaction::from_insertion(&doc, 3, text("x")).unwrap();
    assert_eq!(tx.operations(), &[
      Operation::Retain(3),
      replace(Vec::new(), paragraph("x")),
      Operation::Retain(3),
    ]);
  }

  #[test]
  fn collapsed_removal_is_a_no_op() {
    let doc = doc(&[paragraph("abc")]);
    let tx = Transaction::from_removal(&doc, Range::point(2)).unwrap();
    assert!(tx.is_no_op());
    assert_eq!(tx.operations(), &[Operation::Retain(5)]);
  }

  #[test]
  fn removal_within_text() {
    let doc = doc(&[paragraph("abcd")]);
    let tx = Transaction::from_removal(&doc, Range::new(3, 1)).unwrap();
    assert_eq!(tx.operations(), &[
      Operation::Retain(1),
      replace(text("ab"), Vec::new()),
      Operation::Retain(3),
    ]);
    assert_eq!(tx.length_difference(), -2);
  }

  #[test]
  fn removal_merges_paragraphs() {
    let doc = doc(&[paragraph("ab"), paragraph("cd")]);
    // Removing "b" through "c" joins the two paragraphs.
    let tx = Transaction::from_removal(&doc, Range::new(2, 6)).unwrap();
    let mut removed = text("b");
    removed.extend([Item::close("paragraph"), Item::open("paragraph")]);
    removed.extend(text("c"));
    assert_eq!(tx.operations(), &[
      Operation::Retain(2),
      replace(removed, Vec::new()),
      Operation::Retain(2),
    ]);

    // Only the boundary between them.
    let tx = Transaction::from_removal(&doc, Range::new(3, 5)).unwrap();
    assert_eq!(tx.operations(), &[
      Operation::Retain(3),
      replace(vec![Item::close("paragraph"), Item::open("paragraph")], Vec::new()),
      Operation::Retain(3),
    ]);
  }

  #[test]
  fn removal_of_whole_blocks() {
    let doc = doc(&[paragraph("a"), paragraph("b"), paragraph("c")]);
    let tx = Transaction::from_removal(&doc, Range::new(0, 6)).unwrap();
    assert_eq!(tx.operations(), &[
      replace([paragraph("a"), paragraph("b")].concat(), Vec::new()),
      Operation::Retain(3),
    ]);
  }

  #[test]
  fn removal_with_a_gap() {
    // <p>a</p><heading>b</heading>: the text nodes cannot be merged, so each
    // is stripped separately with the boundary retained in between.
    let doc = doc(&[paragraph("a"), element("heading", text("b"))]);
    let tx = Transaction::from_removal(&doc, Range::new(1, 5)).unwrap();
    assert_eq!(tx.operations(), &[
      Operation::Retain(1),
      replace(text("a"), Vec::new()),
      Operation::Retain(2),
      replace(text("b"), Vec::new()),
      Operation::Retain(1),
    ]);
    assert_covers(&tx, &doc);
  }

  #[test]
  fn removal_keeps_internal_nodes() {
    let internal = element("internalList", element("internalItem", paragraph("r")));
    let doc = doc(&[paragraph("ab"), internal.clone(), paragraph("cd")]);
    let internal_range = Range::new(4, 4 + internal.len());

    let tx = Transaction::from_removal(&doc, Range::new(2, doc.len() - 2)).unwrap();
    assert_covers(&tx, &doc);
    let mut offset = 0;
    for op in tx.operations() {
      match op {
        Operation::Retain(length) => offset += length,
        op => {
          let (remove, _) = op.replace_lengths().unwrap();
          let removed = Range::new(offset, offset + remove);
          assert!(
            removed.to() <= internal_range.from() || removed.from() >= internal_range.to(),
            "{removed:?} tears {internal_range:?}"
          );
          offset += remove;
        },
      }
    }
  }

  #[test]
  fn node_replacement() {
    let doc = doc(&[paragraph("ab"), paragraph("cd")]);
    let second = doc.tree().children(doc.tree().root()).nth(1).unwrap();
    let tx = Transaction::from_node_replacement(&doc, second, text("xyz")).unwrap();
    assert_eq!(tx.operations(), &[
      Operation::Retain(5),
      replace(text("cd"), text("xyz")),
      Operation::Retain(1),
    ]);

    let tx = Transaction::from_node_replacement(&doc, Range::new(0, 4), Vec::new()).unwrap();
    assert_eq!(tx.operations()[0], replace(paragraph("ab"), Vec::new()));

    let mut edited = doc.clone();
    let mut tx = Transaction::from_removal(&edited, Range::new(1, 2)).unwrap();
    crate::process::commit(&mut edited, &mut tx).unwrap();
    assert_eq!(
      Transaction::from_node_replacement(&edited, second, Vec::new()),
      Err(TransactionError::InvalidArgument(
        "node does not belong to this document snapshot"
      ))
    );

    let lookalike = self::doc(&[paragraph("ab"), paragraph("cd")]);
    assert_eq!(lookalike.version(), doc.version());
    assert!(Transaction::from_node_replacement(&lookalike, second, Vec::new()).is_err());
  }

  #[test]
  fn attribute_changes() {
    let mut items = vec![Item::Open(heading(1))];
    items.extend(text("a"));
    items.push(Item::close("heading"));
    let doc = Document::new(items).unwrap();

    let tx = Transaction::from_attribute_changes(&doc, 0, [
      ("level", Some(Value::from(2))),
      ("align", Some(Value::from("center"))),
      ("style", None),
    ])
    .unwrap();
    assert_eq!(tx.operations(), &[
      Operation::Attribute {
        key:  "level".into(),
        from: Some(Value::from(1)),
        to:   Some(Value::from(2)),
      },
      Operation::Attribute {
        key:  "align".into(),
        from: None,
        to:   Some(Value::from("center")),
      },
      Operation::Retain(3),
    ]);
    assert!(tx.has_element_attribute_operations());

    let none = Vec::<(&str, Option<Value>)>::new;
    assert_eq!(
      Transaction::from_attribute_changes(&doc, 1, none()),
      Err(TransactionError::NotAnElement { offset: 1 })
    );
    assert_eq!(
      Transaction::from_attribute_changes(&doc, 2, none()),
      Err(TransactionError::ClosingElement { offset: 2 })
    );
    assert_eq!(
      Transaction::from_attribute_changes(&doc, 3, none()),
      Err(TransactionError::OffsetOutOfBounds { offset: 3, len: 3 })
    );
  }

  #[test]
  fn annotation_of_one_character() {
    let doc = doc(&[paragraph("a"), paragraph("b")]);
    let bold = Annotation::new("bold");
    let tx = Transaction::from_annotation(&doc, Range::new(1, 2), AnnotationMethod::Set, bold.clone())
      .unwrap();
    assert_eq!(tx.operations(), &[
      Operation::Retain(1),
      Operation::Annotate {
        method:     AnnotationMethod::Set,
        bias:       AnnotationBias::Start,
        annotation: bold.clone(),
      },
      Operation::Retain(1),
      Operation::Annotate {
        method:     AnnotationMethod::Set,
        bias:       AnnotationBias::Stop,
        annotation: bold,
      },
      Operation::Retain(4),
    ]);
  }

  #[test]
  fn annotation_runs_break_at_structure_and_skip_covered_content() {
    let bold = Annotation::new("bold");
    let mut first = paragraph("abc");
    if let Some(set) = first[2].annotations_mut() {
      set.push(bold.clone());
    }
    let doc = doc(&[first, paragraph("d")]);
    let tx = Transaction::from_annotation(&doc, Range::new(1, 7), AnnotationMethod::Set, bold.clone())
      .unwrap();
    let shape: Vec<_> = tx
      .operations()
      .iter()
      .map(|op| {
        match op {
          Operation::Retain(n) => format!("r{n}"),
          Operation::Annotate { bias, .. } => format!("{bias:?}"),
          op => format!("{op:?}"),
        }
      })
      .collect();
    // a: run, b: already bold, c: run, </p><p>: break, d: run.
    assert_eq!(shape, [
      "r1", "Start", "r1", "Stop", "r1", "Start", "r1", "Stop", "r2", "Start", "r1", "Stop", "r1",
    ]);
    assert_covers(&tx, &doc);

    // Clearing touches only the bold character.
    let tx = Transaction::from_annotation(&doc, Range::new(1, 7), AnnotationMethod::Clear, bold)
      .unwrap();
    assert_eq!(tx.operations().len(), 5);
    assert_eq!(tx.operations()[0], Operation::Retain(2));
  }

  #[test]
  fn annotation_treats_inline_nodes_as_units() {
    let mut content = text("a");
    content.extend(element("inlineImage", Vec::new()));
    let doc = doc(&[element("paragraph", content)]);
    let link = Annotation::new("link");
    let tx = Transaction::from_annotation(&doc, Range::new(1, 4), AnnotationMethod::Set, link)
      .unwrap();
    // One run over 'a' and the image, closing token included.
    assert_eq!(tx.operations().len(), 5);
    assert_eq!(tx.operations()[2], Operation::Retain(3));
  }

  #[test]
  fn metadata_builders() {
    let mut slots: Vec<MetaSlot> = vec![Vec::new(); 4];
    slots[1] = vec![MetaItem::new("comment"), MetaItem::new("category")];
    let doc = Document::with_metadata(paragraph("a"), slots).unwrap();

    let tx = Transaction::from_metadata_insertion(&doc, 1, 1, vec![MetaItem::new("alien")]).unwrap();
    assert_eq!(tx.operations(), &[
      Operation::Retain(1),
      Operation::RetainMetadata(1),
      Operation::ReplaceMetadata {
        remove: Vec::new(),
        insert: vec![MetaItem::new("alien")],
      },
      Operation::RetainMetadata(1),
      Operation::Retain(2),
    ]);
    assert_eq!(
      Transaction::from_metadata_insertion(&doc, 1, 3, Vec::new()),
      Err(TransactionError::InvalidRetain { from: 3, to: 2 })
    );

    let tx = Transaction::from_metadata_removal(&doc, 1, Range::new(0, 1)).unwrap();
    assert_eq!(tx.operations()[1], Operation::ReplaceMetadata {
      remove: vec![MetaItem::new("comment")],
      insert: Vec::new(),
    });
    assert_eq!(
      Transaction::from_metadata_removal(&doc, 0, Range::new(0, 1)),
      Err(TransactionError::EmptyMetadata { offset: 0 })
    );
    assert_eq!(
      Transaction::from_metadata_removal(&doc, 1, Range::new(1, 3)),
      Err(TransactionError::RangeOutOfBounds {
        from: 1,
        to:   3,
        len:  2,
      })
    );

    let tx = Transaction::from_metadata_element_replacement(&doc, 1, 1, MetaItem::new("alien")).unwrap();
    assert_eq!(tx.operations(), &[
      Operation::Retain(1),
      Operation::RetainMetadata(1),
      Operation::ReplaceMetadata {
        remove: vec![MetaItem::new("category")],
        insert: vec![MetaItem::new("alien")],
      },
      Operation::Retain(2),
    ]);
    assert_eq!(
      Transaction::from_metadata_element_replacement(&doc, 1, 2, MetaItem::new("alien")),
      Err(TransactionError::MetadataIndexOutOfBounds {
        offset: 1,
        index:  2,
        len:    2,
      })
    );
  }

  #[test]
  fn content_branch_conversion() {
    let doc = doc(&[paragraph("ab"), paragraph("c"), element("heading", text("d"))]);
    let mut level = Attributes::new();
    level.insert("level".into(), Value::from(2));
    let tx = Transaction::from_content_branch_conversion(&doc, Range::new(1, 6), "heading", level)
      .unwrap();
    let open = Item::Open(heading(2));
    assert_eq!(tx.operations(), &[
      replace(vec![Item::open("paragraph")], vec![open.clone()]),
      Operation::Retain(2),
      // The boundary between the two branches is one merged replace.
      replace(vec![Item::close("paragraph"), Item::open("paragraph")], vec![
        Item::close("heading"),
        open,
      ]),
      Operation::Retain(1),
      replace(vec![Item::close("paragraph")], vec![Item::close("heading")]),
      Operation::Retain(3),
    ]);
    assert_covers(&tx, &doc);

    // Already the target type with the same attributes.
    let tx = Transaction::from_content_branch_conversion(&doc, Range::new(9, 10), "heading", Attributes::new())
      .unwrap();
    assert!(tx.is_no_op());
  }

  #[test]
  fn wrap_outer() {
    let doc = doc(&[paragraph("abc")]);
    let tx = Transaction::from_wrap(
      &doc,
      Range::new(1, 4),
      &[OpenElement::new("paragraph")],
      &[heading(1)],
      &[],
      &[],
    )
    .unwrap();
    assert_eq!(tx.operations(), &[
      replace(vec![Item::open("paragraph")], vec![Item::Open(heading(1))]),
      Operation::Retain(3),
      replace(vec![Item::close("paragraph")], vec![Item::close("heading")]),
    ]);
    assert_covers(&tx, &doc);
  }

  #[test]
  fn wrap_each() {
    let doc = doc(&[paragraph("abc")]);
    let tx = Transaction::from_wrap(
      &doc,
      Range::new(0, 5),
      &[],
      &[],
      &[OpenElement::new("paragraph")],
      &[heading(1)],
    )
    .unwrap();
    assert_eq!(tx.operations(), &[
      replace(vec![Item::open("paragraph")], vec![Item::Open(heading(1))]),
      Operation::Retain(3),
      replace(vec![Item::close("paragraph")], vec![Item::close("heading")]),
    ]);
  }

  #[test]
  fn unwrap_list() {
    let list = element("list", [element("listItem", paragraph("a")), element("listItem", paragraph("b"))].concat());
    let doc = doc(&[list]);
    let tx = Transaction::from_wrap(
      &doc,
      Range::new(1, doc.len() - 1),
      &[OpenElement::new("list")],
      &[],
      &[OpenElement::new("listItem")],
      &[],
    )
    .unwrap();
    assert_eq!(tx.operations(), &[
      replace(vec![Item::open("list"), Item::open("listItem")], Vec::new()),
      Operation::Retain(3),
      replace(vec![Item::close("listItem"), Item::open("listItem")], Vec::new()),
      Operation::Retain(3),
      replace(vec![Item::close("listItem"), Item::close("list")], Vec::new()),
    ]);
    assert_eq!(tx.length_difference(), -6);
    assert_covers(&tx, &doc);
  }

  #[test]
  fn wrap_pure_retain() {
    let doc = doc(&[paragraph("ab"), paragraph("c")]);
    let tx = Transaction::from_wrap(&doc, Range::new(0, 4), &[], &[], &[], &[]).unwrap();
    assert!(tx.is_no_op());
    assert_covers(&tx, &doc);
  }

  #[test]
  fn wrap_each_inside_a_content_branch_is_a_retain() {
    // Nothing opens at the top level of [1, 4), so there is nothing to unwrap.
    let doc = doc(&[paragraph("abc")]);
    let tx = Transaction::from_wrap(
      &doc,
      Range::new(1, 4),
      &[],
      &[],
      &[OpenElement::new("paragraph")],
      &[heading(1)],
    )
    .unwrap();
    assert!(tx.is_no_op());
    assert_eq!(tx.operations(), &[Operation::Retain(5)]);
  }

  #[test]
  fn wrap_rejects_unbalanced_ranges() {
    let doc = self::doc(&[paragraph("abc")]);
    let err = Transaction::from_wrap(
      &doc,
      Range::new(0, 2),
      &[],
      &[],
      &[OpenElement::new("paragraph")],
      &[heading(1)],
    )
    .unwrap_err();
    assert_eq!(err, TransactionError::MismatchedUnwrap {
      offset:   2,
      expected: "paragraph".into(),
      found:    None,
    });

    let list = |text| element("list", element("listItem", paragraph(text)));
    let doc = self::doc(&[list("a"), list("b")]);
    let err = Transaction::from_wrap(
      &doc,
      Range::new(1, 13),
      &[OpenElement::new("list")],
      &[],
      &[],
      &[],
    )
    .unwrap_err();
    assert!(matches!(err, TransactionError::MismatchedUnwrap { offset: 6, .. }));
  }

  #[test]
  fn wrap_mismatch() {
    let doc = doc(&[paragraph("abc")]);
    let err = Transaction::from_wrap(
      &doc,
      Range::new(1, 4),
      &[OpenElement::new("heading")],
      &[],
      &[],
      &[],
    )
    .unwrap_err();
    assert_eq!(err, TransactionError::MismatchedUnwrap {
      offset:   0,
      expected: "heading".into(),
      found:    Some("paragraph".into()),
    });

    let err = Transaction::from_wrap(
      &doc,
      Range::new(0, 5),
      &[],
      &[],
      &[OpenElement::new("list")],
      &[],
    )
    .unwrap_err();
    assert!(matches!(err, TransactionError::MismatchedUnwrap { offset: 0, .. }));

    // More outer elements than data before the range.
    assert!(
      Transaction::from_wrap(
        &doc,
        Range::new(0, 5),
        &[OpenElement::new("list")],
        &[],
        &[],
        &[]
      )
      .is_err()
    );
  }
}
