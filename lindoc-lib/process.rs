//! Applying transactions to documents.
//!
//! [`commit`] walks a pending transaction over the document and [`rollback`]
//! walks the reversed operations of an applied one. Every operation is checked
//! against the document as it goes: removed items, attribute values and
//! metadata must match what the transaction recorded. The work happens on a
//! copy, so a failed walk leaves the document untouched.

use lindoc_core::{
  Annotation,
  Item,
  MetaSlot,
  Tendril,
};
use thiserror::Error;

use crate::{
  Document,
  linear::LinearData,
  metadata::{
    MetaLinearData,
    MetadataReplace,
  },
  node::NodeTypes,
  transaction::{
    AnnotationBias,
    AnnotationMethod,
    Operation,
    Transaction,
  },
};

pub type Result<T> = std::result::Result<T, ProcessError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProcessError {
  #[error("transaction has already been applied")]
  AlreadyApplied,
  #[error("transaction has not been applied")]
  NotApplied,
  #[error("transaction covers {covered} items but the document has {len}")]
  LengthMismatch { covered: usize, len: usize },
  #[error("removed data does not match the document at offset {offset}")]
  RemoveMismatch { offset: usize },
  #[error("metadata does not match the document at offset {offset}")]
  MetadataMismatch { offset: usize },
  #[error("attribute {key:?} does not match the element at offset {offset}")]
  AttributeMismatch { offset: usize, key: Tendril },
  #[error("no element opens at offset {offset}")]
  NotAnElement { offset: usize },
  #[error("unbalanced annotation {name:?}")]
  UnbalancedAnnotation { name: Tendril },
}

/// Apply a pending transaction and mark it applied.
pub fn commit(doc: &mut Document, tx: &mut Transaction) -> Result<()> {
  if tx.has_been_applied() {
    return Err(ProcessError::AlreadyApplied);
  }
  apply(doc, tx.operations().iter().cloned())?;
  tx.toggle_applied();
  tracing::debug!(
    ops = tx.operations().len(),
    length_difference = tx.length_difference(),
    version = doc.version(),
    "committed transaction"
  );
  Ok(())
}

/// Undo an applied transaction and mark it pending again.
pub fn rollback(doc: &mut Document, tx: &mut Transaction) -> Result<()> {
  if !tx.has_been_applied() {
    return Err(ProcessError::NotApplied);
  }
  apply(doc, tx.operations().iter().map(Operation::reversed))?;
  tx.toggle_applied();
  tracing::debug!(
    ops = tx.operations().len(),
    length_difference = -tx.length_difference(),
    version = doc.version(),
    "rolled back transaction"
  );
  Ok(())
}

fn apply(doc: &mut Document, operations: impl Iterator<Item = Operation>) -> Result<()> {
  let len = doc.len();
  let mut processor = Processor {
    types:       doc.node_types(),
    data:        doc.data().clone().into_items(),
    meta:        doc.metadata().clone().into_slots(),
    offset:      0,
    consumed:    0,
    meta_cursor: 0,
    set:         Vec::new(),
    clear:       Vec::new(),
  };
  for op in operations {
    processor.step(op)?;
  }
  let Processor {
    data,
    meta,
    consumed,
    set,
    clear,
    ..
  } = processor;

  if let Some(annotation) = set.into_iter().chain(clear).next() {
    return Err(ProcessError::UnbalancedAnnotation {
      name: annotation.name,
    });
  }
  if consumed != len {
    return Err(ProcessError::LengthMismatch {
      covered: consumed,
      len,
    });
  }
  doc.replace_contents(LinearData::new(data), MetaLinearData::new(meta));
  Ok(())
}

struct Processor<'a> {
  types:       &'a dyn NodeTypes,
  data:        Vec<Item>,
  meta:        Vec<MetaSlot>,
  /// Position in `data`, which is being rewritten in place.
  offset:      usize,
  /// Items of the original document walked so far.
  consumed:    usize,
  /// Position inside the metadata slot at `offset`.
  meta_cursor: usize,
  set:         Vec<Annotation>,
  clear:       Vec<Annotation>,
}

impl Processor<'_> {
  fn step(&mut self, op: Operation) -> Result<()> {
    match op {
      Operation::Retain(length) => self.retain(length),
      Operation::Replace { remove, insert } => {
        self.replace_data(&remove, insert)?;
        self.meta_cursor = 0;
        Ok(())
      },
      Operation::ReplaceWithMetadata {
        remove,
        insert,
        metadata,
      } => {
        let dropped = metadata.remove.len().checked_sub(metadata.insert.len());
        if dropped != remove.len().checked_sub(insert.len()) {
          return Err(ProcessError::MetadataMismatch {
            offset: self.offset,
          });
        }
        self.replace_metadata_slots(&metadata)?;
        self.splice_data(&remove, insert)?;
        self.meta_cursor = 0;
        Ok(())
      },
      Operation::RetainMetadata(length) => {
        let slot_len = self.meta.get(self.offset).map_or(0, Vec::len);
        if self.meta_cursor + length > slot_len {
          return Err(ProcessError::MetadataMismatch {
            offset: self.offset,
          });
        }
        self.meta_cursor += length;
        Ok(())
      },
      Operation::ReplaceMetadata { remove, insert } => {
        let offset = self.offset;
        let start = self.meta_cursor;
        let Some(slot) = self.meta.get_mut(offset) else {
          return Err(ProcessError::MetadataMismatch { offset });
        };
        if slot.get(start..start + remove.len()) != Some(remove.as_slice()) {
          return Err(ProcessError::MetadataMismatch { offset });
        }
        self.meta_cursor += insert.len();
        slot.splice(start..start + remove.len(), insert);
        Ok(())
      },
      Operation::Attribute { key, from, to } => self.set_attribute(key, from, to),
      Operation::Annotate {
        method,
        bias,
        annotation,
      } => self.annotate(method, bias, annotation),
    }
  }

  fn retain(&mut self, length: usize) -> Result<()> {
    let end = self.offset + length;
    if end > self.data.len() {
      return Err(ProcessError::LengthMismatch {
        covered: self.consumed + length,
        len:     self.consumed + self.data.len() - self.offset,
      });
    }
    if !self.set.is_empty() || !self.clear.is_empty() {
      for item in &mut self.data[self.offset..end] {
        let annotatable = match item {
          Item::Content { .. } => true,
          Item::Open(open) => self.types.is_content(&open.ty),
          Item::Close { .. } => false,
        };
        if !annotatable {
          continue;
        }
        let Some(annotations) = item.annotations_mut() else {
          continue;
        };
        for annotation in &self.set {
          annotations.push(annotation.clone());
        }
        for annotation in &self.clear {
          annotations.remove(annotation);
        }
      }
    }
    self.offset = end;
    self.consumed += length;
    self.meta_cursor = 0;
    Ok(())
  }

  /// Replace items at the cursor, keeping one slot per offset.
  ///
  /// Slots dropped by a shrinking replace are merged into the slot after the
  /// removal; a growing replace gets empty slots in front of it.
  fn replace_data(&mut self, remove: &[Item], insert: Vec<Item>) -> Result<()> {
    let offset = self.offset;
    let (remove_len, insert_len) = (remove.len(), insert.len());
    if offset + remove_len >= self.meta.len() {
      return Err(ProcessError::RemoveMismatch { offset });
    }
    self.splice_data(remove, insert)?;

    if remove_len > insert_len {
      let boundary = offset + remove_len;
      let mut merged: MetaSlot = self.meta[offset + insert_len..boundary]
        .iter()
        .flatten()
        .cloned()
        .collect();
      if !merged.is_empty() {
        tracing::warn!(offset, "merging metadata dropped by a plain replace");
      }
      merged.extend(self.meta[boundary].iter().cloned());
      self
        .meta
        .splice(offset + insert_len..=boundary, [merged]);
    } else if insert_len > remove_len {
      let at = offset + remove_len;
      self
        .meta
        .splice(at..at, std::iter::repeat_n(MetaSlot::new(), insert_len - remove_len));
    }
    Ok(())
  }

  /// Check and splice the data of a replace, advancing the cursor past the
  /// inserted items.
  fn splice_data(&mut self, remove: &[Item], insert: Vec<Item>) -> Result<()> {
    let offset = self.offset;
    if self.data.get(offset..offset + remove.len()) != Some(remove) {
      return Err(ProcessError::RemoveMismatch { offset });
    }
    let insert_len = insert.len();
    self.data.splice(offset..offset + remove.len(), insert);
    self.offset += insert_len;
    self.consumed += remove.len();
    Ok(())
  }

  fn replace_metadata_slots(&mut self, metadata: &MetadataReplace) -> Result<()> {
    let offset = self.offset;
    let start = offset + metadata.retain;
    let end = start + metadata.remove.len();
    if self.meta.get(start..end) != Some(metadata.remove.as_slice()) {
      return Err(ProcessError::MetadataMismatch { offset });
    }
    self.meta.splice(start..end, metadata.insert.iter().cloned());
    Ok(())
  }

  fn set_attribute(
    &mut self,
    key: Tendril,
    from: Option<serde_json::Value>,
    to: Option<serde_json::Value>,
  ) -> Result<()> {
    let offset = self.offset;
    let Some(Item::Open(open)) = self.data.get_mut(offset) else {
      return Err(ProcessError::NotAnElement { offset });
    };
    if open.attributes.get(&key) != from.as_ref() {
      return Err(ProcessError::AttributeMismatch { offset, key });
    }
    match to {
      Some(value) => open.attributes.insert(key, value),
      None => open.attributes.remove(&key),
    };
    Ok(())
  }

  fn annotate(&mut self, method: AnnotationMethod, bias: AnnotationBias, annotation: Annotation) -> Result<()> {
    let active = self.set.contains(&annotation) || self.clear.contains(&annotation);
    let list = match method {
      AnnotationMethod::Set => &mut self.set,
      AnnotationMethod::Clear => &mut self.clear,
    };
    match bias {
      AnnotationBias::Start if !active => list.push(annotation),
      AnnotationBias::Start => {
        return Err(ProcessError::UnbalancedAnnotation {
          name: annotation.name,
        });
      },
      AnnotationBias::Stop => {
        let Some(index) = list.iter().position(|a| *a == annotation) else {
          return Err(ProcessError::UnbalancedAnnotation {
            name: annotation.name,
          });
        };
        list.remove(index);
      },
    }
    Ok(())
  }
}
