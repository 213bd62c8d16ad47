//! Per-offset metadata storage.
//!
//! A document of `n` items owns `n + 1` metadata slots. Slot `k` holds the
//! metadata that sits immediately before item `k`; slot `n` holds trailing
//! metadata after the last item.

use lindoc_core::{
  MetaItem,
  MetaSlot,
};
use serde::{
  Deserialize,
  Serialize,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MetaLinearData {
  slots: Vec<MetaSlot>,
}

/// Slot rewrite attached to a replacement whose removal would otherwise
/// drop metadata on the floor.
///
/// Counted from the replacement's offset, the first `retain` slots stay as
/// they are, `remove` lists the slots that follow (one past the removed
/// items, so the slot after the removal is included) and `insert` is what
/// replaces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataReplace {
  pub retain: usize,
  pub remove: Vec<MetaSlot>,
  pub insert: Vec<MetaSlot>,
}

impl MetadataReplace {
  #[must_use]
  pub fn reversed(&self) -> Self {
    Self {
      retain: self.retain,
      remove: self.insert.clone(),
      insert: self.remove.clone(),
    }
  }
}

impl MetaLinearData {
  pub fn new(slots: Vec<MetaSlot>) -> Self {
    Self { slots }
  }

  /// Empty slots for a document of `data_len` items.
  pub fn empty(data_len: usize) -> Self {
    Self {
      slots: vec![Vec::new(); data_len + 1],
    }
  }

  /// Number of slots, one more than the number of items.
  #[inline]
  pub fn len(&self) -> usize {
    self.slots.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }

  pub fn slots(&self) -> &[MetaSlot] {
    &self.slots
  }

  pub fn slot(&self, offset: usize) -> Option<&MetaSlot> {
    self.slots.get(offset)
  }

  pub fn get(&self, offset: usize, index: usize) -> Option<&MetaItem> {
    self.slot(offset).and_then(|slot| slot.get(index))
  }

  pub fn has_metadata(&self) -> bool {
    self.slots.iter().any(|slot| !slot.is_empty())
  }

  /// Slot rewrite needed when `remove` items at `offset` are replaced by
  /// `insert` items.
  ///
  /// Only a shrinking replacement can drop slots. When any dropped slot is
  /// non-empty, the slots from `offset + insert` through `offset + remove`
  /// collapse into a single slot holding all their metadata in order.
  pub fn replace_carry(&self, offset: usize, remove: usize, insert: usize) -> Option<MetadataReplace> {
    if remove <= insert {
      return None;
    }
    let dropped = self.slots.get(offset + insert..offset + remove)?;
    if dropped.iter().all(Vec::is_empty) {
      return None;
    }
    let removed = self.slots.get(offset + insert..=offset + remove)?.to_vec();
    let merged = removed.iter().flatten().cloned().collect();
    Some(MetadataReplace {
      retain: insert,
      remove: removed,
      insert: vec![merged],
    })
  }

  pub(crate) fn into_slots(self) -> Vec<MetaSlot> {
    self.slots
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn slots(layout: &[&[&str]]) -> MetaLinearData {
    MetaLinearData::new(
      layout
        .iter()
        .map(|slot| slot.iter().map(|ty| MetaItem::new(*ty)).collect())
        .collect(),
    )
  }

  #[test]
  fn growing_or_empty_removals_need_nothing() {
    let meta = slots(&[&[], &["comment"], &[], &[]]);
    assert_eq!(meta.replace_carry(0, 1, 1), None);
    assert_eq!(meta.replace_carry(0, 1, 3), None);
    // Removing item 2 drops slot 2, which is empty.
    assert_eq!(meta.replace_carry(2, 1, 0), None);
  }

  #[test]
  fn dropped_slots_are_merged() {
    let meta = slots(&[&[], &["comment"], &["category"], &["trailing"]]);
    let replace = meta.replace_carry(0, 3, 1).unwrap();
    assert_eq!(replace.retain, 1);
    assert_eq!(replace.remove.len(), 3);
    assert_eq!(
      replace.insert,
      vec![vec![
        MetaItem::new("comment"),
        MetaItem::new("category"),
        MetaItem::new("trailing"),
      ]]
    );
    assert_eq!(replace.reversed().remove, replace.insert);
  }

  #[test]
  fn out_of_bounds_is_none() {
    let meta = slots(&[&["comment"], &[]]);
    assert_eq!(meta.replace_carry(0, 4, 0), None);
  }
}
