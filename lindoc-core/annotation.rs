//! Text annotations (bold, links, language spans, ...).
//!
//! Annotations compare by content: two annotations are equal when their names
//! and attribute maps are equal, regardless of where they came from.

use serde::{
  Deserialize,
  Serialize,
};
use serde_json::Value;
use smallvec::SmallVec;

use crate::{
  Tendril,
  item::Attributes,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
  pub name:       Tendril,
  #[serde(default, skip_serializing_if = "Attributes::is_empty")]
  pub attributes: Attributes,
}

impl Annotation {
  pub fn new(name: impl Into<Tendril>) -> Self {
    Self {
      name:       name.into(),
      attributes: Attributes::new(),
    }
  }

  #[must_use]
  pub fn with_attribute(mut self, key: impl Into<Tendril>, value: impl Into<Value>) -> Self {
    self.attributes.insert(key.into(), value.into());
    self
  }
}

/// Ordered, duplicate-free set of annotations applied to one item.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationSet(SmallVec<[Annotation; 2]>);

impl AnnotationSet {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
    self.0.iter()
  }

  pub fn contains(&self, annotation: &Annotation) -> bool {
    self.0.iter().any(|a| a == annotation)
  }

  pub fn contains_all(&self, other: &AnnotationSet) -> bool {
    other.iter().all(|a| self.contains(a))
  }

  /// Add `annotation` at the end unless it is already present.
  pub fn push(&mut self, annotation: Annotation) -> bool {
    if self.contains(&annotation) {
      return false;
    }
    self.0.push(annotation);
    true
  }

  /// Remove `annotation`, returning whether it was present.
  pub fn remove(&mut self, annotation: &Annotation) -> bool {
    match self.0.iter().position(|a| a == annotation) {
      Some(index) => {
        self.0.remove(index);
        true
      },
      None => false,
    }
  }

  /// Annotations present in both sets, in this set's order.
  #[must_use]
  pub fn intersection(&self, other: &AnnotationSet) -> Self {
    self.iter().filter(|a| other.contains(a)).cloned().collect()
  }
}

impl FromIterator<Annotation> for AnnotationSet {
  fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
    let mut set = Self::new();
    for annotation in iter {
      set.push(annotation);
    }
    set
  }
}

impl<'a> IntoIterator for &'a AnnotationSet {
  type IntoIter = std::slice::Iter<'a, Annotation>;
  type Item = &'a Annotation;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}
