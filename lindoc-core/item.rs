//! Data items of the linear model.
//!
//! A document is a flat sequence of [`Item`]s. Characters carry the set of
//! annotations applied to them; structure is expressed by matched
//! [`Item::Open`] / [`Item::Close`] pairs:
//!
//! ```text
//! [ Open(paragraph), 'a', 'b', Close(paragraph), Open(heading{level:1}), 'c', Close(heading) ]
//! ```

use std::collections::BTreeMap;

use serde::{
  Deserialize,
  Serialize,
};
use serde_json::Value;

use crate::{
  Tendril,
  annotation::AnnotationSet,
};

/// Element attributes, keyed by name.
pub type Attributes = BTreeMap<Tendril, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenElement {
  pub ty:          Tendril,
  #[serde(default, skip_serializing_if = "Attributes::is_empty")]
  pub attributes:  Attributes,
  /// Only meaningful on inline content nodes.
  #[serde(default, skip_serializing_if = "AnnotationSet::is_empty")]
  pub annotations: AnnotationSet,
}

impl OpenElement {
  pub fn new(ty: impl Into<Tendril>) -> Self {
    Self {
      ty:          ty.into(),
      attributes:  Attributes::new(),
      annotations: AnnotationSet::new(),
    }
  }

  pub fn with_attributes(ty: impl Into<Tendril>, attributes: Attributes) -> Self {
    Self {
      attributes,
      ..Self::new(ty)
    }
  }

  #[must_use]
  pub fn with_attribute(mut self, key: impl Into<Tendril>, value: impl Into<Value>) -> Self {
    self.attributes.insert(key.into(), value.into());
    self
  }

  pub fn attribute(&self, key: &str) -> Option<&Value> {
    self.attributes.get(key)
  }

  /// The token that closes this element.
  pub fn closing(&self) -> Item {
    Item::Close {
      ty: self.ty.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Item {
  Content {
    ch:          char,
    #[serde(default, skip_serializing_if = "AnnotationSet::is_empty")]
    annotations: AnnotationSet,
  },
  Open(OpenElement),
  Close {
    ty: Tendril,
  },
}

impl Item {
  pub fn char(ch: char) -> Self {
    Item::Content {
      ch,
      annotations: AnnotationSet::new(),
    }
  }

  /// One unannotated content item per character of `text`.
  pub fn text(text: &str) -> impl Iterator<Item = Item> + '_ {
    text.chars().map(Item::char)
  }

  pub fn open(ty: impl Into<Tendril>) -> Self {
    Item::Open(OpenElement::new(ty))
  }

  pub fn close(ty: impl Into<Tendril>) -> Self {
    Item::Close { ty: ty.into() }
  }

  #[inline]
  pub fn is_element(&self) -> bool {
    !matches!(self, Item::Content { .. })
  }

  #[inline]
  pub fn is_open(&self) -> bool {
    matches!(self, Item::Open(_))
  }

  #[inline]
  pub fn is_close(&self) -> bool {
    matches!(self, Item::Close { .. })
  }

  /// Type name of an open or close token.
  pub fn element_type(&self) -> Option<&str> {
    match self {
      Item::Content { .. } => None,
      Item::Open(open) => Some(&open.ty),
      Item::Close { ty } => Some(ty),
    }
  }

  pub fn as_open(&self) -> Option<&OpenElement> {
    match self {
      Item::Open(open) => Some(open),
      _ => None,
    }
  }

  pub fn as_char(&self) -> Option<char> {
    match self {
      Item::Content { ch, .. } => Some(*ch),
      _ => None,
    }
  }

  pub fn annotations(&self) -> Option<&AnnotationSet> {
    match self {
      Item::Content { annotations, .. } => Some(annotations),
      Item::Open(open) => Some(&open.annotations),
      Item::Close { .. } => None,
    }
  }

  pub fn annotations_mut(&mut self) -> Option<&mut AnnotationSet> {
    match self {
      Item::Content { annotations, .. } => Some(annotations),
      Item::Open(open) => Some(&mut open.annotations),
      Item::Close { .. } => None,
    }
  }
}

impl From<char> for Item {
  fn from(ch: char) -> Self {
    Item::char(ch)
  }
}

impl From<OpenElement> for Item {
  fn from(open: OpenElement) -> Self {
    Item::Open(open)
  }
}
