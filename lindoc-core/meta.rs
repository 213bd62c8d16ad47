//! Out-of-band metadata elements.
//!
//! Metadata (category links, page properties, comments) does not render and
//! does not occupy linear offsets. Instead each offset owns a slot of zero or
//! more [`MetaItem`]s sitting immediately before the item at that offset.

use serde::{
  Deserialize,
  Serialize,
};
use serde_json::Value;

use crate::{
  Tendril,
  item::Attributes,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaItem {
  pub ty:         Tendril,
  #[serde(default, skip_serializing_if = "Attributes::is_empty")]
  pub attributes: Attributes,
}

impl MetaItem {
  pub fn new(ty: impl Into<Tendril>) -> Self {
    Self {
      ty:         ty.into(),
      attributes: Attributes::new(),
    }
  }

  #[must_use]
  pub fn with_attribute(mut self, key: impl Into<Tendril>, value: impl Into<Value>) -> Self {
    self.attributes.insert(key.into(), value.into());
    self
  }
}

/// Metadata attached to a single linear offset.
pub type MetaSlot = Vec<MetaItem>;
