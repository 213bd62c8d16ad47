//! Value types shared by the linear document model.
//!
//! Nothing in this crate knows how a document is stored or edited; it only
//! describes the pieces: offsets ([`range`]), the data items of the linear
//! model ([`item`]), text annotations ([`annotation`]) and out-of-band
//! metadata ([`meta`]).

use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod annotation;
pub mod item;
pub mod meta;
pub mod range;

/// Small inline string used for element type names and attribute keys.
pub type Tendril = SmartString<LazyCompact>;

pub use annotation::{
  Annotation,
  AnnotationSet,
};
pub use item::{
  Attributes,
  Item,
  OpenElement,
};
pub use meta::{
  MetaItem,
  MetaSlot,
};
pub use range::Range;
