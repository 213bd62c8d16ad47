//! Transaction engine for a linear rich-text document model.
//!
//! A [`Document`] is an immutable snapshot of a flat item sequence plus one
//! metadata slot per offset. Edits are described by [`Transaction`]s built
//! from a snapshot by the `Transaction::from_*` builders, applied with
//! [`process::commit`] and undone with [`process::rollback`].

pub mod builder;
pub mod document;
pub mod fixup;
pub mod history;
pub mod linear;
pub mod metadata;
pub mod node;
pub mod process;
pub mod transaction;
pub mod tree;

pub use builder::ReplaceTarget;
pub use document::Document;
pub use lindoc_core::{
  Annotation,
  AnnotationSet,
  Attributes,
  Item,
  MetaItem,
  MetaSlot,
  OpenElement,
  Range,
  Tendril,
};
pub use transaction::{
  Operation,
  Transaction,
  TransactionError,
};
