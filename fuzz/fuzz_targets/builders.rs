#![no_main]

mod common;

use std::mem;

use libfuzzer_sys::fuzz_target;
use lindoc_lib::{
  Item,
  MetaItem,
  OpenElement,
  Range,
  Transaction,
  TransactionError,
  history::History,
  transaction::AnnotationMethod,
};
use serde_json::Value;

use crate::common::{
  EditOp,
  bold,
  offset,
  range,
  session_from_bytes,
  text,
};

fn build(doc: &lindoc_lib::Document, op: &EditOp) -> Result<Transaction, TransactionError> {
  match *op {
    EditOp::Insert { at, split, len } => {
      let data = if split {
        vec![Item::close("paragraph"), Item::open("paragraph")]
      } else {
        text(len)
      };
      Transaction::from_insertion(doc, offset(doc, at), data)
    },
    EditOp::Remove { from, to } => Transaction::from_removal(doc, range(doc, from, to)),
    EditOp::Annotate { from, to, clear } => {
      let method = if clear {
        AnnotationMethod::Clear
      } else {
        AnnotationMethod::Set
      };
      Transaction::from_annotation(doc, range(doc, from, to), method, bold())
    },
    EditOp::Convert { from, to, heading } => {
      let ty = if heading { "heading" } else { "paragraph" };
      Transaction::from_content_branch_conversion(doc, range(doc, from, to), ty, Default::default())
    },
    EditOp::Attribute { at, level } => {
      Transaction::from_attribute_changes(doc, offset(doc, at), [(
        "level",
        Some(Value::from(level)),
      )])
    },
    EditOp::Wrap { from, to, mode } => {
      let paragraph = [OpenElement::new("paragraph")];
      let heading = [OpenElement::new("heading")];
      let list = [OpenElement::new("list"), OpenElement::new("listItem")];
      let range = range(doc, from, to);
      match mode % 4 {
        0 => Transaction::from_wrap(doc, range, &[], &[], &paragraph, &heading),
        1 => Transaction::from_wrap(doc, range, &[], &[], &[], &list),
        2 => Transaction::from_wrap(doc, range, &[], &list, &[], &[]),
        _ => Transaction::from_wrap(doc, range, &list[..1], &[], &list[1..], &[]),
      }
    },
    EditOp::Metadata { at, index, remove } => {
      let at = offset(doc, at);
      let index = index as usize % 3;
      if remove {
        Transaction::from_metadata_removal(doc, at, Range::new(index, index + 1))
      } else {
        Transaction::from_metadata_insertion(doc, at, index, vec![MetaItem::new("comment")])
      }
    },
  }
}

fuzz_target!(|data: &[u8]| {
  let Some(mut session) = session_from_bytes(data) else {
    return;
  };
  let original = session.doc.data().clone();
  let original_metadata = session.doc.metadata().slots().to_vec();
  let mut history = History::new();

  for op in mem::take(&mut session.ops) {
    let doc = &mut session.doc;
    let Ok(tx) = build(doc, &op) else {
      continue;
    };
    let len = doc.len();
    assert_eq!(tx.covered_length(), len, "{op:?} {:?}", tx.operations());

    history.apply(doc, vec![tx]).unwrap();
    assert_eq!(
      doc.len() as isize,
      len as isize + history.current_transactions()[0].length_difference()
    );
    assert!(doc.data().is_balanced(), "{op:?}");
    assert_eq!(doc.metadata().len(), doc.len() + 1);
  }

  while history.undo(&mut session.doc).unwrap() {}
  assert_eq!(session.doc.data(), &original);
  assert_eq!(session.doc.metadata().slots(), original_metadata.as_slice());
});
