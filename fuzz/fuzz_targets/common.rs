use lindoc_lib::{
  Annotation,
  Document,
  Item,
  Range,
};

const MAX_BLOCKS: usize = 16;
const MAX_OPS: usize = 32;
const MAX_TEXT: usize = 8;

#[derive(Debug, Clone)]
pub enum EditOp {
  Insert { at: u16, split: bool, len: u8 },
  Remove { from: u16, to: u16 },
  Annotate { from: u16, to: u16, clear: bool },
  Convert { from: u16, to: u16, heading: bool },
  Attribute { at: u16, level: u8 },
  Wrap { from: u16, to: u16, mode: u8 },
  Metadata { at: u16, index: u8, remove: bool },
}

pub struct Session {
  pub doc: Document,
  pub ops: Vec<EditOp>,
}

struct Bytes<'a>(&'a [u8]);

impl Bytes<'_> {
  fn u8(&mut self) -> Option<u8> {
    let (&first, rest) = self.0.split_first()?;
    self.0 = rest;
    Some(first)
  }

  fn u16(&mut self) -> Option<u16> {
    Some(u16::from_le_bytes([self.u8()?, self.u8()?]))
  }
}

fn wrap(ty: &str, content: Vec<Item>) -> Vec<Item> {
  let mut items = vec![Item::open(ty)];
  items.extend(content);
  items.push(Item::close(ty));
  items
}

pub fn text(len: u8) -> Vec<Item> {
  (0..len as usize % MAX_TEXT)
    .map(|i| Item::char(char::from(b'a' + (i % 26) as u8)))
    .collect()
}

pub fn session_from_bytes(data: &[u8]) -> Option<Session> {
  let mut bytes = Bytes(data);
  let blocks = bytes.u8()? as usize % MAX_BLOCKS;
  let mut items = Vec::new();
  for _ in 0..blocks {
    let kind = bytes.u8()?;
    let content = text(bytes.u8()?);
    items.extend(match kind % 5 {
      0 => wrap("paragraph", content),
      1 => wrap("heading", content),
      2 => wrap("list", wrap("listItem", wrap("paragraph", content))),
      3 => wrap("internalList", wrap("internalItem", wrap("paragraph", content))),
      _ => {
        let mut inline = content;
        inline.extend(wrap("inlineImage", Vec::new()));
        wrap("paragraph", inline)
      },
    });
  }
  let doc = Document::new(items).ok()?;

  let mut ops = Vec::new();
  while ops.len() < MAX_OPS {
    let Some(kind) = bytes.u8() else {
      break;
    };
    let op = match kind % 7 {
      0 => EditOp::Insert {
        at:    bytes.u16()?,
        split: bytes.u8()? % 2 == 0,
        len:   bytes.u8()?,
      },
      1 => EditOp::Remove {
        from: bytes.u16()?,
        to:   bytes.u16()?,
      },
      2 => EditOp::Annotate {
        from:  bytes.u16()?,
        to:    bytes.u16()?,
        clear: bytes.u8()? % 2 == 0,
      },
      3 => EditOp::Convert {
        from:    bytes.u16()?,
        to:      bytes.u16()?,
        heading: bytes.u8()? % 2 == 0,
      },
      4 => EditOp::Attribute {
        at:    bytes.u16()?,
        level: bytes.u8()?,
      },
      5 => EditOp::Wrap {
        from: bytes.u16()?,
        to:   bytes.u16()?,
        mode: bytes.u8()?,
      },
      _ => EditOp::Metadata {
        at:     bytes.u16()?,
        index:  bytes.u8()?,
        remove: bytes.u8()? % 2 == 0,
      },
    };
    ops.push(op);
  }
  Some(Session { doc, ops })
}

/// Clamp a fuzzed offset into the document.
pub fn offset(doc: &Document, raw: u16) -> usize {
  raw as usize % (doc.len() + 1)
}

pub fn range(doc: &Document, from: u16, to: u16) -> Range {
  Range::new(offset(doc, from), offset(doc, to))
}

pub fn bold() -> Annotation {
  Annotation::new("bold")
}
