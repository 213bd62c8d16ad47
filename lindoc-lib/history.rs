use std::num::NonZeroUsize;

use thiserror::Error;

use crate::{
  Document,
  process::{
    self,
    ProcessError,
  },
  transaction::Transaction,
};

pub type Result<T> = std::result::Result<T, HistoryError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum HistoryError {
  #[error("process error: {0}")]
  Process(#[from] ProcessError),
}

/// Undo tree of committed transaction groups.
///
/// Revisions are stored in a vector; each one points at its parent and at the
/// last child committed on top of it. Undo moves to the parent, redo moves to
/// the last child, and committing after an undo starts a new branch while
/// the old one stays in the vector.
///
/// ```text
/// 0 (root) -- 1 -- 2
///              \
///               3   <- current, redo from 1 now leads here
/// ```
#[derive(Debug)]
pub struct History {
  revisions: Vec<Revision>,
  current:   usize,
}

/// A single point in history. See [History] for more information.
#[derive(Debug, Clone)]
struct Revision {
  parent:       usize,
  last_child:   Option<NonZeroUsize>,
  /// Applied transactions while this revision is current or an ancestor of
  /// the current one; pending otherwise.
  transactions: Vec<Transaction>,
}

impl Default for History {
  fn default() -> Self {
    // Dummy root revision with no transactions.
    Self {
      revisions: vec![Revision {
        parent:       0,
        last_child:   None,
        transactions: Vec::new(),
      }],
      current:   0,
    }
  }
}

impl History {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn current_revision(&self) -> usize {
    self.current
  }

  #[inline]
  pub const fn at_root(&self) -> bool {
    self.current == 0
  }

  /// Number of revisions, including the root.
  #[inline]
  pub fn len(&self) -> usize {
    self.revisions.len()
  }

  /// Whether the history only has the root revision.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.revisions.len() <= 1
  }

  pub fn can_undo(&self) -> bool {
    !self.at_root()
  }

  pub fn can_redo(&self) -> bool {
    self.revisions[self.current].last_child.is_some()
  }

  /// Commit `transactions` to `doc` in order and record them as one revision.
  ///
  /// Either every transaction is committed or, on the first failure, the ones
  /// already committed are rolled back and history is left unchanged.
  /// Committing nothing records nothing.
  pub fn apply(&mut self, doc: &mut Document, mut transactions: Vec<Transaction>) -> Result<()> {
    if transactions.is_empty() {
      return Ok(());
    }
    commit_all(doc, &mut transactions)?;

    let new_current = self.revisions.len();
    self.revisions[self.current].last_child = NonZeroUsize::new(new_current);
    self.revisions.push(Revision {
      parent: self.current,
      last_child: None,
      transactions,
    });
    self.current = new_current;
    tracing::debug!(revision = new_current, "recorded revision");
    Ok(())
  }

  /// Roll back the current revision. Returns `Ok(false)` at the root.
  pub fn undo(&mut self, doc: &mut Document) -> Result<bool> {
    if self.at_root() {
      return Ok(false);
    }
    let revision = &mut self.revisions[self.current];
    rollback_all(doc, &mut revision.transactions)?;
    self.current = revision.parent;
    tracing::debug!(revision = self.current, "undo");
    Ok(true)
  }

  /// Recommit the last child of the current revision. Returns `Ok(false)`
  /// when there is nothing to redo.
  pub fn redo(&mut self, doc: &mut Document) -> Result<bool> {
    let Some(child) = self.revisions[self.current].last_child else {
      return Ok(false);
    };
    commit_all(doc, &mut self.revisions[child.get()].transactions)?;
    self.current = child.get();
    tracing::debug!(revision = self.current, "redo");
    Ok(true)
  }

  /// Transactions of the current revision, in the order they were applied.
  pub fn current_transactions(&self) -> &[Transaction] {
    &self.revisions[self.current].transactions
  }
}

fn commit_all(doc: &mut Document, transactions: &mut [Transaction]) -> Result<()> {
  for index in 0..transactions.len() {
    if let Err(err) = process::commit(doc, &mut transactions[index]) {
      for tx in transactions[..index].iter_mut().rev() {
        process::rollback(doc, tx)?;
      }
      return Err(err.into());
    }
  }
  Ok(())
}

fn rollback_all(doc: &mut Document, transactions: &mut [Transaction]) -> Result<()> {
  for index in (0..transactions.len()).rev() {
    if let Err(err) = process::rollback(doc, &mut transactions[index]) {
      for tx in &mut transactions[index + 1..] {
        process::commit(doc, tx)?;
      }
      return Err(err.into());
    }
  }
  Ok(())
}
