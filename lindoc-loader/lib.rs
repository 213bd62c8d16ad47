pub mod config;

use std::path::{
  Path,
  PathBuf,
};

use etcetera::base_strategy::{
  BaseStrategy,
  choose_base_strategy,
};

/// Name of the per-workspace configuration directory.
pub const WORKSPACE_DIR: &str = ".lindoc";

/// User configuration directory.
///
/// `LINDOC_CONFIG_DIR` takes priority; otherwise the platform config
/// directory joined with `lindoc`. Returns `None` when neither can be
/// determined (no home directory).
pub fn config_dir() -> Option<PathBuf> {
  if let Some(dir) = std::env::var_os("LINDOC_CONFIG_DIR") {
    return Some(PathBuf::from(dir));
  }
  let strategy = choose_base_strategy().ok()?;
  Some(strategy.config_dir().join("lindoc"))
}

/// Walk upward from `start` looking for a directory that contains
/// [`WORKSPACE_DIR`] and return that configuration directory.
pub fn find_workspace_config_dir(start: &Path) -> Option<PathBuf> {
  start
    .ancestors()
    .map(|dir| dir.join(WORKSPACE_DIR))
    .find(|dir| dir.is_dir())
}

/// Merge two TOML documents, merging values from `right` onto `left`.
///
/// `merge_depth` sets the nesting depth up to which values are merged instead
/// of overridden. Array entries that are tables with a `name` key are merged
/// with the `left` entry of the same name; other entries are appended.
///
/// When a table exists in both `left` and `right`, the merged table consists
/// of all keys in `left`'s table unioned with all keys in `right` with the
/// values of `right` being merged recursively onto values of `left`.
pub fn merge_toml_values(left: toml::Value, right: toml::Value, merge_depth: usize) -> toml::Value {
  use toml::Value;

  if merge_depth == 0 {
    return right;
  }

  match (left, right) {
    (Value::Array(left), Value::Array(right)) => {
      Value::Array(merge_named_entries(left, right, merge_depth - 1))
    },
    (Value::Table(mut left), Value::Table(right)) => {
      for (key, rvalue) in right {
        let merged = match left.remove(&key) {
          Some(lvalue) => merge_toml_values(lvalue, rvalue, merge_depth - 1),
          None => rvalue,
        };
        left.insert(key, merged);
      }
      Value::Table(left)
    },
    (_, right) => right,
  }
}

fn merge_named_entries(
  mut left: Vec<toml::Value>,
  right: Vec<toml::Value>,
  merge_depth: usize,
) -> Vec<toml::Value> {
  fn name(value: &toml::Value) -> Option<&str> {
    value.get("name").and_then(toml::Value::as_str)
  }

  left.reserve(right.len());
  for rvalue in right {
    let existing = name(&rvalue).and_then(|rname| left.iter().position(|v| name(v) == Some(rname)));
    match existing {
      Some(index) => {
        let lvalue = left.remove(index);
        left.push(merge_toml_values(lvalue, rvalue, merge_depth));
      },
      None => left.push(rvalue),
    }
  }
  left
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn merges_named_array_entries() {
    let base: toml::Value = toml::from_str(
      r#"
        default-category = "branch"

        [[node]]
        name = "paragraph"
        category = "content-branch"

        [[node]]
        name = "list"
        category = "branch"
      "#,
    )
    .unwrap();
    let user: toml::Value = toml::from_str(
      r#"
        [[node]]
        name = "list"
        internal = true

        [[node]]
        name = "callout"
        category = "content-branch"
      "#,
    )
    .unwrap();

    let merged = merge_toml_values(base, user, 3);
    let nodes = merged.get("node").and_then(toml::Value::as_array).unwrap();
    assert_eq!(nodes.len(), 3);

    let list = nodes
      .iter()
      .find(|n| n.get("name").and_then(toml::Value::as_str) == Some("list"))
      .unwrap();
    assert_eq!(list.get("category").and_then(toml::Value::as_str), Some("branch"));
    assert_eq!(list.get("internal").and_then(toml::Value::as_bool), Some(true));
    assert_eq!(
      merged.get("default-category").and_then(toml::Value::as_str),
      Some("branch")
    );
  }

  #[test]
  fn zero_depth_overrides() {
    let left: toml::Value = toml::from_str("a = [1, 2]").unwrap();
    let right: toml::Value = toml::from_str("b = 3").unwrap();
    assert_eq!(merge_toml_values(left, right.clone(), 0), right);
  }

  #[test]
  fn finds_workspace_dir() {
    let root = tempfile::tempdir().unwrap();
    let nested = root.path().join("a").join("b");
    std::fs::create_dir_all(&nested).unwrap();
    assert_eq!(find_workspace_config_dir(&nested), None);

    std::fs::create_dir(root.path().join(WORKSPACE_DIR)).unwrap();
    assert_eq!(
      find_workspace_config_dir(&nested),
      Some(root.path().join(WORKSPACE_DIR))
    );
  }
}
