use std::{
  path::{
    Path,
    PathBuf,
  },
  str::from_utf8,
};

use eyre::{
  Context,
  Result,
};

const NODE_TYPES_FILE: &str = "node-types.toml";

/// Default built-in node-types.toml.
pub fn default_node_config() -> Result<toml::Value> {
  let default_config = include_bytes!("node-types.toml");
  let config_str =
    from_utf8(default_config).context("built-in node-types.toml contains invalid UTF-8")?;
  toml::from_str(config_str).context("failed to parse built-in node-types.toml")
}

/// Built-in node types merged with the user's and the workspace's
/// node-types.toml, if present.
pub fn user_node_config(workspace: &Path) -> Result<toml::Value> {
  let dirs = [
    crate::config_dir(),
    crate::find_workspace_config_dir(workspace),
  ];
  node_config_from_dirs(dirs.into_iter().flatten())
}

/// Built-in node types merged with `node-types.toml` from each directory in
/// `dirs`, later directories taking priority. Missing files are skipped;
/// files that exist but fail to parse are an error.
pub fn node_config_from_dirs(dirs: impl IntoIterator<Item = PathBuf>) -> Result<toml::Value> {
  let default = default_node_config()?;

  let config = dirs
    .into_iter()
    .map(|dir| dir.join(NODE_TYPES_FILE))
    .filter_map(|file| {
      std::fs::read_to_string(&file).ok().map(|config| {
        tracing::debug!("loading node types from {}", file.display());
        toml::from_str(&config)
          .with_context(|| format!("failed to parse {}", file.display()))
      })
    })
    .collect::<Result<Vec<toml::Value>>>()?
    .into_iter()
    .fold(default, |a, b| crate::merge_toml_values(a, b, 3));

  Ok(config)
}
