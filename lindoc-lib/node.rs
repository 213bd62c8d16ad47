//! Node-type capabilities.
//!
//! The engine never hard-codes element names. Everything it needs to know
//! about a type (may it hold text, is it itself inline content, is it
//! internal storage) comes through [`NodeTypes`]. The bundled
//! [`NodeRegistry`] answers those queries from `node-types.toml`.

use std::{
  collections::HashMap,
  path::Path,
  sync::{
    Arc,
    LazyLock,
  },
};

use lindoc_core::Tendril;
use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeCategory {
  /// Holds other structural nodes.
  Branch,
  /// Holds text and inline content nodes.
  ContentBranch,
  /// Inline node inside a content branch.
  Content,
  /// Structural node without children.
  Leaf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSpec {
  pub category: NodeCategory,
  pub internal: bool,
}

impl NodeSpec {
  pub const fn new(category: NodeCategory) -> Self {
    Self {
      category,
      internal: false,
    }
  }
}

/// Capability queries the engine makes about element types.
pub trait NodeTypes: std::fmt::Debug + Send + Sync {
  fn spec(&self, ty: &str) -> NodeSpec;

  fn category(&self, ty: &str) -> NodeCategory {
    self.spec(ty).category
  }

  fn can_contain_content(&self, ty: &str) -> bool {
    self.category(ty) == NodeCategory::ContentBranch
  }

  fn is_content(&self, ty: &str) -> bool {
    self.category(ty) == NodeCategory::Content
  }

  fn is_internal(&self, ty: &str) -> bool {
    self.spec(ty).internal
  }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("invalid node types: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("failed to load node types: {0}")]
  Load(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RegistryConfig {
  #[serde(default = "default_category")]
  default_category: NodeCategory,
  #[serde(default)]
  node:             Vec<NodeConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct NodeConfig {
  name:     Tendril,
  category: Option<NodeCategory>,
  #[serde(default)]
  internal: bool,
}

fn default_category() -> NodeCategory {
  NodeCategory::Branch
}

static BUILTIN: LazyLock<Arc<NodeRegistry>> = LazyLock::new(|| {
  let config = lindoc_loader::config::default_node_config()
    .expect("Could not parse built-in node-types.toml");
  let registry =
    NodeRegistry::from_value(config).expect("Could not deserialize built-in node-types.toml");
  Arc::new(registry)
});

#[derive(Debug, Clone)]
pub struct NodeRegistry {
  types:    HashMap<Tendril, NodeSpec>,
  fallback: NodeSpec,
}

impl NodeRegistry {
  /// Registry with no types; every query answers `fallback`.
  pub fn new(fallback: NodeCategory) -> Self {
    Self {
      types:    HashMap::new(),
      fallback: NodeSpec::new(fallback),
    }
  }

  /// Shared registry built from the bundled `node-types.toml`.
  pub fn builtin() -> Arc<Self> {
    BUILTIN.clone()
  }

  /// Built-in types overlaid with the user's and `workspace`'s configuration.
  pub fn load(workspace: &Path) -> Result<Self> {
    let config = lindoc_loader::config::user_node_config(workspace)
      .map_err(|err| ConfigError::Load(format!("{err:#}")))?;
    Self::from_value(config)
  }

  pub fn from_toml(source: &str) -> Result<Self> {
    let config: RegistryConfig = toml::from_str(source)?;
    Ok(Self::from_config(config))
  }

  pub fn from_value(value: toml::Value) -> Result<Self> {
    let config: RegistryConfig = value.try_into()?;
    Ok(Self::from_config(config))
  }

  fn from_config(config: RegistryConfig) -> Self {
    let mut registry = Self::new(config.default_category);
    for node in config.node {
      let category = node.category.unwrap_or_else(|| {
        tracing::warn!(
          "node type {} has no category, using {:?}",
          node.name,
          config.default_category
        );
        config.default_category
      });
      registry.register(
        node.name,
        NodeSpec {
          category,
          internal: node.internal,
        },
      );
    }
    registry
  }

  pub fn register(&mut self, name: impl Into<Tendril>, spec: NodeSpec) {
    self.types.insert(name.into(), spec);
  }

  pub fn contains(&self, ty: &str) -> bool {
    self.types.contains_key(ty)
  }

  pub fn len(&self) -> usize {
    self.types.len()
  }

  pub fn is_empty(&self) -> bool {
    self.types.is_empty()
  }
}

impl NodeTypes for NodeRegistry {
  fn spec(&self, ty: &str) -> NodeSpec {
    self.types.get(ty).copied().unwrap_or(self.fallback)
  }
}
