//! Apply-view configuration
//!
//! Loads and validates the convergence engine policy from a TOML file.
//! Default location: /etc/sonic/syncd_apply_view.toml

use crate::error::{Result, SyncdError};
use log::warn;
use serde::{Deserialize, Serialize};
use sonic_sai::ObjectType;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Object policy: what may be removed and what is replaced break-before-make
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Object types removed before creating their replacement when an
    /// in-place update is impossible
    #[serde(default = "default_break_before_make")]
    pub break_before_make: Vec<String>,

    /// Discovered object types that may be removed
    #[serde(default = "default_removable_discovered")]
    pub removable_discovered: Vec<String>,

    /// Discovered object types that are reset to defaults instead of removed
    #[serde(default = "default_non_removable")]
    pub non_removable: Vec<String>,

    /// Whether discovered objects of types listed in neither list may be removed
    #[serde(default = "default_unknown_discovered_removable")]
    pub unknown_discovered_removable: bool,
}

/// Safety caps on the graph walk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum dependency depth followed while processing one object
    #[serde(default = "default_max_recursion_depth")]
    pub max_recursion_depth: usize,

    /// Maximum passes of the leftover-removal loop
    #[serde(default = "default_max_removal_passes")]
    pub max_removal_passes: usize,
}

/// Execution of the computed operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Move each remove right after the operation that released its last reference
    #[serde(default = "default_optimize_removes")]
    pub optimize_removes: bool,

    /// Drop create/remove pairs and repeated sets of the same attribute
    #[serde(default = "default_collapse_operations")]
    pub collapse_operations: bool,

    /// Group consecutive operations of the same kind and type into bulk calls
    #[serde(default = "default_use_bulk")]
    pub use_bulk: bool,

    /// Read every object back after execution and compare with the view
    #[serde(default = "default_consistency_check")]
    pub consistency_check: bool,
}

/// Complete apply-view configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyViewConfig {
    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,
}

// Default functions
fn default_break_before_make() -> Vec<String> {
    Vec::new()
}

fn default_removable_discovered() -> Vec<String> {
    [ObjectType::VlanMember, ObjectType::StpPort, ObjectType::BridgePort]
        .iter()
        .map(|t| t.name().to_string())
        .collect()
}

fn default_non_removable() -> Vec<String> {
    [
        ObjectType::Port,
        ObjectType::Queue,
        ObjectType::IngressPriorityGroup,
        ObjectType::SchedulerGroup,
        ObjectType::Hash,
    ]
    .iter()
    .map(|t| t.name().to_string())
    .collect()
}

fn default_unknown_discovered_removable() -> bool {
    false
}

fn default_max_recursion_depth() -> usize {
    256
}

fn default_max_removal_passes() -> usize {
    1024
}

fn default_optimize_removes() -> bool {
    true
}

fn default_collapse_operations() -> bool {
    true
}

fn default_use_bulk() -> bool {
    false
}

fn default_consistency_check() -> bool {
    false
}

// Default implementations
impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            break_before_make: default_break_before_make(),
            removable_discovered: default_removable_discovered(),
            non_removable: default_non_removable(),
            unknown_discovered_removable: default_unknown_discovered_removable(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: default_max_recursion_depth(),
            max_removal_passes: default_max_removal_passes(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            optimize_removes: default_optimize_removes(),
            collapse_operations: default_collapse_operations(),
            use_bulk: default_use_bulk(),
            consistency_check: default_consistency_check(),
        }
    }
}

/// Which discovered objects may be removed from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalPolicy {
    pub removable: BTreeSet<ObjectType>,
    pub non_removable: BTreeSet<ObjectType>,
    pub unknown_removable: bool,
}

impl RemovalPolicy {
    /// Whether a discovered object of `object_type` must be kept.
    pub fn keeps(&self, object_type: ObjectType) -> bool {
        if self.removable.contains(&object_type) {
            return false;
        }
        if self.non_removable.contains(&object_type) {
            return true;
        }
        warn!(
            "no removal policy for discovered {}, treating as {}",
            object_type,
            if self.unknown_removable { "removable" } else { "non-removable" }
        );
        !self.unknown_removable
    }
}

impl Default for RemovalPolicy {
    fn default() -> Self {
        // Defaults always parse.
        PolicyConfig::default()
            .removal_policy()
            .unwrap_or_else(|_| RemovalPolicy {
                removable: BTreeSet::new(),
                non_removable: BTreeSet::new(),
                unknown_removable: false,
            })
    }
}

/// Object types handled break-before-make.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakConfig {
    types: BTreeSet<ObjectType>,
}

impl BreakConfig {
    pub fn new(types: impl IntoIterator<Item = ObjectType>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }

    pub fn contains(&self, object_type: ObjectType) -> bool {
        self.types.contains(&object_type)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn parse_types(field: &str, names: &[String]) -> Result<BTreeSet<ObjectType>> {
    names
        .iter()
        .map(|name| {
            name.parse::<ObjectType>().map_err(|_| {
                SyncdError::Configuration(format!("{field}: unknown object type {name}"))
            })
        })
        .collect()
}

impl PolicyConfig {
    pub fn removal_policy(&self) -> Result<RemovalPolicy> {
        Ok(RemovalPolicy {
            removable: parse_types("removable_discovered", &self.removable_discovered)?,
            non_removable: parse_types("non_removable", &self.non_removable)?,
            unknown_removable: self.unknown_discovered_removable,
        })
    }

    pub fn break_config(&self) -> Result<BreakConfig> {
        Ok(BreakConfig::new(parse_types(
            "break_before_make",
            &self.break_before_make,
        )?))
    }
}

impl ApplyViewConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config: Self = toml::from_str(&content).map_err(|e| {
                    SyncdError::Configuration(format!(
                        "Failed to parse config file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                config.validate()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(SyncdError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> Result<Self> {
        Self::load_or_default("/etc/sonic/syncd_apply_view.toml")
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            SyncdError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path.as_ref(), content)?;

        Ok(())
    }

    pub fn removal_policy(&self) -> Result<RemovalPolicy> {
        self.policy.removal_policy()
    }

    pub fn break_config(&self) -> Result<BreakConfig> {
        self.policy.break_config()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.engine.max_recursion_depth == 0 {
            return Err(SyncdError::Configuration(
                "max_recursion_depth must be > 0".to_string(),
            ));
        }

        if self.engine.max_removal_passes == 0 {
            return Err(SyncdError::Configuration(
                "max_removal_passes must be > 0".to_string(),
            ));
        }

        let policy = self.removal_policy()?;
        if let Some(both) = policy.removable.intersection(&policy.non_removable).next() {
            return Err(SyncdError::Configuration(format!(
                "{both} is listed as both removable and non-removable"
            )));
        }

        let breaks = self.break_config()?;
        if breaks.contains(ObjectType::Switch) {
            return Err(SyncdError::Configuration(
                "the switch cannot be handled break-before-make".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ApplyViewConfig::default();
        assert!(config.policy.break_before_make.is_empty());
        assert!(!config.policy.unknown_discovered_removable);
        assert_eq!(config.engine.max_recursion_depth, 256);
        assert_eq!(config.engine.max_removal_passes, 1024);
        assert!(config.execution.optimize_removes);
        assert!(!config.execution.use_bulk);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_removal_policy() {
        let policy = RemovalPolicy::default();
        assert!(!policy.keeps(ObjectType::BridgePort));
        assert!(policy.keeps(ObjectType::Queue));
        // Unknown types are kept.
        assert!(policy.keeps(ObjectType::Vlan));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ApplyViewConfig = toml::from_str(
            r#"
            [policy]
            break_before_make = ["SAI_OBJECT_TYPE_NEXT_HOP_GROUP"]

            [execution]
            use_bulk = true
            "#,
        )
        .unwrap();
        assert!(config.execution.use_bulk);
        assert!(config.execution.collapse_operations);
        assert_eq!(config.engine.max_recursion_depth, 256);
        assert!(config.break_config().unwrap().contains(ObjectType::NextHopGroup));
        assert!(!config.break_config().unwrap().contains(ObjectType::NextHop));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut config = ApplyViewConfig::default();
        config.policy.non_removable.push("SAI_OBJECT_TYPE_BOGUS".to_string());
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: non_removable: unknown object type SAI_OBJECT_TYPE_BOGUS"
        );
    }

    #[test]
    fn test_overlapping_policy_rejected() {
        let mut config = ApplyViewConfig::default();
        config.policy.non_removable.push("SAI_OBJECT_TYPE_BRIDGE_PORT".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_caps_rejected() {
        let mut config = ApplyViewConfig::default();
        config.engine.max_removal_passes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("apply_view.toml");

        let mut config = ApplyViewConfig::default();
        config.execution.consistency_check = true;
        config.policy.unknown_discovered_removable = true;
        config.save(&path).unwrap();

        let loaded = ApplyViewConfig::load_or_default(&path).unwrap();
        assert!(loaded.execution.consistency_check);
        assert!(loaded.policy.unknown_discovered_removable);
        assert_eq!(loaded.policy.non_removable, config.policy.non_removable);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ApplyViewConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.engine.max_removal_passes, 1024);
    }

    #[test]
    fn test_malformed_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[engine\nmax_removal_passes = ").unwrap();
        assert!(matches!(
            ApplyViewConfig::load_or_default(&path),
            Err(SyncdError::Configuration(_))
        ));
    }
}
