// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default file looked up by [`KernelConfig::load`]
pub const CONFIG_FILE: &str = "polyframe.toml";

/// Tunables shared by the spatial queries and the repair engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Distance below which two ear endpoints count as the same vertex during
    /// repair. Shape constructors reject zero-length directions on their own.
    pub epsilon: f64,
    /// Pad added to every box before broad-phase BVH queries
    pub aabb_padding: f64,
    /// Upper bound on repair passes per mesh. The initial open-edge count
    /// always bounds the loop; this can only tighten it.
    pub max_repair_passes: Option<usize>,
    /// Invert meshes that come out of repair closed but inside-out
    pub fix_orientation: bool,
    /// Maximum number of items in a BVH leaf
    pub bvh_leaf_size: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-9,
            aabb_padding: 0.0,
            max_repair_passes: None,
            fix_orientation: false,
            bvh_leaf_size: 4,
        }
    }
}

impl KernelConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: KernelConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `polyframe.toml` from the working directory (or defaults), then
    /// apply environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };

        if let Ok(epsilon) = std::env::var("POLYFRAME_EPSILON") {
            config.epsilon = epsilon
                .parse()
                .with_context(|| format!("Invalid POLYFRAME_EPSILON: {}", epsilon))?;
        }

        if let Ok(passes) = std::env::var("POLYFRAME_MAX_REPAIR_PASSES") {
            config.max_repair_passes = passes.parse().ok();
        }

        if let Ok(fix) = std::env::var("POLYFRAME_FIX_ORIENTATION") {
            config.fix_orientation = fix.parse().unwrap_or(false);
        }

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Pass budget for a mesh that starts with `open_edges` boundary edges
    pub fn repair_pass_budget(&self, open_edges: usize) -> usize {
        match self.max_repair_passes {
            Some(limit) => limit.min(open_edges),
            None => open_edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: KernelConfig = toml::from_str("fix_orientation = true").unwrap();
        assert!(config.fix_orientation);
        assert_eq!(config.bvh_leaf_size, 4);
        assert_eq!(config.max_repair_passes, None);
    }

    #[test]
    fn test_env_overrides_apply_on_load() {
        // Only test in this crate touching these variables
        std::env::set_var("POLYFRAME_EPSILON", "0.5");
        std::env::set_var("POLYFRAME_MAX_REPAIR_PASSES", "2");
        std::env::set_var("POLYFRAME_FIX_ORIENTATION", "true");
        let loaded = KernelConfig::load();

        std::env::set_var("POLYFRAME_EPSILON", "not-a-number");
        let invalid = KernelConfig::load();

        std::env::remove_var("POLYFRAME_EPSILON");
        std::env::remove_var("POLYFRAME_MAX_REPAIR_PASSES");
        std::env::remove_var("POLYFRAME_FIX_ORIENTATION");

        let config = loaded.unwrap();
        assert_eq!(config.epsilon, 0.5);
        assert_eq!(config.max_repair_passes, Some(2));
        assert!(config.fix_orientation);
        assert!(invalid.is_err());
    }

    #[test]
    fn test_pass_budget_never_exceeds_open_edges() {
        let mut config = KernelConfig::default();
        assert_eq!(config.repair_pass_budget(7), 7);

        config.max_repair_passes = Some(3);
        assert_eq!(config.repair_pass_budget(7), 3);
        assert_eq!(config.repair_pass_budget(2), 2);
    }
}
