use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::grouping::GroupingMode;
use crate::interaction::SearchMode;
use crate::layout::LayoutMode;

pub const DEFAULT_NODE_SPACING: f32 = 150.0;
pub const DEFAULT_NODE_SIZE: f32 = 10.0;
pub const DEFAULT_RELEASE_COOLDOWN_MS: u64 = 750;
const RELEASE_COOLDOWN_RANGE_MS: std::ops::RangeInclusive<u64> = 100..=5_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStyle {
    #[default]
    Straight,
    Curved,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("node_spacing must be a positive finite number, got {0}")]
    InvalidSpacing(f32),
    #[error("node_size must be a positive finite number, got {0}")]
    InvalidNodeSize(f32),
    #[error("release_cooldown_ms must be within 100..=5000, got {0}")]
    InvalidCooldown(u64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub layout_mode: LayoutMode,
    pub grouping_mode: GroupingMode,
    pub node_spacing: f32,
    pub node_size: f32,
    pub edge_style: EdgeStyle,
    pub animation_enabled: bool,
    pub search_mode: SearchMode,
    pub release_cooldown_ms: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            layout_mode: LayoutMode::Force,
            grouping_mode: GroupingMode::None,
            node_spacing: DEFAULT_NODE_SPACING,
            node_size: DEFAULT_NODE_SIZE,
            edge_style: EdgeStyle::Straight,
            animation_enabled: true,
            search_mode: SearchMode::NodeOnly,
            release_cooldown_ms: DEFAULT_RELEASE_COOLDOWN_MS,
        }
    }
}

impl GraphConfig {
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let raw = fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.node_spacing.is_finite() || self.node_spacing <= 0.0 {
            return Err(ConfigError::InvalidSpacing(self.node_spacing));
        }
        if !self.node_size.is_finite() || self.node_size <= 0.0 {
            return Err(ConfigError::InvalidNodeSize(self.node_size));
        }
        if !RELEASE_COOLDOWN_RANGE_MS.contains(&self.release_cooldown_ms) {
            return Err(ConfigError::InvalidCooldown(self.release_cooldown_ms));
        }
        Ok(())
    }

    pub fn release_cooldown_secs(&self) -> f64 {
        self.release_cooldown_ms as f64 / 1000.0
    }
}
