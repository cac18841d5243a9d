//! Pipeline configuration, loadable from a JSON file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::tracker::{ClassId, PresenceConfig};

/// COCO class index for people.
pub const PERSON_CLASS: ClassId = 0;

/// Where to find the detector weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSource {
    /// Path of the weights in the remote store
    pub remote_path: String,
    /// Local cache directory
    pub models_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub presence: PresenceConfig,
    /// Classes subject to presence tracking; everything else passes through.
    pub monitored_classes: Vec<ClassId>,
    /// Display names for pass-through labels.
    pub class_names: BTreeMap<ClassId, String>,
    /// Minimum wall-clock gap between persisted snapshots.
    pub persist_interval_ms: u64,
    /// Consecutive detector failures tolerated before the pipeline fails.
    pub max_consecutive_detector_failures: u32,
    /// Detector weights, resolved by `PipelineBuilder::build_from_config`.
    pub model: Option<ModelSource>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            presence: PresenceConfig::default(),
            monitored_classes: vec![PERSON_CLASS],
            class_names: BTreeMap::from([
                (0, "person".to_string()),
                (2, "car".to_string()),
                (3, "motorcycle".to_string()),
            ]),
            persist_interval_ms: 1000,
            max_consecutive_detector_failures: 5,
            model: None,
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON config; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        info!(path = %path.display(), "Loaded pipeline config");
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_consecutive_detector_failures == 0 {
            return Err(ConfigError::Invalid(
                "max_consecutive_detector_failures must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// `persist_interval_ms` as a [`Duration`].
    pub fn persist_interval(&self) -> Duration {
        Duration::from_millis(self.persist_interval_ms)
    }
}
