use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::TrainError;

/// Hyperparameters fixed by a competition scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleConfig {
    /// Model architecture name understood by the trainer.
    pub model: String,
    /// Global batch size across all workers.
    pub batch_size: usize,
    /// Peak learning rate.
    pub learning_rate: f64,
    /// Warmup steps.
    pub warmup: u64,
    /// Optional Adam beta2 override.
    #[serde(default)]
    pub beta2: Option<f64>,
    /// Total samples seen over the whole run.
    pub train_num_samples: u64,
}

/// Named scale presets.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleRegistry {
    scales: BTreeMap<String, ScaleConfig>,
}

impl Default for ScaleRegistry {
    fn default() -> Self {
        let mut scales = BTreeMap::new();
        scales.insert(
            "small".to_string(),
            ScaleConfig {
                model: "ViT-B-32".to_string(),
                batch_size: 4096,
                learning_rate: 5e-4,
                warmup: 500,
                beta2: None,
                train_num_samples: 12_800_000,
            },
        );
        scales.insert(
            "medium".to_string(),
            ScaleConfig {
                model: "ViT-B-32".to_string(),
                batch_size: 4096,
                learning_rate: 5e-4,
                warmup: 500,
                beta2: None,
                train_num_samples: 128_000_000,
            },
        );
        scales.insert(
            "large".to_string(),
            ScaleConfig {
                model: "ViT-B-16".to_string(),
                batch_size: 8192,
                learning_rate: 5e-4,
                warmup: 500,
                beta2: None,
                train_num_samples: 1_280_000_000,
            },
        );
        scales.insert(
            "xlarge".to_string(),
            ScaleConfig {
                model: "ViT-L-14".to_string(),
                batch_size: 90112,
                learning_rate: 1e-3,
                warmup: 10_000,
                beta2: Some(0.95),
                train_num_samples: 12_800_000_000,
            },
        );
        Self { scales }
    }
}

impl ScaleRegistry {
    /// Built-in presets extended (or overridden) by a JSON object of
    /// `name -> ScaleConfig` read from `path`.
    pub fn with_overrides_from(mut self, path: &Path) -> Result<Self, TrainError> {
        let raw = fs::read_to_string(path)?;
        let overrides: BTreeMap<String, ScaleConfig> = serde_json::from_str(&raw)?;
        self.scales.extend(overrides);
        Ok(self)
    }

    /// Available scale names in sorted order.
    pub fn available(&self) -> Vec<&str> {
        self.scales.keys().map(String::as_str).collect()
    }

    /// Preset named `scale`.
    pub fn get(&self, scale: &str) -> Result<&ScaleConfig, TrainError> {
        self.scales
            .get(scale)
            .ok_or_else(|| TrainError::UnknownScale {
                scale: scale.to_string(),
                available: self.available().join(", "),
            })
    }
}
