use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::constants::simplex::WEIGHT_SUM_TOLERANCE;
use crate::errors::MixError;
use crate::transport::fs::ensure_parent_dir;
use crate::types::{ByteCount, CategoryId, PathString, Weight};

pub use crate::constants::metadata::META_FILENAME;

/// Durable record of one mixture experiment.
///
/// This is the handoff to downstream stages: which categories were mixed, in what
/// proportion, how many bytes each contributed, and which files were trained on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentMetadata {
    /// Categories in discovery (alphabetical) order.
    #[serde(default, alias = "domains", alias = "languages")]
    pub categories: Vec<CategoryId>,
    /// Sampled weight per category.
    #[serde(default)]
    pub weights: IndexMap<CategoryId, Weight>,
    /// Achieved bytes per category.
    pub byte_count: IndexMap<CategoryId, ByteCount>,
    /// Total byte budget the weights were scaled by.
    #[serde(default)]
    pub total_bytes: ByteCount,
    /// Training files with the number of times each was used.
    #[serde(default)]
    pub train_files: IndexMap<PathString, usize>,
    /// Target bytes per category (`floor(weight * total_bytes)`).
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub targets: IndexMap<CategoryId, ByteCount>,
    /// Seed that reproduces the weights and traversal orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Integer resolution used by the simplex sampler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<usize>,
    /// When the record was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ExperimentMetadata {
    /// Count one more use of `path` as a training file.
    pub fn record_train_file(&mut self, path: &Path) {
        *self
            .train_files
            .entry(path.to_string_lossy().into_owned())
            .or_insert(0) += 1;
    }

    /// Categories of this experiment.
    ///
    /// Uses the explicit category list when present, otherwise the keys of
    /// `byte_count` in recorded order.
    pub fn category_list(&self) -> Vec<CategoryId> {
        if self.categories.is_empty() {
            self.byte_count.keys().cloned().collect()
        } else {
            self.categories.clone()
        }
    }

    /// Check internal consistency of the record.
    pub fn validate(&self) -> Result<(), MixError> {
        let categories = self.category_list();
        if categories.is_empty() {
            return Err(MixError::Configuration(
                "metadata lists no categories".to_string(),
            ));
        }
        for category in &categories {
            if !self.byte_count.contains_key(category) {
                return Err(MixError::Configuration(format!(
                    "metadata byte_count is missing category '{category}'"
                )));
            }
        }
        if !self.weights.is_empty() {
            for category in &categories {
                if !self.weights.contains_key(category) {
                    return Err(MixError::Configuration(format!(
                        "metadata weights are missing category '{category}'"
                    )));
                }
            }
            let sum: f64 = self.weights.values().sum();
            if self.weights.values().any(|weight| *weight < 0.0)
                || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE
            {
                return Err(MixError::Configuration(format!(
                    "metadata weights must be non-negative and sum to 1 (sum={sum})"
                )));
            }
        }
        Ok(())
    }

    /// Write the record as pretty JSON, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), MixError> {
        ensure_parent_dir(path)?;
        let file = File::create(path).map_err(MixError::at(path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|err| {
            MixError::Configuration(format!(
                "failed to encode metadata {}: {err}",
                path.display()
            ))
        })?;
        writer.write_all(b"\n").map_err(MixError::at(path))?;
        writer.flush().map_err(MixError::at(path))?;
        Ok(())
    }

    /// Read and validate a record.
    ///
    /// A missing file, malformed JSON, or a record without `byte_count` is a
    /// configuration error.
    pub fn load(path: &Path) -> Result<Self, MixError> {
        if !fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false) {
            return Err(MixError::Configuration(format!(
                "metadata file not found: {}",
                path.display()
            )));
        }
        let file = File::open(path).map_err(MixError::at(path))?;
        let meta: Self = serde_json::from_reader(BufReader::new(file)).map_err(|err| {
            MixError::Configuration(format!(
                "failed to parse metadata {}: {err}",
                path.display()
            ))
        })?;
        meta.validate()?;
        Ok(meta)
    }
}
