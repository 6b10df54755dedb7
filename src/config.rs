use std::path::PathBuf;

use crate::constants::mixture::{DEFAULT_SEED, DEFAULT_TOTAL_BYTES};
use crate::constants::simplex::DEFAULT_RESOLUTION;
use crate::constants::training::{
    DEFAULT_MIN_FREQUENCY, DEFAULT_VOCAB_SIZE, END_OF_TEXT_TOKEN,
};
use crate::types::ByteCount;

/// Top-level configuration for one mixture run.
#[derive(Clone, Debug)]
pub struct MixtureConfig {
    /// Root directory holding one subdirectory per category.
    pub domains_root: PathBuf,
    /// Directory receiving `meta.json` and the trained tokenizer.
    pub output_dir: PathBuf,
    /// Total bytes of text to sample across all categories.
    pub total_bytes: ByteCount,
    /// Number of categories to mix; `None` (or a value at least the number of
    /// discovered categories) mixes every category.
    pub num_categories: Option<usize>,
    /// Integer resolution of the simplex weight sampler.
    pub resolution: usize,
    /// RNG seed controlling category choice, weights, and traversal order.
    pub seed: u64,
}

impl Default for MixtureConfig {
    fn default() -> Self {
        Self {
            domains_root: PathBuf::from("data/domains"),
            output_dir: PathBuf::from("experiments/mixed"),
            total_bytes: DEFAULT_TOTAL_BYTES,
            num_categories: None,
            resolution: DEFAULT_RESOLUTION,
            seed: DEFAULT_SEED,
        }
    }
}

/// Settings for the built-in BPE training backend.
#[derive(Clone, Debug)]
pub struct TrainerConfig {
    /// Target vocabulary size.
    pub vocab_size: usize,
    /// Minimum pair frequency for a merge.
    pub min_frequency: u64,
    /// Special tokens added to the vocabulary.
    pub special_tokens: Vec<String>,
    /// Whether the training library draws its own progress bars.
    pub show_progress: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            vocab_size: DEFAULT_VOCAB_SIZE,
            min_frequency: DEFAULT_MIN_FREQUENCY,
            special_tokens: vec![END_OF_TEXT_TOKEN.to_string()],
            show_progress: false,
        }
    }
}
