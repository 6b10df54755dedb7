#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line runners behind the crate's binaries.
pub mod apps;
/// Run and trainer configuration types.
pub mod config;
/// Centralized constants used across sampling, selection, and training.
pub mod constants;
/// Per-category follow-up jobs driven by experiment metadata.
pub mod frequencies;
mod hash;
/// Experiment metadata record and persistence.
pub mod metadata;
/// Achieved-share helpers for mixture reports.
pub mod metrics;
/// Mixture pipeline composition.
pub mod mixture;
/// Seedable random source.
pub mod rng;
/// Byte-budgeted file selection.
pub mod selection;
/// Unit-simplex weight sampling.
pub mod simplex;
/// Tokenizer training backends.
pub mod training;
/// Input transports used by selection (filesystem today).
pub mod transport;
/// Truncated file creation and scoped cleanup.
pub mod truncation;
/// Shared type aliases.
pub mod types;

mod errors;

pub use config::{MixtureConfig, TrainerConfig};
pub use errors::MixError;
pub use metadata::ExperimentMetadata;
pub use mixture::{
    MixturePlan, MixtureReport, MixtureSelection, build_metadata, choose_categories,
    plan_mixture, run_mixture, select_mixture,
};
pub use rng::{DeterministicRng, category_seed};
pub use selection::{Candidate, CategoryPool, CategorySelection, select_category};
pub use simplex::{byte_targets, sample_unit_simplex};
#[cfg(feature = "hf-tokenizers")]
pub use training::BpeTokenizerTrainer;
pub use training::{CommandTrainer, SkipTraining, TokenizerTrainer};
pub use types::{ByteCount, CategoryId, PathString, Weight};
