//! The mixture pipeline: plan weights, select files, record metadata, train.
//!
//! Truncated files created during selection are owned by [`MixtureSelection`]. They
//! stay on disk while the trainer runs and are removed when the selection is
//! dropped, whether training succeeded or not.
//!
//! Runs assume a single writer per domains root: two runs against the same
//! category directories at once may collide on truncated file names.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use indexmap::IndexMap;
use rand::Rng;
use rand::seq::index;
use tracing::{info, warn};

use crate::config::MixtureConfig;
use crate::errors::MixError;
use crate::metadata::{ExperimentMetadata, META_FILENAME};
use crate::metrics::{category_shares, max_share_deviation};
use crate::rng::DeterministicRng;
use crate::selection::{CategoryPool, CategorySelection, select_category};
use crate::simplex::{byte_targets, is_on_simplex, sample_unit_simplex};
use crate::training::TokenizerTrainer;
use crate::transport::fs::{ensure_dir, list_category_dirs};
use crate::types::{ByteCount, CategoryId, Weight};

/// Categories with their weights and byte targets.
#[derive(Clone, Debug, PartialEq)]
pub struct MixturePlan {
    /// Categories in alphabetical order.
    pub categories: Vec<CategoryId>,
    /// Weight per category, same order.
    pub weights: Vec<Weight>,
    /// Target bytes per category, same order.
    pub targets: Vec<ByteCount>,
    /// Budget the weights were scaled by.
    pub total_bytes: ByteCount,
}

impl MixturePlan {
    /// Build a plan from explicit weights.
    pub fn new(
        categories: Vec<CategoryId>,
        weights: Vec<Weight>,
        total_bytes: ByteCount,
    ) -> Result<Self, MixError> {
        if categories.len() != weights.len() {
            return Err(MixError::Configuration(format!(
                "{} categories but {} weights",
                categories.len(),
                weights.len()
            )));
        }
        if !is_on_simplex(&weights) {
            return Err(MixError::Configuration(
                "mixture weights must be non-negative and sum to 1".to_string(),
            ));
        }
        let targets = byte_targets(&weights, total_bytes);
        Ok(Self {
            categories,
            weights,
            targets,
            total_bytes,
        })
    }

    /// Build a plan with weights sampled uniformly from the simplex.
    pub fn sample<R: Rng + ?Sized>(
        categories: Vec<CategoryId>,
        total_bytes: ByteCount,
        resolution: usize,
        rng: &mut R,
    ) -> Result<Self, MixError> {
        let weights = sample_unit_simplex(categories.len(), resolution, rng)?;
        Self::new(categories, weights, total_bytes)
    }

    /// Iterate `(category, weight, target)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (&CategoryId, Weight, ByteCount)> {
        self.categories
            .iter()
            .zip(self.weights.iter().copied())
            .zip(self.targets.iter().copied())
            .map(|((category, weight), target)| (category, weight, target))
    }
}

/// Pick `count` categories at random, keeping them in their original order.
///
/// `None`, or a count at least the number of categories, keeps all of them.
pub fn choose_categories<R: Rng + ?Sized>(
    categories: Vec<CategoryId>,
    count: Option<usize>,
    rng: &mut R,
) -> Vec<CategoryId> {
    let Some(count) = count.filter(|count| *count < categories.len()) else {
        return categories;
    };
    let mut picked = index::sample(rng, categories.len(), count).into_vec();
    picked.sort_unstable();
    picked
        .into_iter()
        .map(|idx| categories[idx].clone())
        .collect()
}

/// Discover categories under `config.domains_root`, choose the ones to mix, and
/// sample their weights and byte targets.
pub fn plan_mixture<R: Rng + ?Sized>(
    config: &MixtureConfig,
    rng: &mut R,
) -> Result<MixturePlan, MixError> {
    let discovered = list_category_dirs(&config.domains_root)?;
    let categories = choose_categories(discovered, config.num_categories, rng);
    MixturePlan::sample(categories, config.total_bytes, config.resolution, rng)
}

/// Every category's selection for one mixture.
#[derive(Debug, Default)]
pub struct MixtureSelection {
    /// Per-category selections in plan order.
    pub selections: Vec<CategorySelection>,
}

impl MixtureSelection {
    /// Flat training file list, category by category in visitation order.
    pub fn train_files(&self) -> Vec<PathBuf> {
        self.selections
            .iter()
            .flat_map(|selection| selection.files.iter().cloned())
            .collect()
    }

    /// Achieved bytes per category in plan order.
    pub fn byte_count(&self) -> IndexMap<CategoryId, ByteCount> {
        self.selections
            .iter()
            .map(|selection| (selection.category.clone(), selection.achieved_bytes))
            .collect()
    }

    /// Truncated copies currently on disk.
    pub fn truncated_paths(&self) -> Vec<&Path> {
        self.selections
            .iter()
            .filter_map(CategorySelection::truncated_path)
            .collect()
    }
}

/// Select files for every category of `plan` from `<domains_root>/<category>`.
///
/// Each category is shuffled with its own stream derived from `seed`. On failure,
/// truncated files already created for earlier categories are removed.
pub fn select_mixture(
    domains_root: &Path,
    plan: &MixturePlan,
    seed: u64,
) -> Result<MixtureSelection, MixError> {
    let mut mixture = MixtureSelection::default();
    for (category, _, target) in plan.iter() {
        let pool = CategoryPool::discover(category.as_str(), domains_root.join(category))?;
        let pool_bytes = pool.total_bytes();
        if pool_bytes < target {
            warn!(
                category = %category,
                target_bytes = target,
                pool_bytes,
                "[tokmix:select] pool smaller than target; files will be reused"
            );
        }
        let mut rng = DeterministicRng::for_category(seed, category);
        let selection = select_category(&pool, target, &mut rng)?;
        info!(
            category = %category,
            target_bytes = target,
            achieved_bytes = selection.achieved_bytes,
            files = selection.files.len(),
            truncated = selection.truncated_path().is_some(),
            "[tokmix:select] category selected"
        );
        mixture.selections.push(selection);
    }
    Ok(mixture)
}

/// Build the experiment record for a plan and its selection.
pub fn build_metadata(
    plan: &MixturePlan,
    selection: &MixtureSelection,
    seed: Option<u64>,
    resolution: Option<usize>,
) -> ExperimentMetadata {
    let mut metadata = ExperimentMetadata {
        categories: plan.categories.clone(),
        weights: plan
            .iter()
            .map(|(category, weight, _)| (category.clone(), weight))
            .collect(),
        byte_count: selection.byte_count(),
        total_bytes: plan.total_bytes,
        targets: plan
            .iter()
            .map(|(category, _, target)| (category.clone(), target))
            .collect(),
        seed,
        resolution,
        created_at: Some(Utc::now()),
        ..ExperimentMetadata::default()
    };
    for path in selection.train_files() {
        metadata.record_train_file(&path);
    }
    metadata
}

/// Result of a completed mixture run.
#[derive(Clone, Debug)]
pub struct MixtureReport {
    /// The record written to `meta_path`.
    pub metadata: ExperimentMetadata,
    /// Location of the metadata record.
    pub meta_path: PathBuf,
    /// Wall-clock training time in seconds.
    pub training_secs: f64,
}

/// Run the whole pipeline described by `config` with the given training backend.
pub fn run_mixture<T: TokenizerTrainer + ?Sized>(
    config: &MixtureConfig,
    trainer: &T,
) -> Result<MixtureReport, MixError> {
    ensure_dir(&config.output_dir)?;
    let plan = plan_mixture(config, &mut DeterministicRng::new(config.seed))?;

    info!(
        seed = config.seed,
        total_bytes = plan.total_bytes,
        "[tokmix:mix] mixture distribution sampled"
    );
    for (category, weight, target) in plan.iter() {
        info!("[tokmix:mix]   {category}: {weight:.4} ({target} bytes)");
    }

    let selection = select_mixture(&config.domains_root, &plan, config.seed)?;
    let metadata = build_metadata(
        &plan,
        &selection,
        Some(config.seed),
        Some(config.resolution),
    );
    for share in category_shares(&metadata.byte_count) {
        info!(
            category = %share.category,
            bytes = share.bytes,
            share = share.share,
            "[tokmix:mix] achieved share"
        );
    }
    info!(
        deviation = max_share_deviation(&metadata.weights, &metadata.byte_count),
        "[tokmix:mix] max weight/share deviation"
    );

    let meta_path = config.output_dir.join(META_FILENAME);
    metadata.save(&meta_path)?;
    info!(path = %meta_path.display(), "[tokmix:mix] metadata written");

    let files = selection.train_files();
    info!(
        trainer = trainer.name(),
        files = files.len(),
        "[tokmix:train] training started"
    );
    let started = Instant::now();
    trainer.train(&files, &config.output_dir)?;
    let training_secs = started.elapsed().as_secs_f64();
    drop(selection);
    info!(
        "[tokmix:train] training completed in {:.1}s; output in {}",
        training_secs,
        config.output_dir.display()
    );

    Ok(MixtureReport {
        metadata,
        meta_path,
        training_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<CategoryId> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn explicit_plan_targets_floor_the_budget() {
        let plan = MixturePlan::new(names(&["A", "B"]), vec![0.5, 0.5], 120).unwrap();
        assert_eq!(plan.targets, vec![60, 60]);
        let rows: Vec<_> = plan.iter().collect();
        assert_eq!(rows[1], (&"B".to_string(), 0.5, 60));
    }

    #[test]
    fn plan_rejects_mismatched_or_invalid_weights() {
        assert!(matches!(
            MixturePlan::new(names(&["A", "B"]), vec![1.0], 10),
            Err(MixError::Configuration(_))
        ));
        assert!(matches!(
            MixturePlan::new(names(&["A", "B"]), vec![0.7, 0.7], 10),
            Err(MixError::Configuration(_))
        ));
    }

    #[test]
    fn sampled_plan_is_reproducible() {
        let categories = names(&["de", "en", "fr", "sw"]);
        let first =
            MixturePlan::sample(categories.clone(), 1_000, 10_000, &mut DeterministicRng::new(5))
                .unwrap();
        let second =
            MixturePlan::sample(categories, 1_000, 10_000, &mut DeterministicRng::new(5)).unwrap();
        assert_eq!(first, second);
        assert!(first.targets.iter().sum::<u64>() <= 1_000);
    }

    #[test]
    fn choosing_keeps_alphabetical_order() {
        let all = names(&["a", "b", "c", "d", "e", "f"]);
        let chosen = choose_categories(all.clone(), Some(3), &mut DeterministicRng::new(12));
        assert_eq!(chosen.len(), 3);
        let mut sorted = chosen.clone();
        sorted.sort();
        assert_eq!(chosen, sorted);
        assert!(chosen.iter().all(|c| all.contains(c)));

        let mut rng = DeterministicRng::new(1);
        assert_eq!(choose_categories(all.clone(), None, &mut rng), all);
        assert_eq!(choose_categories(all.clone(), Some(10), &mut rng), all);
    }

    #[test]
    fn plan_covers_discovered_categories() {
        let temp = tempfile::tempdir().unwrap();
        for category in ["web", "books", "code"] {
            std::fs::create_dir_all(temp.path().join(category)).unwrap();
        }
        let config = MixtureConfig {
            domains_root: temp.path().to_path_buf(),
            total_bytes: 500,
            ..MixtureConfig::default()
        };
        let plan = plan_mixture(&config, &mut DeterministicRng::new(9)).unwrap();
        assert_eq!(plan.categories, names(&["books", "code", "web"]));
        assert!(is_on_simplex(&plan.weights));

        let single = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(single.path().join("only")).unwrap();
        let config = MixtureConfig {
            domains_root: single.path().to_path_buf(),
            ..MixtureConfig::default()
        };
        assert!(matches!(
            plan_mixture(&config, &mut DeterministicRng::new(9)),
            Err(MixError::Configuration(_))
        ));
    }
}
