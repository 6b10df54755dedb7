//! Per-category follow-up jobs driven by an experiment's metadata.
//!
//! After a mixture is trained, each of its categories is processed on its own (for
//! example to dump merge frequencies per language). Jobs run one at a time and the
//! first failure stops the run.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::constants::frequencies::{
    DEFAULT_PROGRAM, DEFAULT_PROGRAM_ARGS, FLAG_CATEGORY, FLAG_CORPUS_DIR, FLAG_EXPERIMENT_DIR,
};
use crate::errors::MixError;
use crate::training::run_command;
use crate::types::CategoryId;

/// One job invoked per category of an experiment.
pub trait CategoryTask {
    /// Process `category`, reading from `corpus_dir` and writing under `experiment_dir`.
    fn run(&self, experiment_dir: &Path, category: &str, corpus_dir: &Path)
    -> Result<(), MixError>;
}

/// Task that runs an external program once per category.
///
/// Invoked as
/// `program [leading_args..] --experiment_dir <dir> --lang_code <category> --corpus_dir <dir>`.
#[derive(Clone, Debug)]
pub struct CommandCategoryTask {
    program: String,
    leading_args: Vec<String>,
}

impl CommandCategoryTask {
    /// Create a task running `program` with `leading_args` before the per-category flags.
    pub fn new<I, S>(program: impl Into<String>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            leading_args: leading_args.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for CommandCategoryTask {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM, DEFAULT_PROGRAM_ARGS)
    }
}

impl CategoryTask for CommandCategoryTask {
    fn run(
        &self,
        experiment_dir: &Path,
        category: &str,
        corpus_dir: &Path,
    ) -> Result<(), MixError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .arg(FLAG_EXPERIMENT_DIR)
            .arg(experiment_dir)
            .arg(FLAG_CATEGORY)
            .arg(category)
            .arg(FLAG_CORPUS_DIR)
            .arg(corpus_dir);
        run_command(&mut command, category)
    }
}

/// Directory of one experiment: `<root>/n_<arity>/<experiment_id>`.
pub fn experiment_dir(root: &Path, arity: usize, experiment_id: &str) -> PathBuf {
    root.join(format!("n_{arity}")).join(experiment_id)
}

/// Run `task` for each category in order, stopping at the first failure.
pub fn run_per_category<T: CategoryTask + ?Sized>(
    categories: &[CategoryId],
    experiment_dir: &Path,
    corpus_dir: &Path,
    task: &T,
) -> Result<(), MixError> {
    for category in categories {
        info!(category = %category, "[tokmix:freq] processing category");
        task.run(experiment_dir, category, corpus_dir)?;
        info!(category = %category, "[tokmix:freq] category done");
    }
    Ok(())
}
