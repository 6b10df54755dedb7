use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum, error::ErrorKind};

use crate::config::{MixtureConfig, TrainerConfig};
use crate::constants::frequencies::{
    DEFAULT_ARITY, DEFAULT_CORPUS_DIR, DEFAULT_EXPERIMENTS_ROOT, DEFAULT_PROGRAM,
    DEFAULT_PROGRAM_ARGS,
};
use crate::constants::mixture::DEFAULT_TOTAL_BYTES;
use crate::constants::simplex::DEFAULT_RESOLUTION;
use crate::constants::training::{DEFAULT_MIN_FREQUENCY, DEFAULT_VOCAB_SIZE};
use crate::frequencies::{CommandCategoryTask, experiment_dir, run_per_category};
use crate::metadata::{ExperimentMetadata, META_FILENAME};
use crate::mixture::run_mixture;
use crate::training::{CommandTrainer, SkipTraining, TokenizerTrainer};

type DynTrainer = Box<dyn TokenizerTrainer>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TrainerArg {
    /// Byte-level BPE via the `tokenizers` library.
    Bpe,
    /// An external program given by `--trainer-program`.
    Command,
    /// Write metadata only.
    #[value(name = "none")]
    Skip,
}

#[derive(Debug, Parser)]
#[command(
    name = "train_mixture",
    disable_help_subcommand = true,
    about = "Train a tokenizer on a random mixture of text categories",
    long_about = "Sample mixture weights over the category subdirectories of a domains root, select files to fill each category's byte quota, record meta.json, and train a tokenizer on the selection.",
    after_help = "Truncated copies created to hit byte quotas exactly are removed after training, whether it succeeds or not."
)]
struct TrainMixtureCli {
    #[arg(
        long = "domains-dir",
        value_name = "DIR",
        help = "Root folder containing one subdirectory per category"
    )]
    domains_dir: PathBuf,
    #[arg(
        long = "output-dir",
        value_name = "DIR",
        help = "Where to write meta.json and the trained tokenizer"
    )]
    output_dir: PathBuf,
    #[arg(
        long = "total-bytes",
        default_value_t = DEFAULT_TOTAL_BYTES,
        help = "Total bytes of text to sample across all categories"
    )]
    total_bytes: u64,
    #[arg(
        long = "num-categories",
        value_parser = parse_positive_usize,
        help = "Number of categories to mix (default: all discovered categories)"
    )]
    num_categories: Option<usize>,
    #[arg(
        long,
        default_value_t = DEFAULT_RESOLUTION,
        value_parser = parse_positive_usize,
        help = "Integer resolution of the simplex weight sampler"
    )]
    resolution: usize,
    #[arg(long, help = "Deterministic seed (default: random, recorded in meta.json)")]
    seed: Option<u64>,
    #[arg(long, value_enum, default_value_t = TrainerArg::Bpe, help = "Training backend")]
    trainer: TrainerArg,
    #[arg(
        long = "vocab-size",
        default_value_t = DEFAULT_VOCAB_SIZE,
        value_parser = parse_positive_usize,
        help = "Vocabulary size for the bpe backend"
    )]
    vocab_size: usize,
    #[arg(
        long = "min-frequency",
        default_value_t = DEFAULT_MIN_FREQUENCY,
        help = "Minimum merge frequency for the bpe backend"
    )]
    min_frequency: u64,
    #[arg(
        long = "trainer-program",
        value_name = "PROGRAM",
        required_if_eq("trainer", "command"),
        help = "Program run by the command backend"
    )]
    trainer_program: Option<String>,
    #[arg(
        long = "trainer-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        help = "Leading argument for the command backend, repeat as needed"
    )]
    trainer_args: Vec<String>,
}

#[derive(Debug, Parser)]
#[command(
    name = "dump_frequencies",
    disable_help_subcommand = true,
    about = "Run a per-category job for every category of a mixture experiment",
    long_about = "Read an experiment's meta.json and invoke the job program once per recorded category, stopping at the first failure.",
    after_help = "The metadata path defaults to <corpus-dir>/<experiments-root>/n_<arity>/<experiment-id>/meta.json."
)]
struct DumpFrequenciesCli {
    #[arg(long, value_name = "PATH", help = "Explicit metadata file path")]
    meta: Option<PathBuf>,
    #[arg(
        long = "experiment-id",
        default_value = "0",
        help = "Experiment identifier within the arity directory"
    )]
    experiment_id: String,
    #[arg(
        long,
        default_value_t = DEFAULT_ARITY,
        value_parser = parse_positive_usize,
        help = "Number of categories mixed in the experiment"
    )]
    arity: usize,
    #[arg(
        long = "corpus-dir",
        value_name = "DIR",
        default_value = DEFAULT_CORPUS_DIR,
        help = "Corpus directory holding one subdirectory per category"
    )]
    corpus_dir: PathBuf,
    #[arg(
        long = "experiments-root",
        value_name = "DIR",
        default_value = DEFAULT_EXPERIMENTS_ROOT,
        help = "Experiments root passed to the job"
    )]
    experiments_root: PathBuf,
    #[arg(long, default_value = DEFAULT_PROGRAM, help = "Job program")]
    program: String,
    #[arg(
        long = "program-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        help = "Leading job argument, repeat as needed (default: -m dump_frequencies)"
    )]
    program_args: Vec<String>,
}

/// Run the `train_mixture` command line with `args_iter` (program name excluded).
pub fn run_train_mixture<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();

    let Some(cli) = parse_cli::<TrainMixtureCli, _>(
        std::iter::once("train_mixture".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let config = MixtureConfig {
        domains_root: cli.domains_dir.clone(),
        output_dir: cli.output_dir.clone(),
        total_bytes: cli.total_bytes,
        num_categories: cli.num_categories,
        resolution: cli.resolution,
        seed: cli.seed.unwrap_or_else(rand::random),
    };
    let trainer = build_trainer(&cli)?;
    let report = run_mixture(&config, trainer.as_ref())?;

    println!("=== mixture ===");
    for category in &report.metadata.categories {
        let weight = report.metadata.weights.get(category).copied().unwrap_or(0.0);
        let bytes = report.metadata.byte_count.get(category).copied().unwrap_or(0);
        println!("  {category}: {weight:.4} ({bytes} bytes)");
    }
    println!("seed        : {}", config.seed);
    println!("train files : {}", report.metadata.train_files.len());
    println!("metadata    : {}", report.meta_path.display());
    println!("trained in  : {:.1}s", report.training_secs);
    Ok(())
}

/// Run the `dump_frequencies` command line with `args_iter` (program name excluded).
pub fn run_dump_frequencies<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();

    let Some(cli) = parse_cli::<DumpFrequenciesCli, _>(
        std::iter::once("dump_frequencies".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let experiment_dir = experiment_dir(&cli.experiments_root, cli.arity, &cli.experiment_id);
    let meta_path = cli
        .meta
        .clone()
        .unwrap_or_else(|| cli.corpus_dir.join(&experiment_dir).join(META_FILENAME));
    let metadata = ExperimentMetadata::load(&meta_path)?;
    let categories = metadata.category_list();
    println!("Categories in {}: {:?}", meta_path.display(), categories);

    let task = if cli.program_args.is_empty() && cli.program == DEFAULT_PROGRAM {
        CommandCategoryTask::new(cli.program, DEFAULT_PROGRAM_ARGS)
    } else {
        CommandCategoryTask::new(cli.program, cli.program_args)
    };
    run_per_category(&categories, &experiment_dir, &cli.corpus_dir, &task)?;
    println!("Done with {} categories", categories.len());
    Ok(())
}

fn build_trainer(cli: &TrainMixtureCli) -> Result<DynTrainer, Box<dyn Error>> {
    match cli.trainer {
        TrainerArg::Bpe => build_bpe_trainer(TrainerConfig {
            vocab_size: cli.vocab_size,
            min_frequency: cli.min_frequency,
            ..TrainerConfig::default()
        }),
        TrainerArg::Command => {
            let program = cli
                .trainer_program
                .clone()
                .ok_or("--trainer command requires --trainer-program")?;
            Ok(Box::new(CommandTrainer::new(
                program,
                cli.trainer_args.clone(),
            )))
        }
        TrainerArg::Skip => Ok(Box::new(SkipTraining)),
    }
}

#[cfg(feature = "hf-tokenizers")]
fn build_bpe_trainer(config: TrainerConfig) -> Result<DynTrainer, Box<dyn Error>> {
    Ok(Box::new(crate::training::BpeTokenizerTrainer::new(config)))
}

#[cfg(not(feature = "hf-tokenizers"))]
fn build_bpe_trainer(_config: TrainerConfig) -> Result<DynTrainer, Box<dyn Error>> {
    Err("the bpe backend requires the `hf-tokenizers` feature".into())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{}' as a positive integer", raw))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn train_mixture_defaults() {
        let cli = TrainMixtureCli::try_parse_from([
            "train_mixture",
            "--domains-dir",
            "data",
            "--output-dir",
            "out",
        ])
        .unwrap();
        assert_eq!(cli.total_bytes, DEFAULT_TOTAL_BYTES);
        assert_eq!(cli.resolution, DEFAULT_RESOLUTION);
        assert_eq!(cli.trainer, TrainerArg::Bpe);
        assert!(cli.num_categories.is_none());
        assert!(cli.seed.is_none());
    }

    #[test]
    fn command_trainer_requires_program() {
        let err = TrainMixtureCli::try_parse_from([
            "train_mixture",
            "--domains-dir",
            "data",
            "--output-dir",
            "out",
            "--trainer",
            "command",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let cli = TrainMixtureCli::try_parse_from([
            "train_mixture",
            "--domains-dir",
            "data",
            "--output-dir",
            "out",
            "--trainer",
            "command",
            "--trainer-program",
            "spm_train",
            "--trainer-arg",
            "--model_type=bpe",
        ])
        .unwrap();
        assert_eq!(cli.trainer_program.as_deref(), Some("spm_train"));
        assert_eq!(cli.trainer_args, vec!["--model_type=bpe"]);
    }

    #[test]
    fn zero_values_are_rejected() {
        assert!(parse_positive_usize("0").is_err());
        assert!(parse_positive_usize("x").is_err());
        assert_eq!(parse_positive_usize("5"), Ok(5));
    }

    #[test]
    fn help_exits_cleanly() {
        run_train_mixture(args(&["--help"])).unwrap();
        run_dump_frequencies(args(&["--help"])).unwrap();
    }

    #[test]
    fn metadata_only_run_writes_meta_json() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("domains");
        for (category, body) in [("Code", "fn main() {}\n"), ("Web", "hello web\n")] {
            fs::create_dir_all(root.join(category)).unwrap();
            fs::write(root.join(category).join("a.txt"), body.repeat(20)).unwrap();
        }
        let out = temp.path().join("out");

        run_train_mixture(args(&[
            "--domains-dir",
            root.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
            "--total-bytes",
            "100",
            "--seed",
            "3",
            "--trainer",
            "none",
        ]))
        .unwrap();

        let meta = ExperimentMetadata::load(&out.join(META_FILENAME)).unwrap();
        assert_eq!(meta.categories, vec!["Code", "Web"]);
        assert_eq!(meta.seed, Some(3));
        assert_eq!(meta.byte_count.values().sum::<u64>(), meta.targets.values().sum::<u64>());
    }

    #[test]
    fn dump_frequencies_fails_on_missing_metadata() {
        let temp = tempdir().unwrap();
        let err = run_dump_frequencies(args(&[
            "--corpus-dir",
            temp.path().to_str().unwrap(),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("metadata file not found"));
    }
}
