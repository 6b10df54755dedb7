//! Tokenizer training backends.
//!
//! The harness treats training as opaque: a backend either returns `Ok(())` or a
//! [`MixError::Training`], which aborts the run.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::constants::training::FILE_LIST_FILENAME;
use crate::errors::MixError;
use crate::transport::fs::ensure_dir;

#[cfg(feature = "hf-tokenizers")]
pub use bpe::BpeTokenizerTrainer;

/// Trains a tokenizer on a list of text files, writing results to `output_dir`.
pub trait TokenizerTrainer {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Train on `files` (repeats allowed) and write artifacts into `output_dir`.
    fn train(&self, files: &[PathBuf], output_dir: &Path) -> Result<(), MixError>;
}

/// Backend that trains nothing; used to produce metadata only.
#[derive(Clone, Copy, Debug, Default)]
pub struct SkipTraining;

impl TokenizerTrainer for SkipTraining {
    fn name(&self) -> &str {
        "none"
    }

    fn train(&self, files: &[PathBuf], output_dir: &Path) -> Result<(), MixError> {
        debug!(
            files = files.len(),
            output_dir = %output_dir.display(),
            "[tokmix:train] training skipped"
        );
        Ok(())
    }
}

/// Backend that hands the file list to an external program.
///
/// The program is invoked as
/// `program [args..] --file-list <output_dir>/train_files.txt --output-dir <output_dir>`
/// where the file list holds one path per line.
#[derive(Clone, Debug)]
pub struct CommandTrainer {
    program: String,
    args: Vec<String>,
}

impl CommandTrainer {
    /// Create a backend running `program` with leading `args`.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl TokenizerTrainer for CommandTrainer {
    fn name(&self) -> &str {
        &self.program
    }

    fn train(&self, files: &[PathBuf], output_dir: &Path) -> Result<(), MixError> {
        ensure_dir(output_dir)?;
        let list_path = output_dir.join(FILE_LIST_FILENAME);
        write_file_list(&list_path, files)?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--file-list")
            .arg(&list_path)
            .arg("--output-dir")
            .arg(output_dir);
        run_command(&mut command, &output_dir.display().to_string())
    }
}

fn write_file_list(path: &Path, files: &[PathBuf]) -> Result<(), MixError> {
    let file = File::create(path).map_err(MixError::at(path))?;
    let mut writer = BufWriter::new(file);
    for entry in files {
        writeln!(writer, "{}", entry.display()).map_err(MixError::at(path))?;
    }
    writer.flush().map_err(MixError::at(path))
}

/// Run `command` to completion; a launch failure or non-zero exit is a training error.
pub(crate) fn run_command(command: &mut Command, target: &str) -> Result<(), MixError> {
    info!(target_name = target, command = ?command, "[tokmix:train] running external command");
    let status = command
        .status()
        .map_err(|err| training_error(target, format!("failed to launch {command:?}: {err}")))?;
    if !status.success() {
        return Err(training_error(
            target,
            format!("{command:?} exited with {status}"),
        ));
    }
    Ok(())
}

pub(crate) fn training_error(target: &str, reason: impl Display) -> MixError {
    MixError::Training {
        target: target.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(feature = "hf-tokenizers")]
mod bpe {
    use std::path::{Path, PathBuf};

    use tokenizers::models::bpe::{BPE, BpeTrainerBuilder};
    use tokenizers::normalizers::NFC;
    use tokenizers::pre_tokenizers::byte_level::ByteLevel;
    use tokenizers::{AddedToken, Model, TokenizerBuilder};
    use tracing::info;

    use super::{TokenizerTrainer, training_error};
    use crate::config::TrainerConfig;
    use crate::constants::training::TOKENIZER_FILENAME;
    use crate::errors::MixError;
    use crate::transport::fs::ensure_dir;

    /// Byte-level BPE training with the `tokenizers` library.
    ///
    /// Writes `tokenizer.json` plus the model's `vocab.json` and `merges.txt`.
    #[derive(Clone, Debug, Default)]
    pub struct BpeTokenizerTrainer {
        config: TrainerConfig,
    }

    impl BpeTokenizerTrainer {
        /// Create a backend with the given settings.
        pub fn new(config: TrainerConfig) -> Self {
            Self { config }
        }
    }

    impl TokenizerTrainer for BpeTokenizerTrainer {
        fn name(&self) -> &str {
            "bpe"
        }

        fn train(&self, files: &[PathBuf], output_dir: &Path) -> Result<(), MixError> {
            let target = output_dir.display().to_string();
            if files.is_empty() {
                return Err(training_error(&target, "no training files selected"));
            }
            ensure_dir(output_dir)?;

            let mut tokenizer = TokenizerBuilder::new()
                .with_model(BPE::default())
                .with_normalizer(Some(NFC::default()))
                .with_pre_tokenizer(Some(ByteLevel::default()))
                .with_post_processor(Some(ByteLevel::default()))
                .with_decoder(Some(ByteLevel::default()))
                .build()
                .map_err(|err| training_error(&target, err))?;
            let special_tokens = self
                .config
                .special_tokens
                .iter()
                .map(|token| AddedToken::from(token.clone(), true))
                .collect();
            let mut trainer = BpeTrainerBuilder::new()
                .show_progress(self.config.show_progress)
                .vocab_size(self.config.vocab_size)
                .min_frequency(self.config.min_frequency)
                .special_tokens(special_tokens)
                .initial_alphabet(ByteLevel::alphabet().into_iter().collect())
                .build();

            let paths: Vec<String> = files
                .iter()
                .map(|path| path.to_string_lossy().into_owned())
                .collect();
            tokenizer
                .train_from_files(&mut trainer, paths)
                .map_err(|err| training_error(&target, err))?;

            tokenizer
                .get_model()
                .save(output_dir, None)
                .map_err(|err| training_error(&target, err))?;
            tokenizer
                .save(output_dir.join(TOKENIZER_FILENAME), true)
                .map_err(|err| training_error(&target, err))?;
            info!(
                vocab_size = tokenizer.get_vocab_size(true),
                output_dir = %output_dir.display(),
                "[tokmix:train] bpe tokenizer saved"
            );
            Ok(())
        }
    }
}
