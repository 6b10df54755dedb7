/// Constants used by the unit-simplex weight sampler.
pub mod simplex {
    /// Number of integer steps the unit interval is divided into when cutting.
    pub const DEFAULT_RESOLUTION: usize = 10_000;
    /// Tolerance applied when checking that weights sum to one.
    pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;
}

/// Constants used when discovering and selecting candidate files.
pub mod selection {
    /// Extension (without dot, matched case-insensitively) of candidate text files.
    pub const TEXT_EXTENSION: &str = "txt";
    /// Marker embedded in truncated file names; such files are never candidates.
    pub const TRUNCATION_MARKER: &str = "trunc_";
}

/// Constants used by the experiment metadata record.
pub mod metadata {
    /// File name of the metadata record inside an experiment directory.
    pub const META_FILENAME: &str = "meta.json";
}

/// Constants used by the mixture pipeline and its command line.
pub mod mixture {
    /// Default total byte budget across all categories (10 GB).
    pub const DEFAULT_TOTAL_BYTES: u64 = 10_000_000_000;
    /// Default RNG seed when none is configured.
    pub const DEFAULT_SEED: u64 = 42;
}

/// Constants used by tokenizer training backends.
pub mod training {
    /// File name of the serialized tokenizer written by the BPE backend.
    pub const TOKENIZER_FILENAME: &str = "tokenizer.json";
    /// File name of the training file list handed to command backends.
    pub const FILE_LIST_FILENAME: &str = "train_files.txt";
    /// Default vocabulary size for BPE training.
    pub const DEFAULT_VOCAB_SIZE: usize = 32_000;
    /// Default minimum pair frequency for a BPE merge.
    pub const DEFAULT_MIN_FREQUENCY: u64 = 2;
    /// Default end-of-text special token.
    pub const END_OF_TEXT_TOKEN: &str = "<|endoftext|>";
}

/// Constants used by per-category frequency dump jobs.
pub mod frequencies {
    /// Default program used to run the per-category job.
    pub const DEFAULT_PROGRAM: &str = "python";
    /// Default leading arguments passed before the per-category flags.
    pub const DEFAULT_PROGRAM_ARGS: [&str; 2] = ["-m", "dump_frequencies"];
    /// Default corpus directory holding one subdirectory per category.
    pub const DEFAULT_CORPUS_DIR: &str = "../data/processed";
    /// Default experiments root, relative to the corpus directory for metadata lookup.
    pub const DEFAULT_EXPERIMENTS_ROOT: &str = "experiments/mixed_languages";
    /// Default mixing arity (number of categories per mixture).
    pub const DEFAULT_ARITY: usize = 5;
    /// Flag carrying the experiment directory.
    pub const FLAG_EXPERIMENT_DIR: &str = "--experiment_dir";
    /// Flag carrying the category identifier.
    pub const FLAG_CATEGORY: &str = "--lang_code";
    /// Flag carrying the corpus directory.
    pub const FLAG_CORPUS_DIR: &str = "--corpus_dir";
}
