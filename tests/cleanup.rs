use std::fs;
use std::path::{Path, PathBuf};

use tokmix::{MixError, MixtureConfig, MixturePlan, TokenizerTrainer, run_mixture, select_mixture};

struct FailingTrainer;

impl TokenizerTrainer for FailingTrainer {
    fn name(&self) -> &str {
        "failing"
    }

    fn train(&self, _files: &[PathBuf], output_dir: &Path) -> Result<(), MixError> {
        Err(MixError::Training {
            target: output_dir.display().to_string(),
            reason: "trainer crashed".to_string(),
        })
    }
}

fn write_file(dir: &Path, name: &str, len: usize) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), "y".repeat(len)).unwrap();
}

fn truncation_artifacts(root: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| path.to_string_lossy().contains("_trunc_"))
        .collect()
}

#[test]
fn failed_training_still_removes_truncated_files() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("domains");
    write_file(&root.join("code"), "big.txt", 1_000);
    write_file(&root.join("web"), "big.txt", 1_000);
    let config = MixtureConfig {
        domains_root: root.clone(),
        output_dir: temp.path().join("out"),
        total_bytes: 777,
        seed: 8,
        ..MixtureConfig::default()
    };

    let err = run_mixture(&config, &FailingTrainer).unwrap_err();
    assert!(matches!(err, MixError::Training { .. }));
    assert!(truncation_artifacts(&root).is_empty());
    assert!(config.output_dir.join("meta.json").is_file());
}

#[test]
fn exhausted_later_category_removes_earlier_truncations() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("domains");
    write_file(&root.join("a"), "text.txt", 500);
    write_file(&root.join("b"), "empty.txt", 0);

    let plan = MixturePlan::new(vec!["a".into(), "b".into()], vec![0.5, 0.5], 400).unwrap();
    let err = select_mixture(&root, &plan, 1).unwrap_err();
    match err {
        MixError::PoolExhausted {
            category,
            target_bytes,
            achieved_bytes,
        } => {
            assert_eq!(category, "b");
            assert_eq!(target_bytes, 200);
            assert_eq!(achieved_bytes, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(truncation_artifacts(&root).is_empty());
}

#[test]
fn stale_truncation_artifacts_are_never_selected() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("domains");
    write_file(&root.join("a"), "text_trunc_5.txt", 5);
    write_file(&root.join("a"), "notes.md", 50);

    let plan = MixturePlan::new(vec!["a".into()], vec![1.0], 10).unwrap();
    assert!(matches!(
        select_mixture(&root, &plan, 2),
        Err(MixError::PoolExhausted { .. })
    ));
}
