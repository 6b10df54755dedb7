//! Byte-budgeted file selection for one category.
//!
//! The pool is shuffled once, then visited cyclically. Whole files are accepted
//! while they fit in the remaining budget; the first file that does not fit is
//! truncated to exactly the remaining byte count, which ends the category. Pools
//! smaller than the target are reused as many times as needed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::errors::MixError;
use crate::transport::fs::{list_candidates, truncation_path};
use crate::truncation::TruncatedFile;
use crate::types::{ByteCount, CategoryId};

/// A candidate text file and its size at discovery time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute (or root-relative) path to the file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: ByteCount,
}

/// Every candidate file of one category, plus the directory truncations are written to.
#[derive(Clone, Debug)]
pub struct CategoryPool {
    /// Category name.
    pub category: CategoryId,
    /// Directory holding the category's files.
    pub dir: PathBuf,
    /// Candidate files in discovery order.
    pub candidates: Vec<Candidate>,
}

impl CategoryPool {
    /// Build a pool from already resolved candidates.
    pub fn new(
        category: impl Into<CategoryId>,
        dir: impl Into<PathBuf>,
        candidates: Vec<Candidate>,
    ) -> Self {
        Self {
            category: category.into(),
            dir: dir.into(),
            candidates,
        }
    }

    /// Discover the candidate text files in `dir`.
    pub fn discover(
        category: impl Into<CategoryId>,
        dir: impl Into<PathBuf>,
    ) -> Result<Self, MixError> {
        let dir = dir.into();
        let candidates = list_candidates(&dir)?;
        Ok(Self::new(category, dir, candidates))
    }

    /// Sum of candidate sizes (each counted once).
    pub fn total_bytes(&self) -> ByteCount {
        self.candidates.iter().map(|candidate| candidate.size).sum()
    }
}

/// Outcome of visiting one candidate against the remaining budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visit {
    /// The whole file fits; accept it and keep going.
    Accept,
    /// The file is larger than the remainder; accept its first `n` bytes and stop.
    Truncate(ByteCount),
    /// Nothing remains; stop without touching the file.
    Done,
}

/// Decide what to do with a file of `size` bytes when `remaining` bytes are still wanted.
pub fn decide(size: ByteCount, remaining: ByteCount) -> Visit {
    if remaining == 0 {
        Visit::Done
    } else if size <= remaining {
        Visit::Accept
    } else {
        Visit::Truncate(remaining)
    }
}

/// Selection progress for one category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionState {
    /// Nothing visited yet.
    Init,
    /// Visiting files; holds the bytes accepted so far.
    Accumulating(ByteCount),
    /// The target is met exactly.
    TargetMet,
    /// The pool cannot reach the target.
    PoolExhausted,
}

/// Files chosen for one category.
///
/// Owns the category's truncated copy, if any; dropping the selection removes it.
#[derive(Debug)]
pub struct CategorySelection {
    /// Category name.
    pub category: CategoryId,
    /// Byte quota this selection was asked to fill.
    pub target_bytes: ByteCount,
    /// Bytes actually selected.
    pub achieved_bytes: ByteCount,
    /// Selected paths in visitation order, including the truncated copy.
    pub files: Vec<PathBuf>,
    truncated: Option<TruncatedFile>,
}

impl CategorySelection {
    fn empty(category: &str, target_bytes: ByteCount) -> Self {
        Self {
            category: category.to_string(),
            target_bytes,
            achieved_bytes: 0,
            files: Vec::new(),
            truncated: None,
        }
    }

    /// Path of the truncated copy created for this category, if any.
    pub fn truncated_path(&self) -> Option<&Path> {
        self.truncated.as_ref().map(TruncatedFile::path)
    }

    /// True when the achieved bytes equal the target.
    pub fn is_complete(&self) -> bool {
        self.achieved_bytes == self.target_bytes
    }
}

/// Select files from `pool` summing to exactly `target_bytes`.
///
/// `rng` shuffles the pool once before the first visit. A target of zero returns an
/// empty selection without touching the filesystem. An empty pool, or a pool whose
/// files are all empty, fails with [`MixError::PoolExhausted`].
pub fn select_category<R: Rng + ?Sized>(
    pool: &CategoryPool,
    target_bytes: ByteCount,
    rng: &mut R,
) -> Result<CategorySelection, MixError> {
    let mut selection = CategorySelection::empty(&pool.category, target_bytes);
    let mut state = SelectionState::Init;
    let mut order: Vec<&Candidate> = pool.candidates.iter().collect();
    let mut idx = 0_usize;
    let mut pass_start = 0;

    loop {
        state = match state {
            SelectionState::Init => {
                if target_bytes == 0 {
                    SelectionState::TargetMet
                } else if order.is_empty() {
                    SelectionState::PoolExhausted
                } else {
                    order.shuffle(rng);
                    SelectionState::Accumulating(0)
                }
            }
            SelectionState::Accumulating(accumulated) => {
                let slot = idx % order.len();
                // A full pass that added nothing will never add anything.
                if idx > 0 && slot == 0 && accumulated == pass_start {
                    SelectionState::PoolExhausted
                } else {
                    if slot == 0 {
                        pass_start = accumulated;
                    }
                    visit(pool, order[slot], accumulated, &mut selection, &mut idx)?
                }
            }
            SelectionState::TargetMet => {
                debug!(
                    category = %pool.category,
                    target_bytes,
                    files = selection.files.len(),
                    "[tokmix:select] target met"
                );
                return Ok(selection);
            }
            SelectionState::PoolExhausted => {
                return Err(MixError::PoolExhausted {
                    category: pool.category.clone(),
                    target_bytes,
                    achieved_bytes: selection.achieved_bytes,
                });
            }
        };
    }
}

fn visit(
    pool: &CategoryPool,
    candidate: &Candidate,
    accumulated: ByteCount,
    selection: &mut CategorySelection,
    idx: &mut usize,
) -> Result<SelectionState, MixError> {
    *idx += 1;
    let remaining = selection.target_bytes - accumulated;
    match decide(candidate.size, remaining) {
        Visit::Done => Ok(SelectionState::TargetMet),
        Visit::Accept if candidate.size == 0 => Ok(SelectionState::Accumulating(accumulated)),
        Visit::Accept => {
            check_current_size(candidate)?;
            selection.files.push(candidate.path.clone());
            selection.achieved_bytes = accumulated + candidate.size;
            if selection.achieved_bytes == selection.target_bytes {
                Ok(SelectionState::TargetMet)
            } else {
                Ok(SelectionState::Accumulating(selection.achieved_bytes))
            }
        }
        Visit::Truncate(need) => {
            let destination = truncation_path(&pool.dir, &candidate.path, need);
            let truncated = TruncatedFile::create(&candidate.path, &destination, need)?;
            selection.files.push(truncated.path().to_path_buf());
            selection.achieved_bytes = accumulated + need;
            selection.truncated = Some(truncated);
            Ok(SelectionState::TargetMet)
        }
    }
}

/// Fail when the candidate is gone or its size differs from the one discovered.
fn check_current_size(candidate: &Candidate) -> Result<(), MixError> {
    let current = fs::metadata(&candidate.path)
        .map_err(MixError::at(&candidate.path))?
        .len();
    if current != candidate.size {
        return Err(MixError::Filesystem {
            path: candidate.path.clone(),
            source: io::Error::other(format!(
                "size changed since discovery: expected {} bytes, found {current}",
                candidate.size
            )),
        });
    }
    Ok(())
}
