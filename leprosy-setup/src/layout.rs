//! Project directory layout, model marker and dataset completeness checks.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directories the application expects, relative to the project root.
pub const REQUIRED_DIRS: &[&str] = &[
    "model",
    "dataset",
    "dataset/leprosy_dataset",
    "dataset/leprosy_dataset/positive",
    "dataset/leprosy_dataset/negative",
    "dataset/leprosy_dataset/irrelevant",
    "test_samples",
    "test_samples/positive",
    "test_samples/negative",
    "test_results",
    "static/uploads",
    "instance",
];

/// Written by the training script; its presence means training is done.
pub const MODEL_MARKER: &str = "model/leprosy_classifier.pkl";

pub const TRAINING_CLASS_DIRS: &[&str] = &[
    "dataset/leprosy_dataset/positive",
    "dataset/leprosy_dataset/negative",
];
pub const MIN_TRAINING_ENTRIES: usize = 10;

pub const TEST_CLASS_DIRS: &[&str] = &["test_samples/positive", "test_samples/negative"];
pub const MIN_TEST_ENTRIES: usize = 5;

/// A project checkout rooted at a directory.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Create every required directory. Safe to run repeatedly.
    pub fn ensure_directories(&self) -> io::Result<()> {
        for dir in REQUIRED_DIRS {
            let path = self.path(dir);
            fs::create_dir_all(&path)?;
            log::info!("Directory {dir} ensured.");
        }
        Ok(())
    }

    /// Required directories that do not exist yet.
    pub fn missing_directories(&self) -> Vec<&'static str> {
        REQUIRED_DIRS
            .iter()
            .filter(|dir| !self.path(dir).is_dir())
            .copied()
            .collect()
    }

    pub fn model_exists(&self) -> bool {
        self.path(MODEL_MARKER).exists()
    }

    pub fn training_data_ready(&self) -> bool {
        self.all_populated(TRAINING_CLASS_DIRS, MIN_TRAINING_ENTRIES)
    }

    pub fn test_samples_ready(&self) -> bool {
        self.all_populated(TEST_CLASS_DIRS, MIN_TEST_ENTRIES)
    }

    fn all_populated(&self, dirs: &[&str], minimum: usize) -> bool {
        dirs.iter().all(|dir| count_entries(&self.path(dir)) >= minimum)
    }
}

/// Raw directory entries, without looking at what they are.
///
/// A missing or unreadable directory counts as empty.
pub fn count_entries(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
