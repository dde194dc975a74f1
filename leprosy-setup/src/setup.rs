//! The setup routine: version gate, dependency gate, directories, data.

use crate::bootstrap::python::{missing_packages, PythonRuntime};
use crate::bootstrap::versions::MIN_PYTHON;
use crate::bootstrap::{check_dependencies, check_python_version};
use crate::credentials::{self, CredentialResolver, Credentials};
use crate::layout::{
    count_entries, ProjectLayout, MIN_TEST_ENTRIES, MIN_TRAINING_ENTRIES, MODEL_MARKER,
    TEST_CLASS_DIRS, TRAINING_CLASS_DIRS,
};
use crate::preparation::run_data_preparation;
use crate::prompt::{ConfirmationPrompt, CredentialPrompt};
use crate::tasks::TaskFactory;
use anyhow::Result;
use std::fmt::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort setup.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Incompatible Python version (requires {} or higher)", MIN_PYTHON.short())]
    IncompatiblePython,

    #[error("Could not create required directories: {0}")]
    Directories(#[source] std::io::Error),
}

/// Outcome of the non-fatal stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupReport {
    pub dependencies_ok: bool,
    pub data_ready: bool,
}

/// Everything one setup run needs.
pub struct Setup<'a> {
    pub layout: ProjectLayout,
    pub python: &'a dyn PythonRuntime,
    pub tasks: &'a dyn TaskFactory,
    pub confirm: &'a dyn ConfirmationPrompt,
    pub credential_entry: &'a dyn CredentialPrompt,
    pub env_credentials: Option<Credentials>,
    pub credentials_file: PathBuf,
    pub skip_dependencies: bool,
}

impl Setup<'_> {
    /// Run every stage in order.
    ///
    /// Only [`SetupError`]s and prompt I/O failures are returned as errors;
    /// missing packages and incomplete data preparation are reported in the
    /// [`SetupReport`].
    pub fn run(&self) -> Result<SetupReport> {
        log::info!("Starting setup for Leprosy Detection AI Application...");

        if !check_python_version(self.python) {
            return Err(SetupError::IncompatiblePython.into());
        }

        let dependencies_ok = if self.skip_dependencies {
            log::info!("Skipping dependency check.");
            true
        } else {
            check_dependencies(self.python, self.confirm)?
        };
        if !dependencies_ok {
            log::warn!("Setup may not work correctly without required packages.");
        }

        self.layout
            .ensure_directories()
            .map_err(SetupError::Directories)?;

        let resolver = CredentialResolver {
            env: self.env_credentials.clone(),
            file: self.credentials_file.clone(),
            confirm: self.confirm,
            entry: self.credential_entry,
        };
        let data_ready = run_data_preparation(&self.layout, self.tasks, || {
            Ok(resolver.resolve()?.map(|(creds, _)| creds))
        })?;
        if !data_ready {
            log::warn!("Data preparation incomplete. The application may not work properly.");
        }

        log::info!("Setup completed successfully!");
        log::info!(
            "To run the application, use: {} main.py",
            self.python.executable().display()
        );

        Ok(SetupReport {
            dependencies_ok,
            data_ready,
        })
    }
}

/// Describe the current state without changing anything.
pub fn status_report(
    layout: &ProjectLayout,
    python: &dyn PythonRuntime,
    env_credentials: Option<&Credentials>,
    credentials_file: &std::path::Path,
) -> String {
    let mut info = String::new();

    let _ = writeln!(info, "Project directory: {}", layout.root().display());
    let _ = writeln!(info, "Python: {}", python.executable().display());
    match python.version() {
        Ok(v) => {
            let verdict = if v.meets(&MIN_PYTHON) { "ok" } else { "too old" };
            let _ = writeln!(info, "Python version: {v} ({verdict})");
        }
        Err(e) => {
            let _ = writeln!(info, "Python version: unknown ({e})");
        }
    }

    let missing = missing_packages(python);
    if missing.is_empty() {
        let _ = writeln!(info, "Packages: all installed");
    } else {
        let names: Vec<&str> = missing.iter().map(|p| p.name).collect();
        let _ = writeln!(info, "Packages missing: {}", names.join(", "));
    }

    match credentials::find_existing(env_credentials, credentials_file) {
        Some((creds, source)) => {
            let _ = writeln!(info, "Kaggle credentials: {} (from {source})", creds.username);
        }
        None => {
            let _ = writeln!(info, "Kaggle credentials: not configured");
        }
    }

    info.push('\n');
    let missing_dirs = layout.missing_directories();
    if missing_dirs.is_empty() {
        let _ = writeln!(info, "Directories: all present");
    } else {
        let _ = writeln!(info, "Directories missing: {}", missing_dirs.join(", "));
    }

    for (dirs, minimum) in [
        (TRAINING_CLASS_DIRS, MIN_TRAINING_ENTRIES),
        (TEST_CLASS_DIRS, MIN_TEST_ENTRIES),
    ] {
        for dir in dirs {
            let count = count_entries(&layout.path(dir));
            let _ = writeln!(info, "{dir}: {count} entries (need {minimum})");
        }
    }

    let _ = writeln!(
        info,
        "Model ({MODEL_MARKER}): {}",
        if layout.model_exists() { "present" } else { "not trained" }
    );

    info
}
