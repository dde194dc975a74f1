//! External preparation steps, each run as a Python script in the project root.

use crate::credentials::Credentials;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Downloads the Kaggle dataset into `dataset/leprosy_dataset`.
pub const DOWNLOAD_SCRIPT: &str = "prepare_kaggle_data.py";
/// Copies a held-out set of images into `test_samples`.
pub const SAMPLES_SCRIPT: &str = "prepare_test_samples.py";
/// Trains the classifier and writes the model artifact.
pub const TRAIN_SCRIPT: &str = "retrain_model.py";

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Failed to launch {task}: {source}")]
    Launch {
        task: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{task} failed ({})", .code.map(|c| format!("exit code {c}")).unwrap_or_else(|| "terminated by signal".to_string()))]
    Failed { task: String, code: Option<i32> },
}

/// A unit of external work that only reports pass/fail.
pub trait Task {
    fn name(&self) -> &str;

    fn run(&self) -> Result<(), TaskError>;
}

/// Creates the tasks used by the data-preparation cascade.
pub trait TaskFactory {
    fn download(&self, credentials: &Credentials) -> Box<dyn Task>;

    fn prepare_samples(&self) -> Box<dyn Task>;

    fn train(&self) -> Box<dyn Task>;
}

/// Runs `<python> <script>` from the project root, inheriting stdio.
#[derive(Debug, Clone)]
pub struct ScriptTask {
    python: PathBuf,
    script: String,
    workdir: PathBuf,
    envs: Vec<(String, String)>,
}

impl ScriptTask {
    pub fn new(python: &Path, script: &str, workdir: &Path) -> Self {
        Self {
            python: python.to_path_buf(),
            script: script.to_string(),
            workdir: workdir.to_path_buf(),
            envs: Vec::new(),
        }
    }

    /// Set an environment variable on the child process only.
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    /// Expose Kaggle credentials to the child through its environment.
    pub fn with_credentials(self, credentials: &Credentials) -> Self {
        credentials
            .env_vars()
            .into_iter()
            .fold(self, |task, (key, value)| task.with_env(key, value))
    }
}

impl Task for ScriptTask {
    fn name(&self) -> &str {
        &self.script
    }

    fn run(&self) -> Result<(), TaskError> {
        log::debug!(
            "Launching {} {} in {}",
            self.python.display(),
            self.script,
            self.workdir.display()
        );

        let status = Command::new(&self.python)
            .arg(&self.script)
            .current_dir(&self.workdir)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .status()
            .map_err(|source| TaskError::Launch {
                task: self.script.clone(),
                source,
            })?;

        if !status.success() {
            return Err(TaskError::Failed {
                task: self.script.clone(),
                code: status.code(),
            });
        }

        Ok(())
    }
}

/// The project's preparation scripts, run with the setup interpreter.
#[derive(Debug, Clone)]
pub struct ScriptTasks {
    python: PathBuf,
    workdir: PathBuf,
}

impl ScriptTasks {
    pub fn new(python: &Path, workdir: &Path) -> Self {
        Self {
            python: python.to_path_buf(),
            workdir: workdir.to_path_buf(),
        }
    }

    fn script(&self, name: &str) -> ScriptTask {
        ScriptTask::new(&self.python, name, &self.workdir)
    }
}

impl TaskFactory for ScriptTasks {
    fn download(&self, credentials: &Credentials) -> Box<dyn Task> {
        Box::new(self.script(DOWNLOAD_SCRIPT).with_credentials(credentials))
    }

    fn prepare_samples(&self) -> Box<dyn Task> {
        Box::new(self.script(SAMPLES_SCRIPT))
    }

    fn train(&self) -> Box<dyn Task> {
        Box::new(self.script(TRAIN_SCRIPT))
    }
}
