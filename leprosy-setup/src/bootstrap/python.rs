//! Python interpreter discovery, import probing and pip installs.

use super::versions::{PythonVersion, VersionParseError};
use crate::tasks::TaskError;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// A pip distribution and the module name it is imported as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Package {
    pub name: &'static str,
    pub module: &'static str,
}

/// Python packages the web application imports.
pub const REQUIRED_PACKAGES: &[Package] = &[
    Package { name: "flask", module: "flask" },
    Package { name: "flask-login", module: "flask_login" },
    Package { name: "flask-sqlalchemy", module: "flask_sqlalchemy" },
    Package { name: "flask-wtf", module: "flask_wtf" },
    Package { name: "matplotlib", module: "matplotlib" },
    Package { name: "numpy", module: "numpy" },
    Package { name: "opencv-python", module: "cv2" },
    Package { name: "pandas", module: "pandas" },
    Package { name: "scikit-learn", module: "sklearn" },
    Package { name: "pillow", module: "PIL" },
    Package { name: "werkzeug", module: "werkzeug" },
    Package { name: "gunicorn", module: "gunicorn" },
];

/// Interpreter names tried on PATH when none is configured.
const PYTHON_CANDIDATES: &[&str] = &["python3", "python"];

#[derive(Debug, Error)]
pub enum PythonError {
    #[error("No Python interpreter found on PATH (tried {})", PYTHON_CANDIDATES.join(", "))]
    NotFound,

    #[error("Python interpreter not found at {0}")]
    MissingExecutable(PathBuf),

    #[error("Failed to run {path}: {source}")]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Version(#[from] VersionParseError),
}

/// The operations setup needs from a Python installation.
pub trait PythonRuntime {
    /// Path used to launch the interpreter.
    fn executable(&self) -> &Path;

    /// Version reported by the interpreter.
    fn version(&self) -> Result<PythonVersion, PythonError>;

    /// Whether `import <module>` succeeds.
    fn can_import(&self, module: &str) -> bool;

    /// Install distributions with `python -m pip install`.
    fn pip_install(&self, packages: &[&str]) -> Result<(), TaskError>;
}

/// The interpreter installed on this machine.
#[derive(Debug, Clone)]
pub struct SystemPython {
    path: PathBuf,
}

impl SystemPython {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use the configured interpreter, or the first candidate found on PATH.
    pub fn discover(configured: Option<&Path>) -> Result<Self, PythonError> {
        if let Some(path) = configured {
            // Bare names like "python3.11" are resolved through PATH.
            let resolved = which::which(path)
                .map_err(|_| PythonError::MissingExecutable(path.to_path_buf()))?;
            return Ok(Self::new(resolved));
        }

        PYTHON_CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(Self::new)
            .ok_or(PythonError::NotFound)
    }
}

impl PythonRuntime for SystemPython {
    fn executable(&self) -> &Path {
        &self.path
    }

    fn version(&self) -> Result<PythonVersion, PythonError> {
        let output = Command::new(&self.path)
            .arg("--version")
            .output()
            .map_err(|source| PythonError::Launch {
                path: self.path.clone(),
                source,
            })?;

        // Python 2 printed its version to stderr.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let text = if stdout.trim().is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            stdout.into_owned()
        };

        Ok(PythonVersion::from_version_output(&text)?)
    }

    fn can_import(&self, module: &str) -> bool {
        Command::new(&self.path)
            .args(["-c", &format!("import {module}")])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn pip_install(&self, packages: &[&str]) -> Result<(), TaskError> {
        let task = "pip install";
        log::debug!("Running {} -m pip install {}", self.path.display(), packages.join(" "));

        // pip output streams straight to the terminal.
        let status = Command::new(&self.path)
            .args(["-m", "pip", "install"])
            .args(packages)
            .status()
            .map_err(|source| TaskError::Launch {
                task: task.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(TaskError::Failed {
                task: task.to_string(),
                code: status.code(),
            });
        }

        Ok(())
    }
}

/// Required packages whose module cannot be imported.
pub fn missing_packages(python: &dyn PythonRuntime) -> Vec<Package> {
    REQUIRED_PACKAGES
        .iter()
        .filter(|package| !python.can_import(package.module))
        .copied()
        .collect()
}
