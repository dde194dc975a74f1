//! Precondition gates for the Python side of the application.
//!
//! - Interpreter version check
//! - Required package check, with an optional pip install

pub mod python;
pub mod versions;

use crate::prompt::ConfirmationPrompt;
use anyhow::Result;
use python::{missing_packages, PythonRuntime};
use versions::MIN_PYTHON;

/// Check that the interpreter is new enough to run the application.
pub fn check_python_version(python: &dyn PythonRuntime) -> bool {
    match python.version() {
        Ok(version) if version.meets(&MIN_PYTHON) => {
            log::info!("Python version {} detected.", version.short());
            true
        }
        Ok(version) => {
            log::error!(
                "Python {} or higher is required (found {}).",
                MIN_PYTHON.short(),
                version
            );
            false
        }
        Err(e) => {
            log::error!("Could not determine Python version: {e}");
            false
        }
    }
}

/// Check that every required package imports, offering to install the rest.
///
/// `Ok(false)` means packages are still missing; setup can continue.
pub fn check_dependencies(
    python: &dyn PythonRuntime,
    confirm: &dyn ConfirmationPrompt,
) -> Result<bool> {
    let missing = missing_packages(python);

    for package in python::REQUIRED_PACKAGES {
        if missing.contains(package) {
            log::warn!("Package {} not found.", package.name);
        } else {
            log::info!("Package {} found.", package.name);
        }
    }

    if missing.is_empty() {
        return Ok(true);
    }

    let names: Vec<&str> = missing.iter().map(|p| p.name).collect();
    log::error!("Missing packages: {}", names.join(", "));

    if !confirm.confirm("Do you want to install missing packages?")? {
        log::warn!("Continuing without installing missing packages.");
        return Ok(false);
    }

    match python.pip_install(&names) {
        Ok(()) => {
            log::info!("Packages installed successfully.");
            Ok(true)
        }
        Err(e) => {
            log::error!("Failed to install packages: {e}");
            Ok(false)
        }
    }
}
