//! Download, sample preparation and training, run only while no model exists.

use crate::credentials::Credentials;
use crate::layout::ProjectLayout;
use crate::tasks::{Task, TaskFactory};
use anyhow::Result;

/// Run the preparation cascade.
///
/// Returns `Ok(false)` when a stage could not complete; later stages are not
/// attempted and earlier results are left in place. `credentials` is only
/// called when the dataset has to be downloaded.
pub fn run_data_preparation(
    layout: &ProjectLayout,
    tasks: &dyn TaskFactory,
    credentials: impl FnOnce() -> Result<Option<Credentials>>,
) -> Result<bool> {
    if layout.model_exists() {
        log::info!("Model already exists. Skipping data preparation and training.");
        return Ok(true);
    }

    if layout.training_data_ready() {
        log::info!("Datasets already downloaded.");
    } else {
        log::info!("Datasets not found or incomplete. Preparing to download...");
        let Some(creds) = credentials()? else {
            log::error!("Cannot prepare datasets without Kaggle credentials.");
            return Ok(false);
        };

        if !run_task(tasks.download(&creds).as_ref(), "Dataset preparation") {
            return Ok(false);
        }
    }

    if layout.test_samples_ready() {
        log::info!("Test samples already prepared.");
    } else {
        log::info!("Test samples not found or incomplete. Preparing...");
        if !run_task(tasks.prepare_samples().as_ref(), "Test sample preparation") {
            return Ok(false);
        }
    }

    log::info!("Training the model...");
    Ok(run_task(tasks.train().as_ref(), "Model training"))
}

/// Run one task, logging its outcome.
fn run_task(task: &dyn Task, label: &str) -> bool {
    log::info!("Running {}...", task.name());
    match task.run() {
        Ok(()) => {
            log::info!("{label} completed successfully.");
            true
        }
        Err(e) => {
            log::error!("{label} failed: {e}");
            false
        }
    }
}
