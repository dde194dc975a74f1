//! Test doubles for the interpreter, operator prompts and external tasks.

use crate::bootstrap::python::{PythonError, PythonRuntime, REQUIRED_PACKAGES};
use crate::bootstrap::versions::{PythonVersion, VersionParseError};
use crate::credentials::Credentials;
use crate::prompt::{ConfirmationPrompt, CredentialPrompt};
use crate::tasks::{Task, TaskError, TaskFactory};
use anyhow::Result;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// An interpreter with a fixed version and set of importable modules.
pub struct MockPython {
    path: PathBuf,
    version: Option<PythonVersion>,
    importable: RefCell<Vec<String>>,
    install_succeeds: bool,
    import_probes: Cell<usize>,
    installs: RefCell<Vec<Vec<String>>>,
}

impl MockPython {
    /// An interpreter with nothing installed.
    pub fn new(version: PythonVersion) -> Self {
        Self {
            path: PathBuf::from("/usr/bin/python3"),
            version: Some(version),
            importable: RefCell::new(Vec::new()),
            install_succeeds: true,
            import_probes: Cell::new(0),
            installs: RefCell::new(Vec::new()),
        }
    }

    /// An interpreter whose `--version` output cannot be parsed.
    pub fn broken() -> Self {
        Self {
            version: None,
            ..Self::new(PythonVersion::new(0, 0, 0))
        }
    }

    pub fn with_modules(self, modules: &[&str]) -> Self {
        self.importable
            .borrow_mut()
            .extend(modules.iter().map(|m| m.to_string()));
        self
    }

    pub fn with_all_modules_except(self, missing: &[&str]) -> Self {
        let modules: Vec<&str> = REQUIRED_PACKAGES
            .iter()
            .map(|p| p.module)
            .filter(|m| !missing.contains(m))
            .collect();
        self.with_modules(&modules)
    }

    pub fn with_failing_install(mut self) -> Self {
        self.install_succeeds = false;
        self
    }

    pub fn import_probes(&self) -> usize {
        self.import_probes.get()
    }

    pub fn installs(&self) -> Vec<Vec<String>> {
        self.installs.borrow().clone()
    }
}

impl PythonRuntime for MockPython {
    fn executable(&self) -> &Path {
        &self.path
    }

    fn version(&self) -> Result<PythonVersion, PythonError> {
        self.version
            .ok_or_else(|| VersionParseError("garbage".to_string()).into())
    }

    fn can_import(&self, module: &str) -> bool {
        self.import_probes.set(self.import_probes.get() + 1);
        self.importable.borrow().iter().any(|m| m == module)
    }

    fn pip_install(&self, packages: &[&str]) -> Result<(), TaskError> {
        self.installs
            .borrow_mut()
            .push(packages.iter().map(|p| p.to_string()).collect());

        if !self.install_succeeds {
            return Err(TaskError::Failed {
                task: "pip install".to_string(),
                code: Some(1),
            });
        }

        // A successful install makes the modules importable.
        let mut importable = self.importable.borrow_mut();
        for package in REQUIRED_PACKAGES.iter().filter(|p| packages.contains(&p.name)) {
            importable.push(package.module.to_string());
        }
        Ok(())
    }
}

/// Answers confirmations from a queue; an exhausted queue answers no.
pub struct ScriptedPrompt {
    answers: RefCell<VecDeque<bool>>,
    questions: RefCell<Vec<String>>,
    credentials: Option<Credentials>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().copied().collect()),
            questions: RefCell::new(Vec::new()),
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, username: &str, key: &str) -> Self {
        self.credentials = Some(Credentials::new(username, key));
        self
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.borrow().clone()
    }
}

impl ConfirmationPrompt for ScriptedPrompt {
    fn confirm(&self, question: &str) -> Result<bool> {
        self.questions.borrow_mut().push(question.to_string());
        Ok(self.answers.borrow_mut().pop_front().unwrap_or(false))
    }
}

impl CredentialPrompt for ScriptedPrompt {
    fn ask_credentials(&self) -> Result<Credentials> {
        self.credentials
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no scripted credentials"))
    }
}

/// Records which tasks ran, optionally failing one of them by name.
#[derive(Default)]
pub struct RecordingTasks {
    log: Rc<RefCell<Vec<String>>>,
    download_credentials: Rc<RefCell<Vec<Credentials>>>,
    failing: Option<&'static str>,
}

impl RecordingTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(task: &'static str) -> Self {
        Self {
            failing: Some(task),
            ..Self::default()
        }
    }

    pub fn runs(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn download_credentials(&self) -> Vec<Credentials> {
        self.download_credentials.borrow().clone()
    }

    fn task(&self, name: &'static str) -> Box<dyn Task> {
        Box::new(RecordedTask {
            name,
            log: Rc::clone(&self.log),
            fails: self.failing == Some(name),
        })
    }
}

impl TaskFactory for RecordingTasks {
    fn download(&self, credentials: &Credentials) -> Box<dyn Task> {
        self.download_credentials
            .borrow_mut()
            .push(credentials.clone());
        self.task(crate::tasks::DOWNLOAD_SCRIPT)
    }

    fn prepare_samples(&self) -> Box<dyn Task> {
        self.task(crate::tasks::SAMPLES_SCRIPT)
    }

    fn train(&self) -> Box<dyn Task> {
        self.task(crate::tasks::TRAIN_SCRIPT)
    }
}

struct RecordedTask {
    name: &'static str,
    log: Rc<RefCell<Vec<String>>>,
    fails: bool,
}

impl Task for RecordedTask {
    fn name(&self) -> &str {
        self.name
    }

    fn run(&self) -> Result<(), TaskError> {
        self.log.borrow_mut().push(self.name.to_string());
        if self.fails {
            return Err(TaskError::Failed {
                task: self.name.to_string(),
                code: Some(1),
            });
        }
        Ok(())
    }
}
