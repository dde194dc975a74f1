//! Kaggle API credentials: lookup, interactive entry and persistence.
//!
//! Sources are tried in order: environment variables, then
//! `~/.kaggle/kaggle.json`, then the operator.

use crate::prompt::{ConfirmationPrompt, CredentialPrompt};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const USERNAME_VAR: &str = "KAGGLE_USERNAME";
pub const KEY_VAR: &str = "KAGGLE_KEY";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub key: String,
}

// Keep the API key out of debug logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Where a set of credentials came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    File,
    Interactive,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CredentialSource::Environment => "environment variables",
            CredentialSource::File => "kaggle.json",
            CredentialSource::Interactive => "interactive entry",
        };
        f.write_str(s)
    }
}

impl Credentials {
    pub fn new(username: &str, key: &str) -> Self {
        Self {
            username: username.to_string(),
            key: key.to_string(),
        }
    }

    /// Both variables must be set and non-empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let username = lookup(USERNAME_VAR).filter(|v| !v.is_empty())?;
        let key = lookup(KEY_VAR).filter(|v| !v.is_empty())?;
        Some(Self { username, key })
    }

    /// Read `KAGGLE_USERNAME` / `KAGGLE_KEY` from the process environment.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from a kaggle.json file. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let creds = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(creds))
    }

    /// Write to a kaggle.json file readable only by the owner.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string(self)?;
        let mut file = open_private(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        file.write_all(content.as_bytes())?;
        restrict_permissions(path)?;

        Ok(())
    }

    /// Variables to set on a child process that talks to Kaggle.
    pub fn env_vars(&self) -> [(&'static str, &str); 2] {
        [(USERNAME_VAR, &self.username), (KEY_VAR, &self.key)]
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::File::create(path)
}

// An existing file keeps its old mode on open, so set it explicitly.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Get the kaggle.json path: ~/.kaggle/kaggle.json
pub fn kaggle_json_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(".kaggle").join("kaggle.json"))
}

/// Finds credentials without asking the operator.
pub fn find_existing(
    env: Option<&Credentials>,
    file: &Path,
) -> Option<(Credentials, CredentialSource)> {
    if let Some(creds) = env {
        return Some((creds.clone(), CredentialSource::Environment));
    }

    match Credentials::load(file) {
        Ok(Some(creds)) => Some((creds, CredentialSource::File)),
        Ok(None) => None,
        Err(e) => {
            log::warn!("Ignoring unreadable Kaggle credentials: {e:#}");
            None
        }
    }
}

/// Resolves credentials once per run, asking the operator as a last resort.
pub struct CredentialResolver<'a> {
    pub env: Option<Credentials>,
    pub file: PathBuf,
    pub confirm: &'a dyn ConfirmationPrompt,
    pub entry: &'a dyn CredentialPrompt,
}

impl CredentialResolver<'_> {
    /// `Ok(None)` means the run continues without credentials.
    pub fn resolve(&self) -> Result<Option<(Credentials, CredentialSource)>> {
        if let Some((creds, source)) = find_existing(self.env.as_ref(), &self.file) {
            match source {
                CredentialSource::Environment => {
                    log::info!("Kaggle credentials found in environment variables.")
                }
                _ => log::info!("Kaggle credentials found in {}", self.file.display()),
            }
            return Ok(Some((creds, source)));
        }

        log::warn!("Kaggle credentials not found in environment variables or kaggle.json.");
        if !self.confirm.confirm("Do you want to set up Kaggle credentials now?")? {
            log::warn!("Continuing without Kaggle credentials.");
            return Ok(None);
        }

        let creds = match self.entry.ask_credentials() {
            Ok(creds) => creds,
            Err(e) => {
                log::warn!("Continuing without Kaggle credentials: {e:#}");
                return Ok(None);
            }
        };

        if self
            .confirm
            .confirm("Do you want to persist these credentials for future sessions?")?
        {
            creds.save(&self.file)?;
            log::info!("Kaggle credentials saved to {}", self.file.display());
        }

        Ok(Some((creds, CredentialSource::Interactive)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedPrompt;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let creds = Credentials::from_lookup(lookup(&[(USERNAME_VAR, "alice"), (KEY_VAR, "k1")]));
        assert_eq!(creds, Some(Credentials::new("alice", "k1")));

        assert!(Credentials::from_lookup(lookup(&[(USERNAME_VAR, "alice")])).is_none());
        assert!(Credentials::from_lookup(lookup(&[(USERNAME_VAR, ""), (KEY_VAR, "k1")])).is_none());
    }

    #[test]
    fn test_debug_redacts_key() {
        let out = format!("{:?}", Credentials::new("alice", "topsecret"));
        assert!(out.contains("alice"));
        assert!(!out.contains("topsecret"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Credentials::load(&dir.path().join("kaggle.json")).unwrap().is_none());
    }

    #[test]
    fn test_load_kaggle_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kaggle.json");
        fs::write(&path, r#"{"username":"bob","key":"abc123"}"#).unwrap();
        assert_eq!(
            Credentials::load(&path).unwrap(),
            Some(Credentials::new("bob", "abc123"))
        );
    }

    #[test]
    fn test_save_creates_parent_and_restricts_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".kaggle").join("kaggle.json");
        Credentials::new("carol", "xyz").save(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["username"], "carol");
        assert_eq!(value["key"], "xyz");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_save_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kaggle.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        Credentials::new("dave", "k").save(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_env_takes_precedence_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kaggle.json");
        Credentials::new("file-user", "file-key").save(&path).unwrap();

        let env = Credentials::new("env-user", "env-key");
        let (creds, source) = find_existing(Some(&env), &path).unwrap();
        assert_eq!(creds.username, "env-user");
        assert_eq!(source, CredentialSource::Environment);

        let (creds, source) = find_existing(None, &path).unwrap();
        assert_eq!(creds.username, "file-user");
        assert_eq!(source, CredentialSource::File);
    }

    #[test]
    fn test_malformed_file_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kaggle.json");
        fs::write(&path, "not json").unwrap();
        assert!(find_existing(None, &path).is_none());
    }

    #[test]
    fn test_resolve_existing_does_not_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let prompt = ScriptedPrompt::new(&[]);
        let resolver = CredentialResolver {
            env: Some(Credentials::new("alice", "k")),
            file: dir.path().join("kaggle.json"),
            confirm: &prompt,
            entry: &prompt,
        };

        let (_, source) = resolver.resolve().unwrap().unwrap();
        assert_eq!(source, CredentialSource::Environment);
        assert!(prompt.questions().is_empty());
    }

    #[test]
    fn test_resolve_interactive_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".kaggle").join("kaggle.json");
        let prompt = ScriptedPrompt::new(&[true, true]).with_credentials("erin", "key-1");
        let resolver = CredentialResolver {
            env: None,
            file: path.clone(),
            confirm: &prompt,
            entry: &prompt,
        };

        let (creds, source) = resolver.resolve().unwrap().unwrap();
        assert_eq!(creds, Credentials::new("erin", "key-1"));
        assert_eq!(source, CredentialSource::Interactive);
        assert_eq!(Credentials::load(&path).unwrap(), Some(creds));
    }

    #[test]
    fn test_resolve_interactive_without_persisting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kaggle.json");
        let prompt = ScriptedPrompt::new(&[true, false]).with_credentials("erin", "key-1");
        let resolver = CredentialResolver {
            env: None,
            file: path.clone(),
            confirm: &prompt,
            entry: &prompt,
        };

        assert!(resolver.resolve().unwrap().is_some());
        assert!(!path.exists());
    }

    #[test]
    fn test_resolve_declined() {
        let dir = tempfile::tempdir().unwrap();
        let prompt = ScriptedPrompt::new(&[false]);
        let resolver = CredentialResolver {
            env: None,
            file: dir.path().join("kaggle.json"),
            confirm: &prompt,
            entry: &prompt,
        };

        assert!(resolver.resolve().unwrap().is_none());
        assert_eq!(prompt.questions().len(), 1);
    }

    #[test]
    fn test_resolve_entry_failure_is_soft() {
        let dir = tempfile::tempdir().unwrap();
        // Agrees to enter credentials but has none to give.
        let prompt = ScriptedPrompt::new(&[true]);
        let resolver = CredentialResolver {
            env: None,
            file: dir.path().join("kaggle.json"),
            confirm: &prompt,
            entry: &prompt,
        };

        assert!(resolver.resolve().unwrap().is_none());
    }
}
