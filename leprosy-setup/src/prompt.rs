//! Operator prompts, interactive or answered from configuration.

use crate::credentials::Credentials;
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

/// Asks a yes/no question.
pub trait ConfirmationPrompt {
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Asks for a Kaggle username and API key.
pub trait CredentialPrompt {
    fn ask_credentials(&self) -> Result<Credentials>;
}

/// Only an explicit "y" counts as yes.
pub fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Prompts on stderr and reads answers from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    fn ask(&self, question: &str) -> Result<String> {
        eprint!("{question}");
        io::stderr().flush()?;
        read_answer(&mut io::stdin().lock())
    }
}

/// Read one line; EOF yields an empty answer.
fn read_answer(reader: &mut impl BufRead) -> Result<String> {
    let mut input = String::new();
    reader
        .read_line(&mut input)
        .context("Failed to read from stdin")?;
    Ok(input.trim().to_string())
}

impl ConfirmationPrompt for TerminalPrompt {
    fn confirm(&self, question: &str) -> Result<bool> {
        Ok(is_yes(&self.ask(&format!("{question} (y/n): "))?))
    }
}

impl CredentialPrompt for TerminalPrompt {
    fn ask_credentials(&self) -> Result<Credentials> {
        let username = self.ask("Enter your Kaggle username: ")?;
        let key = self.ask("Enter your Kaggle API key: ")?;

        if username.is_empty() || key.is_empty() {
            anyhow::bail!("Kaggle username and API key must not be empty");
        }

        Ok(Credentials::new(&username, &key))
    }
}

/// Pre-decided answers for unattended runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl ConfirmationPrompt for FixedAnswer {
    fn confirm(&self, question: &str) -> Result<bool> {
        log::info!("{question} -> {}", if self.0 { "yes" } else { "no" });
        Ok(self.0)
    }
}

/// Refuses credential entry when stdin must not be read.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCredentialEntry;

impl CredentialPrompt for NoCredentialEntry {
    fn ask_credentials(&self) -> Result<Credentials> {
        anyhow::bail!("Credential entry is disabled in non-interactive mode")
    }
}
