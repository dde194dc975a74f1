//! leprosy-setup - Prepare a checkout of the leprosy detection web application

mod bootstrap;
mod config;
mod credentials;
mod layout;
#[cfg(test)]
mod mock;
mod preparation;
mod prompt;
mod setup;
mod tasks;

use anyhow::{Context, Result};
use bootstrap::python::{PythonRuntime, SystemPython};
use clap::{Parser, Subcommand};
use config::SetupConfig;
use credentials::Credentials;
use layout::ProjectLayout;
use prompt::{ConfirmationPrompt, CredentialPrompt, FixedAnswer, NoCredentialEntry, TerminalPrompt};
use setup::Setup;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tasks::ScriptTasks;

#[derive(Parser, Debug)]
#[command(name = "leprosy-setup")]
#[command(about = "Check dependencies, create directories and prepare data for the leprosy detection app", long_about = None)]
#[command(version)]
struct Args {
    /// Project directory to set up (default: current directory)
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,

    /// Python interpreter to use (default: python3 or python from PATH)
    #[arg(long, global = true)]
    python: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short, long, conflicts_with = "no_input")]
    yes: bool,

    /// Never prompt; confirmations answer no and credentials cannot be entered
    #[arg(long)]
    no_input: bool,

    /// Skip the Python package check
    #[arg(long)]
    skip_deps: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false, global = true)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report what setup would find, without changing anything
    Status,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the default Python interpreter
    SetPython {
        /// Interpreter path or name on PATH
        path: PathBuf,
    },
    /// Set the default project directory
    SetProjectDir {
        /// Path to the application checkout
        path: PathBuf,
    },
    /// Answer yes to confirmations by default
    SetAssumeYes {
        /// true or false
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            log::error!("Setup failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Log as `2024-05-01 12:00:00,123 - INFO - message`. RUST_LOG overrides the level.
fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.level(),
                record.args()
            )
        })
        .init();
}

fn run(args: &Args) -> Result<ExitCode> {
    if let Some(Commands::Config { action }) = &args.command {
        handle_config_command(action)?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = SetupConfig::load().context("Failed to load configuration")?;

    let project_dir = match args.project_dir.clone().or(config.project_dir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let layout = ProjectLayout::new(project_dir);

    let python_path = args.python.as_deref().or(config.python.as_deref());
    let python = SystemPython::discover(python_path)?;
    let credentials_file = credentials::kaggle_json_path()?;
    let env_credentials = Credentials::from_env();

    log::debug!("Project: {}", layout.root().display());
    log::debug!("Python: {}", python.executable().display());
    log::debug!("Credentials file: {}", credentials_file.display());

    if let Some(Commands::Status) = &args.command {
        print!(
            "{}",
            setup::status_report(
                &layout,
                &python,
                env_credentials.as_ref(),
                &credentials_file
            )
        );
        return Ok(ExitCode::SUCCESS);
    }

    let terminal = TerminalPrompt;
    let (always_yes, always_no) = (FixedAnswer(true), FixedAnswer(false));
    let (confirm, credential_entry): (&dyn ConfirmationPrompt, &dyn CredentialPrompt) =
        if args.no_input {
            (&always_no, &NoCredentialEntry)
        } else if args.yes || config.assume_yes {
            (&always_yes, &terminal)
        } else {
            (&terminal, &terminal)
        };

    let tasks = ScriptTasks::new(python.executable(), layout.root());

    let setup = Setup {
        layout,
        python: &python,
        tasks: &tasks,
        confirm,
        credential_entry,
        env_credentials,
        credentials_file,
        skip_dependencies: args.skip_deps,
    };
    let report = setup.run()?;
    if !report.dependencies_ok || !report.data_ready {
        log::info!("Rerun leprosy-setup once the warnings above are resolved.");
    }

    Ok(ExitCode::SUCCESS)
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = SetupConfig::load()?;
            println!("Configuration file: {:?}", SetupConfig::config_path()?);
            println!();
            match &config.python {
                Some(python) => println!("python = \"{}\"", python.display()),
                None => println!("python = (python3/python from PATH)"),
            }
            match &config.project_dir {
                Some(dir) => println!("project_dir = \"{}\"", dir.display()),
                None => println!("project_dir = (current directory)"),
            }
            println!("assume_yes = {}", config.assume_yes);
        }
        ConfigAction::SetPython { path } => {
            let mut config = SetupConfig::load()?;
            config.python = Some(path.clone());
            config.save()?;
            println!("Default Python set to: {}", path.display());
        }
        ConfigAction::SetProjectDir { path } => {
            let mut config = SetupConfig::load()?;
            config.project_dir = Some(path.clone());
            config.save()?;
            println!("Default project directory set to: {}", path.display());
        }
        ConfigAction::SetAssumeYes { value } => {
            let mut config = SetupConfig::load()?;
            config.assume_yes = *value;
            config.save()?;
            println!("assume_yes set to: {}", value);
        }
    }
    Ok(())
}
