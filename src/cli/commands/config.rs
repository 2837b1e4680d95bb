//! `relia config` command - Inspect the layered configuration

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::common::serialize;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::KEYS;
use crate::core::project::Project;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration values
    Show(ShowArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let effective = config.effective();

    if let Some(key) = &args.key {
        if !KEYS.iter().any(|(k, _)| *k == key.as_str()) {
            return Err(miette::miette!(
                "Unknown key '{}'. Run 'relia config keys' for the list.",
                key
            ));
        }
        let value = serde_yml::to_value(&effective).into_diagnostic()?;
        match value.get(key.as_str()) {
            Some(v) => print!("{}", serde_yml::to_string(v).into_diagnostic()?),
            None => return Err(miette::miette!("Key '{}' is not set", key)),
        }
        return Ok(());
    }

    match global.format.resolve(&config.default_format()) {
        OutputFormat::Json => print!("{}", serialize(&effective, OutputFormat::Json)?),
        OutputFormat::Yaml => print!("{}", serialize(&effective, OutputFormat::Yaml)?),
        _ => {
            println!("{}", style("Effective Configuration").bold().underlined());
            println!();
            print!("{}", serialize(&effective, OutputFormat::Yaml)?);
            println!();
            println!("{}", style("Config Sources (in priority order):").dim());
            println!("  1. Command-line flags");
            println!("  2. Environment variables (RELIA_MISSION_TIME, RELIA_TRIALS, RELIA_SEED)");
            println!("  3. Project config (.relia/config.yaml)");
            println!("  4. Global config");
        }
    }
    Ok(())
}

fn run_path() -> Result<()> {
    println!("{}", style("Configuration file paths:").bold());
    println!();

    match Config::global_config_path() {
        Some(path) => {
            println!("  {} {}", style("Global:").cyan(), path.display());
            print_exists(path.exists(), 9);
        }
        None => println!(
            "  {} {}",
            style("Global:").cyan(),
            style("(no home directory)").dim()
        ),
    }

    println!();
    match Project::discover() {
        Ok(project) => {
            let path = project.config_path();
            println!("  {} {}", style("Project:").cyan(), path.display());
            print_exists(path.exists(), 10);
        }
        Err(_) => println!(
            "  {} {}",
            style("Project:").cyan(),
            style("(not in a relia project)").dim()
        ),
    }
    Ok(())
}

fn print_exists(exists: bool, indent: usize) {
    if exists {
        println!("{:indent$} {}", "", style("(exists)").green(), indent = indent);
    } else {
        println!("{:indent$} {}", "", style("(not created)").dim(), indent = indent);
    }
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();
    for (key, description) in KEYS {
        println!("  {:<20} {}", style(key).cyan(), style(description).dim());
    }
    Ok(())
}
