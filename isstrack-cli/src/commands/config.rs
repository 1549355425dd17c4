//! Configuration management CLI commands.
//!
//! Provides `config show`, `config path` and `config init`.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use isstrack::config::ConfigFile;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Show the configuration file path
    Path,

    /// Write a configuration file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<PathBuf>) -> Result<(), CliError> {
    let path = config_path
        .or_else(ConfigFile::default_path)
        .ok_or_else(|| CliError::Config("Could not determine home directory".to_string()))?;

    match command {
        ConfigCommands::Show => run_show(&path),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Init { force } => run_init(&path, force),
    }
}

fn run_show(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load(path)?;

    let mut rendered = Vec::new();
    config
        .to_ini()
        .write_to(&mut rendered)
        .map_err(|e| CliError::Config(format!("Failed to render configuration: {}", e)))?;

    if !path.exists() {
        println!("# {} not found, showing defaults", path.display());
    }
    print!("{}", String::from_utf8_lossy(&rendered));
    Ok(())
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        )));
    }

    ConfigFile::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        run_init(&path, false).unwrap();
        assert!(path.exists());
        assert!(matches!(run_init(&path, false), Err(CliError::Config(_))));
        run_init(&path, true).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded, ConfigFile::default());
    }
}
