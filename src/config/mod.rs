use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use dotenvy::dotenv;
use serde::Deserialize;

/// Command line flags. Each one overrides the matching environment setting.
#[derive(Debug, Parser)]
#[command(name = "taskboard", version, about = "Team Kanban board in the terminal")]
pub struct Cli {
    /// Postgres connection URL (overrides DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run against an in-memory backend seeded with demo accounts
    #[arg(long)]
    pub demo: bool,

    /// Apply the bundled schema migrations before starting
    #[arg(long)]
    pub migrate: bool,

    /// File that receives the application log (overrides LOG_FILE)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error (overrides LOG_LEVEL)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Configuration for the application
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Database connection URL
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    #[serde(skip)]
    pub demo: bool,

    #[serde(skip)]
    pub migrate: bool,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("taskboard.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Variables from a `.env` file are loaded first if the file exists.
    pub fn load() -> Result<Self> {
        dotenv().ok();

        Self::from_vars(std::env::vars())
    }

    /// Deserialize configuration from explicit key/value pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter::<_, Config>(vars)?)
    }

    pub fn apply_cli(&mut self, cli: Cli) {
        if let Some(url) = cli.database_url {
            self.database_url = Some(url);
        }
        if let Some(path) = cli.log_file {
            self.log_file = path;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self.demo = cli.demo;
        self.migrate = cli.migrate;
    }

    /// Get a direct reference to the database URL
    pub fn database_url(&self) -> Result<&str> {
        match self.database_url.as_deref() {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => bail!("DATABASE_URL is not set; pass --database-url or run with --demo"),
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }
}

/// Load configuration from the environment and apply command line overrides.
pub fn init(cli: Cli) -> Result<Config> {
    let mut config = Config::load()?;
    config.apply_cli(cli);

    Ok(config)
}
