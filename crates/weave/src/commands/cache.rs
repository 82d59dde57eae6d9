//! `weave cache` command implementations.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use weave_cache::{ContentCache, FileCache};
use weave_config::Config;

use super::CACHE_VERSION;
use crate::error::CliError;
use crate::output::Output;

/// Content cache subcommands.
#[derive(Subcommand)]
pub(crate) enum CacheCommand {
    /// Drop all cached content. Does not ask for confirmation.
    Clear(ClearArgs),
}

impl CacheCommand {
    /// Execute the cache command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Clear(args) => args.execute(),
        }
    }
}

/// Arguments for `cache clear`.
#[derive(Args)]
pub(crate) struct ClearArgs {
    /// Path to configuration file (default: auto-discover weave.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ClearArgs {
    fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let cache_dir = config.store_resolved.cache_dir();

        // The in-memory cache lives and dies with a single render.
        if !cache_dir.exists() {
            output.info(&format!("No cache at {}", cache_dir.display()));
            return Ok(());
        }

        FileCache::new(cache_dir.clone(), CACHE_VERSION).clear();
        output.success(&format!("Cleared cache at {}", cache_dir.display()));
        Ok(())
    }
}
