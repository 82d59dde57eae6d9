//! CLI command implementations.

pub(crate) mod cache;
pub(crate) mod render;
pub(crate) mod settings;

use std::path::Path;
use std::sync::Arc;

use weave_cache::{ContentCache, FileCache, MemoryCache};
use weave_config::Config;

use crate::error::CliError;

pub(crate) use cache::CacheCommand;
pub(crate) use render::RenderArgs;
pub(crate) use settings::SettingsCommand;

/// Version stamped into the persistent cache; a new release starts cold.
const CACHE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Open the configured content cache.
fn open_cache(config: &Config) -> Result<Arc<dyn ContentCache>, CliError> {
    if !config.cache.persistent {
        return Ok(Arc::new(MemoryCache::new()));
    }
    ensure_project_dir(&config.store_resolved.project_dir)?;
    Ok(Arc::new(FileCache::new(
        config.store_resolved.cache_dir(),
        CACHE_VERSION,
    )))
}

/// Ensure the `.weave/` project directory exists with a `.gitignore`.
fn ensure_project_dir(project_dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(project_dir)?;

    let gitignore_path = project_dir.join(".gitignore");
    if !gitignore_path.exists() {
        let _ = std::fs::write(&gitignore_path, "# Automatically created by weave\n*\n");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_project_dir_writes_gitignore() {
        let tmp = tempfile::TempDir::new().unwrap();
        let project_dir = tmp.path().join(".weave");

        ensure_project_dir(&project_dir).unwrap();

        let gitignore = std::fs::read_to_string(project_dir.join(".gitignore")).unwrap();
        assert!(gitignore.ends_with("*\n"));
    }
}
