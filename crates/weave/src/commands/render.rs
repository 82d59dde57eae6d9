//! `weave render` command implementation.

use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use weave_config::{CliSettings, Config};
use weave_embed::{DocumentContext, EmbedEngine};
use weave_renderer::PulldownHost;
use weave_storage::{FileSystem, FsStorage, UreqTransport};

use super::open_cache;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Documents to render, relative to the store base directory.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Path to configuration file (default: auto-discover weave.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Document store base directory (overrides config).
    #[arg(short, long)]
    base_dir: Option<PathBuf>,

    /// Allow http/https embeds for this run.
    #[arg(long)]
    allow_network: bool,

    /// Allow the inline directive for this run.
    #[arg(long)]
    allow_inline_html: bool,

    /// Keep fetched content on disk between runs.
    #[arg(long)]
    persistent_cache: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// All documents share one engine, so content embedded by several of them
    /// is fetched once.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or a document cannot be read.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            base_dir: self.base_dir,
            persistent_cache: self.persistent_cache.then_some(true),
            allow_network_access: self.allow_network.then_some(true),
            allow_inline_html: self.allow_inline_html.then_some(true),
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let settings = Arc::new(config.open_settings()?);
        let cache = open_cache(&config)?;

        let base_dir = &config.store_resolved.base_dir;
        tracing::info!(base_dir = %base_dir.display(), "Rendering from store");

        let fs = Arc::new(FsStorage::new(base_dir.clone()));
        let engine = EmbedEngine::new(
            Arc::new(PulldownHost::new()),
            Arc::clone(&fs) as Arc<dyn FileSystem>,
            Arc::new(UreqTransport::default()),
            cache,
            settings,
        );

        for file in &self.files {
            let document_path = store_relative(file)?;
            let bytes = fs.read(&document_path).await?;
            let source = String::from_utf8_lossy(&bytes);

            let ctx = DocumentContext::new(document_path.as_str());
            let html = engine.render_document(&source, &ctx).await;
            ctx.scope().dispose();

            std::io::stdout().lock().write_all(html.as_bytes())?;
            output.info(&format!("Rendered {document_path}"));
        }

        Ok(())
    }
}

/// Store-relative document path with `/` separators.
fn store_relative(file: &Path) -> Result<String, CliError> {
    let mut segments = Vec::new();
    for component in file.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy()),
            Component::CurDir => {}
            _ => {
                return Err(CliError::Validation(format!(
                    "Document path must be relative to the store: {}",
                    file.display()
                )));
            }
        }
    }
    if segments.is_empty() {
        return Err(CliError::Validation("Document path is empty".to_owned()));
    }
    Ok(segments.join("/"))
}
