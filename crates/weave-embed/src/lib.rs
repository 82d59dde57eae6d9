//! Dynamic embed resolution for markdown documents.
//!
//! Documents reference other content with directives fused to the end of a
//! word: `!!!import`, `!!!iframe`, `!!!inline` and `!!!paste`, each followed
//! by a target reference. [`EmbedEngine`] resolves them after the host has
//! rendered a block:
//!
//! 1. `paste` targets are spliced into the source text as plain words
//! 2. remaining directives are resolved ([`resolver`]), loaded through the
//!    cache ([`ContentLoader`]) and rendered recursively up to
//!    `max_recursion_depth`
//! 3. the block is rendered again with the fragments spliced in
//! 4. `<iframe>` elements left in the markup are swept: markdown targets
//!    become rendered containers, everything else a passthrough frame
//!
//! Nothing here returns an error to the host. Missing files load as empty
//! content, blocked network access yields a placeholder, and failed loads
//! leave the directive text as written.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use weave_cache::MemoryCache;
//! use weave_config::{RenderSettings, Settings};
//! use weave_embed::{DocumentContext, EmbedEngine};
//! use weave_renderer::PulldownHost;
//! use weave_storage::{FsStorage, UreqTransport};
//!
//! # async fn run() {
//! let engine = EmbedEngine::new(
//!     Arc::new(PulldownHost::new()),
//!     Arc::new(FsStorage::new("/srv/notes".into())),
//!     Arc::new(UreqTransport::default()),
//!     Arc::new(MemoryCache::new()),
//!     Arc::new(Settings::in_memory(RenderSettings::default())),
//! );
//!
//! let ctx = DocumentContext::new("index.md");
//! let html = engine.render_document("See !!!paste motto.md", &ctx).await;
//! # }
//! ```

mod context;
pub mod directive;
mod engine;
mod loader;
mod render;
pub mod resolver;
mod sweep;

pub use context::{DocumentContext, RenderScope};
pub use engine::{DirectiveRewrite, EmbedEngine, LineRewrite, RenderedBlock};
pub use loader::{ContentLoader, NETWORK_DISABLED_PLACEHOLDER};
pub use render::{AUTO_RESIZE, INLINE_DISABLED_WARNING, RenderState, RenderedFragment};
pub use resolver::{ResolvedLocation, Scheme, resolve};
