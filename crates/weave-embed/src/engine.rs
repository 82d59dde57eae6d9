//! Embed engine: directive resolution and recursive rendering.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, join_all};
use weave_cache::ContentCache;
use weave_config::Settings;
use weave_renderer::{MarkdownHost, Replacements, escape_html};
use weave_storage::{FileSystem, Transport};

use crate::context::DocumentContext;
use crate::directive::{self, Directive, DirectiveKind, Token};
use crate::loader::ContentLoader;
use crate::render::{
    INLINE_DISABLED_WARNING, RenderState, RenderedFragment, container, frame, inline_span,
    literal,
};
use crate::resolver::{self, ResolvedLocation};

/// One block handed over by the host pipeline.
#[derive(Debug, Clone, Copy)]
pub struct RenderedBlock<'a> {
    /// HTML the host rendered for the block.
    pub html: &'a str,
    /// Raw markdown source of the block.
    pub source: &'a str,
}

/// Resolves embed directives in rendered documents.
///
/// Owns the host renderer, the storage adapters, the content loader (with
/// its cache) and the render settings. Rendering never fails: every problem
/// degrades to placeholder text or leaves the directive verbatim.
pub struct EmbedEngine {
    pub(crate) host: Arc<dyn MarkdownHost>,
    pub(crate) fs: Arc<dyn FileSystem>,
    pub(crate) loader: ContentLoader,
    settings: Arc<Settings>,
}

impl EmbedEngine {
    /// Create an engine over the given host, adapters, cache and settings.
    #[must_use]
    pub fn new(
        host: Arc<dyn MarkdownHost>,
        fs: Arc<dyn FileSystem>,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn ContentCache>,
        settings: Arc<Settings>,
    ) -> Self {
        let loader = ContentLoader::new(
            Arc::clone(&fs),
            transport,
            cache,
            Arc::clone(&settings),
        );
        Self {
            host,
            fs,
            loader,
            settings,
        }
    }

    /// Render settings the engine reads on every render.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Drop all cached content.
    pub fn clear_cache(&self) {
        self.loader.cache().clear();
    }

    /// Render a whole document and resolve its embeds.
    pub async fn render_document(&self, source: &str, ctx: &DocumentContext) -> String {
        self.render_source(source, ctx, 0).await
    }

    /// Resolve embeds in one block rendered by the host.
    ///
    /// Blocks whose source has no directive marker only go through the DOM
    /// sweep; otherwise the source is rewritten and rendered again.
    pub async fn process_block(&self, block: RenderedBlock<'_>, ctx: &DocumentContext) -> String {
        self.process_at(block.html, block.source, ctx, 0).await
    }

    async fn process_at(&self, html: &str, source: &str, ctx: &DocumentContext, depth: u32) -> String {
        if directive::has_marker(source) {
            self.render_source(source, ctx, depth).await
        } else {
            self.sweep(html.to_owned(), ctx, depth).await
        }
    }

    /// Render `source` with the host once and resolve its embeds.
    async fn render_source(&self, source: &str, ctx: &DocumentContext, depth: u32) -> String {
        let html = if directive::has_marker(source) {
            let rewrite = self.extract_directives(source, ctx, depth).await;
            let mut html = self.host.render(&rewrite.slotted_text());
            rewrite.replacements().apply(&mut html);
            html
        } else {
            self.host.render(source)
        };
        self.sweep(html, ctx, depth).await
    }

    /// Run the paste and extraction phases over every line of `source` and
    /// resolve the extracted directives.
    ///
    /// Lines are processed concurrently; directives within a line resolve
    /// left to right.
    pub async fn extract_directives(
        &self,
        source: &str,
        ctx: &DocumentContext,
        depth: u32,
    ) -> DirectiveRewrite {
        let lines = join_all(
            source
                .split('\n')
                .map(|line| self.rewrite_line(line, ctx, depth)),
        )
        .await;
        DirectiveRewrite { lines }
    }

    async fn rewrite_line(&self, line: &str, ctx: &DocumentContext, depth: u32) -> LineRewrite {
        if !directive::has_marker(line) {
            return LineRewrite::unchanged(line);
        }

        let mut tokens = directive::tokenize(line);
        let passes = self
            .settings
            .current()
            .max_recursion_depth
            .saturating_sub(depth);
        let spliced =
            directive::paste_phase(&mut tokens, passes, move |reference| {
                self.load_paste(reference, ctx)
            })
            .await;
        if spliced > 0 {
            tracing::debug!(path = ctx.path(), spliced, "Pasted content");
        }

        let (mut tokens, directives) = directive::extract(tokens);
        let mut fragments = Vec::with_capacity(directives.len());
        for directive in &directives {
            fragments.push(self.resolve_directive(directive, ctx, depth).await);
        }

        // Abandoned directives stay in the text as written.
        for token in &mut tokens {
            if let Token::Slot(index) = *token
                && fragments[index].is_none()
            {
                *token = Token::Frozen(directives[index].raw_token.clone());
            }
        }

        LineRewrite {
            original: line.to_owned(),
            tokens,
            directives,
            fragments,
        }
    }

    async fn load_paste(&self, reference: String, ctx: &DocumentContext) -> Option<String> {
        let location = self.locate(&reference, ctx).await;
        self.loader.load(&location, false).await
    }

    async fn resolve_directive(
        &self,
        directive: &Directive,
        ctx: &DocumentContext,
        depth: u32,
    ) -> Option<String> {
        let location = self.locate(&directive.target_reference, ctx).await;
        tracing::debug!(kind = %directive.kind, %location, depth, "Resolving directive");

        match directive.kind {
            DirectiveKind::Import => {
                let content = self.loader.load(&location, !location.is_markdown()).await?;
                let fragment = self
                    .render(content, self.nested_context(ctx, &location), depth + 1)
                    .await;
                Some(container(&location, &fragment.html))
            }
            DirectiveKind::Iframe => Some(frame(&location)),
            DirectiveKind::Inline => {
                if !self.settings.current().allow_inline_html {
                    return Some(inline_span(&escape_html(INLINE_DISABLED_WARNING)));
                }
                let content = self.loader.load(&location, false).await?;
                Some(inline_span(&content))
            }
            // Spliced before extraction.
            DirectiveKind::Paste => None,
        }
    }

    pub(crate) async fn locate(&self, reference: &str, ctx: &DocumentContext) -> ResolvedLocation {
        let location = resolver::resolve(reference, ctx.path(), self.fs.base_path());
        resolver::resolve_existing(location, self.fs.as_ref()).await
    }

    /// Context for content loaded from `location`.
    ///
    /// Local files render as themselves so their relative references resolve
    /// against their own directory; remote content keeps the parent's path.
    pub(crate) fn nested_context(
        &self,
        ctx: &DocumentContext,
        location: &ResolvedLocation,
    ) -> DocumentContext {
        match location.store_path(self.fs.base_path()) {
            Some(path) => ctx.with_path(path),
            None => ctx.clone(),
        }
    }

    /// Render `text` at `depth` and resolve its embeds.
    ///
    /// Past the depth budget the text is returned as an escaped paragraph
    /// without calling the host.
    pub fn render(
        &self,
        text: String,
        ctx: DocumentContext,
        depth: u32,
    ) -> BoxFuture<'_, RenderedFragment> {
        async move {
            let mut state = RenderState::Pending;
            let max = self.settings.current().max_recursion_depth;

            if depth > max {
                tracing::debug!(path = ctx.path(), depth, max, "Recursion depth exceeded");
                state.advance(RenderState::DepthExceeded);
                return RenderedFragment {
                    html: literal(&text),
                    state,
                };
            }

            state.advance(RenderState::Rendering);
            let scope = ctx.scope().child(ctx.path());
            let nested = ctx.with_scope(scope);

            state.advance(RenderState::PostProcessing);
            let html = self.render_source(&text, &nested, depth).await;

            state.advance(RenderState::Rendered);
            RenderedFragment { html, state }
        }
        .boxed()
    }
}

impl std::fmt::Debug for EmbedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedEngine")
            .field("base_path", &self.fs.base_path())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Placeholder written into the source for directive `index` on `line`.
///
/// The host reads it as paragraph text wherever it lands. The `\!` escape is
/// consumed in text but kept in code spans and raw HTML, so the two renderings
/// are told apart by [`slot_rendered`].
fn slot_marker(line: usize, index: usize) -> String {
    format!("\u{e000}embed-slot-{line}-{index}\\!\u{e001}")
}

/// The host's rendering of [`slot_marker`] in text.
fn slot_rendered(line: usize, index: usize) -> String {
    format!("\u{e000}embed-slot-{line}-{index}!\u{e001}")
}

/// Directive results for one line.
#[derive(Debug, Clone)]
pub struct LineRewrite {
    original: String,
    tokens: Vec<Token>,
    directives: Vec<Directive>,
    fragments: Vec<Option<String>>,
}

impl LineRewrite {
    fn unchanged(line: &str) -> Self {
        Self {
            original: line.to_owned(),
            tokens: vec![Token::Frozen(line.to_owned())],
            directives: Vec::new(),
            fragments: Vec::new(),
        }
    }

    /// The line as it appeared in the source.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Directives extracted from the line.
    #[must_use]
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }
}

/// Result of the directive phases over a block of source text.
#[derive(Debug, Clone)]
pub struct DirectiveRewrite {
    lines: Vec<LineRewrite>,
}

impl DirectiveRewrite {
    /// Per-line results.
    #[must_use]
    pub fn lines(&self) -> &[LineRewrite] {
        &self.lines
    }

    /// Source text with a placeholder for every resolved directive.
    #[must_use]
    pub fn slotted_text(&self) -> String {
        self.join_lines(slot_marker)
    }

    /// Source lines with each resolved directive replaced by its markup.
    #[cfg(test)]
    pub(crate) fn rewritten_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| {
                directive::join(&line.tokens, |index| {
                    line.fragments[index].clone().unwrap_or_default()
                })
            })
            .collect()
    }

    /// Markup of resolved `inline` directives, in source order.
    #[cfg(test)]
    pub(crate) fn inlines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .flat_map(|line| line.directives.iter().zip(&line.fragments))
            .filter(|(directive, _)| directive.kind == DirectiveKind::Inline)
            .filter_map(|(_, fragment)| fragment.as_deref())
            .collect()
    }

    /// Substitutions that turn the host's rendering of
    /// [`slotted_text`](Self::slotted_text) into the final markup.
    ///
    /// Placeholders the host kept literally (inside code spans) turn back into
    /// the directive text.
    #[must_use]
    pub fn replacements(&self) -> Replacements {
        let mut replacements = Replacements::new();
        for (number, line) in self.lines.iter().enumerate() {
            for (index, fragment) in line.fragments.iter().enumerate() {
                let Some(markup) = fragment else {
                    continue;
                };
                replacements.add(
                    slot_marker(number, index),
                    escape_html(&line.directives[index].raw_token),
                );
                replacements.add(slot_rendered(number, index), markup.clone());
            }
        }
        replacements
    }

    fn join_lines(&self, slot: impl Fn(usize, usize) -> String) -> String {
        let lines: Vec<String> = self
            .lines
            .iter()
            .enumerate()
            .map(|(number, line)| directive::join(&line.tokens, |index| slot(number, index)))
            .collect();
        lines.join("\n")
    }
}
