//! Host markdown rendering pipeline.

use pulldown_cmark::{Options, Parser, html};

/// Turns markdown text into HTML.
///
/// The embed engine calls the host once per rendered fragment; it never
/// interprets markdown itself.
pub trait MarkdownHost: Send + Sync {
    /// Render `markdown` to an HTML string.
    fn render(&self, markdown: &str) -> String;
}

/// [`MarkdownHost`] backed by pulldown-cmark.
///
/// Raw HTML in the source passes through untouched, so embed elements such as
/// `<iframe>` survive rendering and reach the DOM sweep.
#[derive(Debug, Clone, Copy)]
pub struct PulldownHost {
    gfm: bool,
}

impl Default for PulldownHost {
    fn default() -> Self {
        Self { gfm: true }
    }
}

impl PulldownHost {
    /// Create a host with GitHub Flavored Markdown enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default. When enabled, the parser supports:
    /// - Tables
    /// - Strikethrough (`~~text~~`)
    /// - Task lists (`- [ ] item`)
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Get parser options based on GFM configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }
}

impl MarkdownHost for PulldownHost {
    fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.parser_options());
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}
