//! Render state and fragment markup.

use weave_renderer::escape_html;

use crate::resolver::ResolvedLocation;

/// Text substituted for `inline` directives while inline HTML is disabled.
pub const INLINE_DISABLED_WARNING: &str =
    "Inline HTML is disabled. Enable allow_inline_html in the settings to render this content.";

/// `onload` hook added to passthrough frames so they grow to fit their content.
pub const AUTO_RESIZE: &str = "try{this.style.height=this.contentWindow.document.documentElement.scrollHeight+'px'}catch(e){}";

/// Class of the element wrapping rendered markdown embeds.
pub(crate) const CONTAINER_CLASS: &str = "markdown-embed";

/// Lifecycle of one recursive render.
///
/// `Pending → Rendering → PostProcessing → Rendered`, or
/// `Pending → DepthExceeded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Pending,
    Rendering,
    PostProcessing,
    Rendered,
    DepthExceeded,
}

impl RenderState {
    /// Whether `next` directly follows `self`.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Rendering | Self::DepthExceeded)
                | (Self::Rendering, Self::PostProcessing)
                | (Self::PostProcessing, Self::Rendered)
        )
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rendered | Self::DepthExceeded)
    }

    pub(crate) fn advance(&mut self, next: Self) {
        debug_assert!(
            self.can_advance_to(next),
            "invalid render transition {self:?} -> {next:?}"
        );
        tracing::trace!(from = ?*self, to = ?next, "Render state");
        *self = next;
    }
}

/// Output of one recursive render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFragment {
    /// Rendered markup.
    pub html: String,
    /// Final state (`Rendered` or `DepthExceeded`).
    pub state: RenderState,
}

/// Source text shown as an escaped paragraph.
pub(crate) fn literal(text: &str) -> String {
    format!("<p>{}</p>", escape_html(text))
}

/// Container for an imported document.
pub(crate) fn container(location: &ResolvedLocation, html: &str) -> String {
    format!(
        r#"<div class="{CONTAINER_CLASS}" data-embed-src="{}">{html}</div>"#,
        escape_html(&location.to_string())
    )
}

/// Passthrough frame for an `iframe` directive.
pub(crate) fn frame(location: &ResolvedLocation) -> String {
    format!(
        r#"<iframe src="{}"></iframe>"#,
        escape_html(&location.to_string())
    )
}

/// Holding span for unescaped `inline` content.
pub(crate) fn inline_span(content: &str) -> String {
    format!(r#"<span class="inline-embed">{content}</span>"#)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_transitions() {
        use RenderState::*;

        assert!(Pending.can_advance_to(Rendering));
        assert!(Pending.can_advance_to(DepthExceeded));
        assert!(Rendering.can_advance_to(PostProcessing));
        assert!(PostProcessing.can_advance_to(Rendered));

        assert!(!Pending.can_advance_to(Rendered));
        assert!(!Rendered.can_advance_to(Rendering));
        assert!(!DepthExceeded.can_advance_to(Rendering));
        assert!(!Rendering.can_advance_to(DepthExceeded));
    }

    #[test]
    fn test_terminal_states() {
        assert!(RenderState::Rendered.is_terminal());
        assert!(RenderState::DepthExceeded.is_terminal());
        assert!(!RenderState::PostProcessing.is_terminal());
    }

    #[test]
    fn test_literal_escapes() {
        assert_eq!(literal("a <b> & c"), "<p>a &lt;b&gt; &amp; c</p>");
    }

    #[test]
    fn test_container() {
        let location = ResolvedLocation::file("/vault/a.md");
        assert_eq!(
            container(&location, "<p>x</p>"),
            r#"<div class="markdown-embed" data-embed-src="file:///vault/a.md"><p>x</p></div>"#
        );
    }

    #[test]
    fn test_frame_escapes_src() {
        let location = ResolvedLocation::parse("https://x/?a=1&b=2").unwrap();
        assert_eq!(
            frame(&location),
            r#"<iframe src="https://x/?a=1&amp;b=2"></iframe>"#
        );
    }
}
