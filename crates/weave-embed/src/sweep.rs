//! DOM sweep for embed frames left in rendered markup.

use futures::future::join_all;
use weave_renderer::dom::{self, Frame, FrameEdit};

use crate::context::DocumentContext;
use crate::engine::EmbedEngine;
use crate::render::{AUTO_RESIZE, CONTAINER_CLASS, container};

/// Attribute that forces a frame to render as markdown.
const MARKDOWN_FLAG: &str = "data-markdown";

impl EmbedEngine {
    /// Rewrite `<iframe>` elements in rendered markup.
    ///
    /// Frames pointing at markdown (or flagged `data-markdown`) are replaced
    /// by a rendered markdown container. All others become passthrough frames
    /// with a resolved `src`, no `sandbox` and an auto-resize `onload`.
    /// Containers rendered earlier are not swept again.
    ///
    /// Markup without frames to rewrite is returned byte for byte.
    pub async fn sweep(&self, html: String, ctx: &DocumentContext, depth: u32) -> String {
        if !html.to_ascii_lowercase().contains("<iframe") {
            return html;
        }

        let frames = dom::frames(&html, CONTAINER_CLASS);
        if frames.is_empty() {
            return html;
        }

        let edits = join_all(
            frames
                .iter()
                .map(|frame| self.rewrite_frame(frame, ctx, depth)),
        )
        .await;

        match dom::rewrite_frames(&html, CONTAINER_CLASS, &edits) {
            Ok(rewritten) => rewritten,
            Err(e) => {
                tracing::warn!(path = ctx.path(), error = %e, "Failed to serialize swept markup");
                html
            }
        }
    }

    async fn rewrite_frame(&self, frame: &Frame, ctx: &DocumentContext, depth: u32) -> FrameEdit {
        let Some(src) = frame.attr("src") else {
            return FrameEdit::Keep;
        };
        let location = self.locate(src, ctx).await;

        if location.is_markdown() || frame.has_attr(MARKDOWN_FLAG) {
            let Some(content) = self
                .loader
                .load(&location, !location.is_markdown())
                .await
            else {
                return FrameEdit::Keep;
            };
            let fragment = self
                .render(content, self.nested_context(ctx, &location), depth + 1)
                .await;
            return FrameEdit::Replace(container(&location, &fragment.html));
        }

        let mut attrs: Vec<(String, String)> = frame
            .attrs
            .iter()
            .filter(|(key, _)| {
                !key.eq_ignore_ascii_case("src") && !key.eq_ignore_ascii_case("sandbox")
            })
            .cloned()
            .collect();
        attrs.push(("src".to_owned(), location.to_string()));
        if !frame.has_attr("onload") {
            attrs.push(("onload".to_owned(), AUTO_RESIZE.to_owned()));
        }
        FrameEdit::Attributes(attrs)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use weave_cache::MemoryCache;
    use weave_config::{RenderSettings, Settings};
    use weave_renderer::PulldownHost;
    use weave_storage::{MockStorage, MockTransport};

    use super::*;

    fn engine(fs: MockStorage) -> EmbedEngine {
        EmbedEngine::new(
            Arc::new(PulldownHost::new()),
            Arc::new(fs),
            Arc::new(MockTransport::new()),
            Arc::new(MemoryCache::new()),
            Arc::new(Settings::in_memory(RenderSettings::default())),
        )
    }

    fn ctx() -> DocumentContext {
        DocumentContext::new("notes/parent.md")
    }

    #[tokio::test]
    async fn test_no_frames_is_untouched() {
        let engine = engine(MockStorage::new("/vault"));
        let html = "<p>a &amp; b</p>\n".to_owned();
        assert_eq!(engine.sweep(html.clone(), &ctx(), 0).await, html);
    }

    #[tokio::test]
    async fn test_markdown_frame_becomes_container() {
        let engine = engine(MockStorage::new("/vault").with_file("notes/child.md", "# Child"));

        let out = engine
            .sweep(
                r#"<p>before</p><iframe src="./child.md"></iframe> after"#.to_owned(),
                &ctx(),
                0,
            )
            .await;

        assert_eq!(
            out,
            "<p>before</p><div class=\"markdown-embed\" data-embed-src=\"file:///vault/notes/child.md\"><h1>Child</h1>\n</div> after"
        );
    }

    #[tokio::test]
    async fn test_passthrough_frame_is_rebuilt() {
        let engine = engine(MockStorage::new("/vault"));

        let out = engine
            .sweep(
                r#"<iframe sandbox="" width="400" src="page.html" onload="go()">x</iframe>"#
                    .to_owned(),
                &ctx(),
                0,
            )
            .await;

        assert_eq!(
            out,
            r#"<iframe width="400" onload="go()" src="file:///vault/notes/page.html">x</iframe>"#
        );
    }

    #[tokio::test]
    async fn test_passthrough_frame_gets_resize_hook() {
        let engine = engine(MockStorage::new("/vault"));

        let out = engine
            .sweep(
                r#"<iframe src="https://example.com/app"></iframe>"#.to_owned(),
                &ctx(),
                0,
            )
            .await;

        assert!(out.starts_with(r#"<iframe src="https://example.com/app" onload="try{"#));
    }

    #[tokio::test]
    async fn test_flagged_frame_renders_as_markdown() {
        let engine = engine(MockStorage::new("/vault").with_file("notes/page.html", "<b>bold</b>"));

        let out = engine
            .sweep(
                r#"<iframe data-markdown src="page.html"></iframe>"#.to_owned(),
                &ctx(),
                0,
            )
            .await;

        assert!(out.starts_with(r#"<div class="markdown-embed""#));
        assert!(out.contains("<strong>bold</strong>"));
    }

    #[tokio::test]
    async fn test_abandoned_markdown_frame_is_kept() {
        let engine = engine(MockStorage::new("/vault").with_unreadable("notes/locked.md"));
        let html = r#"<iframe src="locked.md"></iframe>"#.to_owned();

        assert_eq!(engine.sweep(html.clone(), &ctx(), 0).await, html);
    }

    #[tokio::test]
    async fn test_existing_containers_are_skipped() {
        let engine = engine(MockStorage::new("/vault").with_file("notes/child.md", "x"));
        let html = r#"<div class="markdown-embed"><iframe src="child.md"></iframe></div>"#.to_owned();

        assert_eq!(engine.sweep(html.clone(), &ctx(), 0).await, html);
    }

    #[tokio::test]
    async fn test_bare_ampersand_does_not_block_sweep() {
        let engine = engine(MockStorage::new("/vault").with_file("notes/child.md", "# Child"));

        let out = engine
            .sweep(
                "<div>Tom & Jerry</div>\n\n<iframe src=\"./child.md\"></iframe>".to_owned(),
                &ctx(),
                0,
            )
            .await;

        assert_eq!(
            out,
            "<div>Tom &amp; Jerry</div>\n\n<div class=\"markdown-embed\" data-embed-src=\"file:///vault/notes/child.md\"><h1>Child</h1>\n</div>"
        );
    }

    #[tokio::test]
    async fn test_script_body_survives_sweep() {
        let engine = engine(MockStorage::new("/vault").with_file("notes/child.md", "# Child"));

        let out = engine
            .sweep(
                "<script>if (a < b) {}</script>\n\n<iframe src=\"./child.md\"></iframe>"
                    .to_owned(),
                &ctx(),
                0,
            )
            .await;

        assert_eq!(
            out,
            "<script>if (a < b) {}</script>\n\n<div class=\"markdown-embed\" data-embed-src=\"file:///vault/notes/child.md\"><h1>Child</h1>\n</div>"
        );
    }

    #[tokio::test]
    async fn test_unclosed_elements_keep_their_text() {
        let engine = engine(MockStorage::new("/vault"));

        let out = engine
            .sweep(
                "<ul><li>one<li>two</ul><p>open\n<iframe src=\"https://example.com/app\"></iframe>"
                    .to_owned(),
                &ctx(),
                0,
            )
            .await;

        assert!(out.starts_with("<ul><li>one</li><li>two</li></ul><p>open\n<iframe src=\"https://example.com/app\" onload=\"try{"));
        assert!(out.ends_with("</iframe></p>"));
    }
}
