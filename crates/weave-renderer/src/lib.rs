//! Rendering primitives for the weave embed engine.
//!
//! This crate provides the pieces the engine renders with, without knowing
//! anything about embeds itself:
//!
//! - [`MarkdownHost`]: the host markdown pipeline, with [`PulldownHost`] as the
//!   pulldown-cmark implementation
//! - [`dom`]: HTML5 parsing of rendered markup to find and rewrite embed frames
//! - [`Replacements`]: single-pass splicing of rendered fragments into HTML
//! - [`escape_html`]: text escaping for literal fallbacks
//!
//! # Example
//!
//! ```
//! use weave_renderer::{MarkdownHost, PulldownHost, Replacements};
//!
//! let mut html = PulldownHost::new().render("See <!--slot-0--> here");
//! let mut replacements = Replacements::new();
//! replacements.add("<!--slot-0-->", "<b>this</b>");
//! replacements.apply(&mut html);
//!
//! assert_eq!(html, "<p>See <b>this</b> here</p>\n");
//! ```

pub mod dom;
mod escape;
mod host;
mod replacements;

pub use escape::escape_html;
pub use host::{MarkdownHost, PulldownHost};
pub use replacements::Replacements;
