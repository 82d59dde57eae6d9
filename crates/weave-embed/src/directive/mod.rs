//! Embed directive vocabulary and parsing.
//!
//! A directive is the marker prefix `!!!` plus a kind name, fused to the end
//! of a word (`see!!!import`, or standalone `!!!import`). The next
//! whitespace-delimited word is the target reference, optionally ended early
//! by `<` so trailing punctuation stays in the text (`!!!paste name.md<,`).

mod parser;
mod tokenizer;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

pub use parser::{extract, paste_phase, split_target, strip_dangling_markers};
pub use tokenizer::{Token, join, next_word, tokenize};

/// Prefix shared by all directive markers.
pub const MARKER_PREFIX: &str = "!!!";

/// Any recognized marker anywhere in the text.
static MARKER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!!!(?:import|iframe|inline|paste)").expect("invalid marker regex")
});

/// Whether `text` contains at least one directive marker.
#[must_use]
pub fn has_marker(text: &str) -> bool {
    MARKER_PATTERN.is_match(text)
}

/// Directive kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// Render the target as a markdown container (HTML is converted first).
    Import,
    /// Embed the target as a frame.
    Iframe,
    /// Splice the target's raw content, unescaped.
    Inline,
    /// Splice the target's words into the line as plain text.
    Paste,
}

impl DirectiveKind {
    /// All kinds.
    pub const ALL: [Self; 4] = [Self::Import, Self::Iframe, Self::Inline, Self::Paste];

    /// Kind name as written after the prefix.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Iframe => "iframe",
            Self::Inline => "inline",
            Self::Paste => "paste",
        }
    }

    /// Full marker (`!!!import`).
    #[must_use]
    pub fn marker(self) -> String {
        format!("{MARKER_PREFIX}{}", self.name())
    }

    /// Split a word ending in a marker into the fused prefix and the kind.
    #[must_use]
    pub fn split_marker(word: &str) -> Option<(&str, Self)> {
        Self::ALL.into_iter().find_map(|kind| {
            let prefix = word.strip_suffix(kind.name())?.strip_suffix(MARKER_PREFIX)?;
            Some((prefix, kind))
        })
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed embed instruction from one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Directive kind.
    pub kind: DirectiveKind,
    /// Exact matched text: marker, separating whitespace and target (with
    /// its `<` terminator, if any).
    pub raw_token: String,
    /// Raw target reference, before resolution.
    pub target_reference: String,
}
