//! Reference resolution.
//!
//! Turns the raw, possibly relative reference written in a document into an
//! absolute, scheme-qualified [`ResolvedLocation`].

use std::fmt;

use weave_storage::FileSystem;

/// Separator that marks a reference as already absolute.
const SCHEME_SEPARATOR: &str = "://";

/// Delimiter that ends a reference early (`page.md<,`).
pub const REFERENCE_TERMINATOR: char = '<';

/// Scheme of a resolved location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Local file inside the document store.
    File,
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    Https,
    /// Any other scheme, carried verbatim (passthrough frames only).
    Other(String),
}

impl Scheme {
    fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "http" => Self::Http,
            "https" => Self::Https,
            _ => Self::Other(name.to_owned()),
        }
    }

    fn as_str(&self) -> &str {
        match self {
            Self::File => "file",
            Self::Http => "http",
            Self::Https => "https",
            Self::Other(name) => name,
        }
    }
}

/// An absolute, scheme-qualified address.
///
/// Local paths are always rooted at the store base directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedLocation {
    /// Location scheme.
    pub scheme: Scheme,
    /// Everything after `://` (an absolute filesystem path for local files).
    pub absolute_path: String,
}

impl ResolvedLocation {
    /// Local file location.
    #[must_use]
    pub fn file(absolute_path: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::File,
            absolute_path: absolute_path.into(),
        }
    }

    /// Parse a `scheme://rest` string. Returns `None` without a separator.
    #[must_use]
    pub fn parse(uri: &str) -> Option<Self> {
        let (scheme, rest) = uri.split_once(SCHEME_SEPARATOR)?;
        Some(Self {
            scheme: Scheme::parse(scheme),
            absolute_path: rest.to_owned(),
        })
    }

    /// Whether the location is served by the filesystem adapter.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.scheme == Scheme::File
    }

    /// Whether the location is fetched over the network.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self.scheme, Scheme::Http | Scheme::Https)
    }

    /// Whether the target is a markdown document (`.md` or `.markdown`).
    ///
    /// Query strings and fragments are ignored.
    #[must_use]
    pub fn is_markdown(&self) -> bool {
        let path = self
            .absolute_path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        path.ends_with(".md") || path.ends_with(".markdown")
    }

    /// Store-relative path of a local location.
    ///
    /// `.` and `..` segments are normalized. Returns `None` for non-local
    /// locations and for paths outside the store.
    #[must_use]
    pub fn store_path(&self, base: &str) -> Option<String> {
        if !self.is_local() {
            return None;
        }
        let base = base.trim_end_matches('/');
        let rest = self.absolute_path.strip_prefix(base)?;
        if !rest.is_empty() && !rest.starts_with('/') {
            // `/vault2/x` is not inside `/vault`.
            return None;
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in rest.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop()?;
                }
                other => segments.push(other),
            }
        }
        Some(segments.join("/"))
    }
}

impl fmt::Display for ResolvedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SCHEME_SEPARATOR}{}",
            self.scheme.as_str(),
            self.absolute_path
        )
    }
}

/// Resolve `reference` written in the document at `document_path`.
///
/// - `scheme://...`: already absolute; anything from a `<` onward is dropped
/// - `/x`: rooted at the store base
/// - `./x` and `x`: relative to the document's directory
///
/// `document_path` is store-relative (`notes/parent.md`); a document at the
/// store root has an empty directory.
#[must_use]
pub fn resolve(reference: &str, document_path: &str, base: &str) -> ResolvedLocation {
    if reference.contains(SCHEME_SEPARATOR) {
        let stripped = reference
            .split(REFERENCE_TERMINATOR)
            .next()
            .unwrap_or_default();
        if let Some(location) = ResolvedLocation::parse(stripped) {
            return location;
        }
        // `<` came before the separator: nothing absolute is left.
        tracing::warn!(reference, "Reference lost its scheme to the terminator");
    }

    let base = base.trim_end_matches('/');
    let directory = document_path
        .rfind('/')
        .map_or("", |index| &document_path[..index]);

    let path = if let Some(rooted) = reference.strip_prefix('/') {
        format!("{base}/{rooted}")
    } else {
        let relative = reference.strip_prefix("./").unwrap_or(reference);
        if directory.is_empty() {
            format!("{base}/{relative}")
        } else {
            format!("{base}/{directory}/{relative}")
        }
    };

    ResolvedLocation::file(path)
}

/// Rewrite a non-local location whose path exists in the store to a local one.
///
/// Supports `file://`-style references typed as network URIs: if the path
/// portion names a file in the store, the location is re-rooted at the store
/// base.
pub async fn resolve_existing(location: ResolvedLocation, fs: &dyn FileSystem) -> ResolvedLocation {
    if location.is_local() {
        return location;
    }

    let base = fs.base_path().trim_end_matches('/');
    let path = location.absolute_path.split(['?', '#']).next().unwrap_or_default();
    let candidate = path
        .strip_prefix(base)
        .filter(|rest| rest.starts_with('/'))
        .unwrap_or(path)
        .trim_start_matches('/');

    if candidate.is_empty() || !fs.exists(candidate).await {
        return location;
    }

    tracing::debug!(%location, candidate, "Reference exists in the store, reading locally");
    ResolvedLocation::file(format!("{base}/{candidate}"))
}
