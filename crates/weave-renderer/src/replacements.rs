//! Single-pass splicing of rendered fragments into HTML.

use regex::Regex;

/// Collects marker → markup substitutions and applies them in one scan.
///
/// Fragments are rendered before the surrounding block is, so the block's HTML
/// carries placeholder markers where fragments belong. All markers are
/// matched in a single left-to-right pass: inserted markup is never rescanned,
/// so a fragment that happens to contain another marker's text stays intact.
///
/// When two markers could match at the same position the longer one wins.
///
/// # Example
///
/// ```
/// use weave_renderer::Replacements;
///
/// let mut html = "<p>see <!--s0--> and <!--s1--></p>".to_owned();
/// let mut replacements = Replacements::new();
/// replacements.add("<!--s0-->", "<span>a</span>");
/// replacements.add("<!--s1-->", "<!--s0-->");
/// replacements.apply(&mut html);
///
/// assert_eq!(html, "<p>see <span>a</span> and <!--s0--></p>");
/// ```
#[derive(Debug, Default)]
pub struct Replacements {
    items: Vec<(String, String)>,
}

impl Replacements {
    /// Create a new empty replacements collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a substitution for every occurrence of `from`.
    ///
    /// Registering the same marker twice keeps the later markup.
    pub fn add(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let from = from.into();
        if from.is_empty() {
            return;
        }
        let to = to.into();
        match self.items.iter_mut().find(|(existing, _)| *existing == from) {
            Some(item) => item.1 = to,
            None => self.items.push((from, to)),
        }
    }

    /// Apply all registered substitutions.
    ///
    /// Consumes the collector to prevent accidental reuse.
    pub fn apply(self, html: &mut String) {
        let present: Vec<&(String, String)> = self
            .items
            .iter()
            .filter(|(from, _)| html.contains(from.as_str()))
            .collect();
        if present.is_empty() {
            return;
        }

        let mut patterns: Vec<&str> = present.iter().map(|(from, _)| from.as_str()).collect();
        patterns.sort_by_key(|p| std::cmp::Reverse(p.len()));
        let alternation = patterns
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");

        // Escaped literals always form a valid pattern; the size limit is
        // the only way to fail.
        let Ok(regex) = Regex::new(&alternation) else {
            tracing::warn!(count = present.len(), "Falling back to sequential splicing");
            for (from, to) in present {
                *html = html.replace(from.as_str(), to);
            }
            return;
        };

        let replaced = regex.replace_all(html, |caps: &regex::Captures| {
            let matched = &caps[0];
            present
                .iter()
                .find(|(from, _)| from == matched)
                .map_or_else(|| matched.to_owned(), |(_, to)| to.clone())
        });
        *html = replaced.into_owned();
    }

    /// Check if there are any replacements registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of registered replacements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_empty_replacements() {
        let mut html = "unchanged".to_owned();
        Replacements::new().apply(&mut html);
        assert_eq!(html, "unchanged");
    }

    #[test]
    fn test_every_occurrence_is_replaced() {
        let mut html = "<!--x--> and <!--x-->".to_owned();
        let mut replacements = Replacements::new();
        replacements.add("<!--x-->", "X");
        replacements.apply(&mut html);
        assert_eq!(html, "X and X");
    }

    #[test]
    fn test_inserted_markup_is_not_rescanned() {
        let mut html = "aaa".to_owned();
        let mut replacements = Replacements::new();
        replacements.add("a", "bb");
        replacements.add("bb", "c");
        replacements.apply(&mut html);
        assert_eq!(html, "bbbbbb");
    }

    #[test]
    fn test_longest_marker_wins() {
        let mut html = "<!--slot-1--><!--slot-12-->".to_owned();
        let mut replacements = Replacements::new();
        replacements.add("<!--slot-1-->", "one");
        replacements.add("<!--slot-12-->", "twelve");
        replacements.apply(&mut html);
        assert_eq!(html, "onetwelve");
    }

    #[test]
    fn test_special_characters_are_literal() {
        let mut html = "cost: $1.00 (approx)".to_owned();
        let mut replacements = Replacements::new();
        replacements.add("$1.00 (approx)", "one dollar");
        replacements.apply(&mut html);
        assert_eq!(html, "cost: one dollar");
    }

    #[test]
    fn test_duplicate_marker_keeps_later_markup() {
        let mut replacements = Replacements::new();
        replacements.add("m", "first");
        replacements.add("m", "second");
        assert_eq!(replacements.len(), 1);

        let mut html = "m".to_owned();
        replacements.apply(&mut html);
        assert_eq!(html, "second");
    }

    #[test]
    fn test_empty_marker_is_ignored() {
        let mut replacements = Replacements::new();
        replacements.add("", "x");
        assert!(replacements.is_empty());
    }
}
