//! Document context and render scopes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Where a fragment is being rendered from.
///
/// `path` is the store-relative path of the document whose text is rendered;
/// relative references resolve against its directory.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    path: String,
    scope: RenderScope,
}

impl DocumentContext {
    /// Context for the document at `path` with a fresh root scope.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            scope: RenderScope::new(path.clone()),
            path,
        }
    }

    /// Store-relative path of the document.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Scope that owns renders started from this context.
    #[must_use]
    pub fn scope(&self) -> &RenderScope {
        &self.scope
    }

    /// Same scope, different document path.
    #[must_use]
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            scope: self.scope.clone(),
        }
    }

    /// Same document path, different scope.
    #[must_use]
    pub fn with_scope(&self, scope: RenderScope) -> Self {
        Self {
            path: self.path.clone(),
            scope,
        }
    }
}

/// Lifetime owner of rendered containers.
///
/// Every nested render registers a child scope with its parent, so disposing
/// a document's root scope reaches every container rendered inside it.
/// Clones share state.
#[derive(Debug, Clone)]
pub struct RenderScope {
    inner: Arc<ScopeInner>,
}

#[derive(Debug)]
struct ScopeInner {
    label: String,
    children: Mutex<Vec<RenderScope>>,
    disposed: AtomicBool,
}

impl RenderScope {
    /// New root scope.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                label: label.into(),
                children: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Scope label (the document or location rendered in it).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Create a child scope and register it with this one.
    #[must_use]
    pub fn child(&self, label: impl Into<String>) -> Self {
        let child = Self::new(label);
        if self.is_disposed() {
            child.dispose();
        }
        self.inner.children.lock().unwrap().push(child.clone());
        child
    }

    /// Registered child scopes.
    #[must_use]
    pub fn children(&self) -> Vec<RenderScope> {
        self.inner.children.lock().unwrap().clone()
    }

    /// Number of scopes in this subtree, excluding this one.
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        self.children()
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    /// Mark this scope and all of its descendants disposed.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!(label = self.label(), "Disposing render scope");
        for child in self.children() {
            child.dispose();
        }
    }

    /// Whether the scope has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_child_registration() {
        let root = RenderScope::new("doc.md");
        let child = root.child("a.md");
        let _grandchild = child.child("b.md");
        let _sibling = root.child("c.md");

        assert_eq!(root.children().len(), 2);
        assert_eq!(root.descendant_count(), 3);
        assert_eq!(root.children()[0].label(), "a.md");
    }

    #[test]
    fn test_dispose_reaches_descendants() {
        let root = RenderScope::new("doc.md");
        let child = root.child("a.md");
        let grandchild = child.child("b.md");

        root.dispose();

        assert!(root.is_disposed());
        assert!(child.is_disposed());
        assert!(grandchild.is_disposed());
    }

    #[test]
    fn test_dispose_child_only() {
        let root = RenderScope::new("doc.md");
        let child = root.child("a.md");

        child.dispose();

        assert!(child.is_disposed());
        assert!(!root.is_disposed());
    }

    #[test]
    fn test_child_of_disposed_scope_starts_disposed() {
        let root = RenderScope::new("doc.md");
        root.dispose();
        assert!(root.child("late.md").is_disposed());
    }

    #[test]
    fn test_context_shares_scope() {
        let ctx = DocumentContext::new("notes/parent.md");
        let nested = ctx.with_path("notes/child.md");
        let _ = nested.scope().child("x");

        assert_eq!(nested.path(), "notes/child.md");
        assert_eq!(ctx.scope().children().len(), 1);
        assert_eq!(ctx.scope().label(), "notes/parent.md");
    }
}
