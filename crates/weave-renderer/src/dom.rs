//! HTML5 fragment access for embed frames.
//!
//! Rendered markup is parsed with html5ever the way a browser parses the body
//! of a page, so bare ampersands, raw `<script>` bodies and unclosed elements
//! are all accepted. [`frames`] lists the `<iframe src>` elements outside embed
//! containers and [`rewrite_frames`] applies one [`FrameEdit`] per frame.
//!
//! Both walk the tree in document order, so the n-th edit applies to the n-th
//! frame [`frames`] returned for the same markup.

use std::rc::Rc;

use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::TendrilSink;
use html5ever::{
    Attribute, LocalName, ParseOpts, QualName, local_name, namespace_url, ns, parse_fragment,
};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

use crate::Replacements;

/// An `<iframe>` element found in rendered markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
}

impl Frame {
    /// Value of attribute `name`, if present.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether attribute `name` is present.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }
}

/// What to do with one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEdit {
    /// Leave the element as it is.
    Keep,
    /// Replace the element with raw markup.
    Replace(String),
    /// Keep the element and its content with a new attribute list.
    Attributes(Vec<(String, String)>),
}

/// Frames outside elements carrying `container_class`, in document order.
#[must_use]
pub fn frames(html: &str, container_class: &str) -> Vec<Frame> {
    let root = parse(html);
    let mut slots = Vec::new();
    collect(&root, container_class, &mut slots);
    slots
        .iter()
        .filter_map(|(parent, index)| element_attrs(&parent.children.borrow()[*index]))
        .map(|attrs| Frame { attrs })
        .collect()
}

/// Apply `edits` to the frames of `html` and serialize the fragment again.
///
/// Markup is returned untouched when every edit is [`FrameEdit::Keep`].
///
/// # Errors
///
/// Returns an error if the fragment cannot be serialized.
pub fn rewrite_frames(
    html: &str,
    container_class: &str,
    edits: &[FrameEdit],
) -> std::io::Result<String> {
    if edits.iter().all(|edit| *edit == FrameEdit::Keep) {
        return Ok(html.to_owned());
    }

    let root = parse(html);
    let mut slots = Vec::new();
    collect(&root, container_class, &mut slots);

    let mut replacements = Replacements::new();
    for (n, ((parent, index), edit)) in slots.iter().zip(edits).enumerate() {
        match edit {
            FrameEdit::Keep => {}
            FrameEdit::Attributes(attrs) => {
                if let NodeData::Element { attrs: current, .. } =
                    &parent.children.borrow()[*index].data
                {
                    *current.borrow_mut() = attrs
                        .iter()
                        .map(|(key, value)| Attribute {
                            name: QualName::new(None, ns!(), LocalName::from(key.as_str())),
                            value: value.as_str().into(),
                        })
                        .collect();
                }
            }
            FrameEdit::Replace(markup) => {
                let marker = format!("\u{e000}embed-frame-{n}");
                let comment = Node::new(NodeData::Comment {
                    contents: marker.as_str().into(),
                });
                comment.parent.set(Some(Rc::downgrade(parent)));
                parent.children.borrow_mut()[*index] = comment;
                replacements.add(format!("<!--{marker}-->"), markup.clone());
            }
        }
    }

    let mut buf = Vec::with_capacity(html.len());
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..SerializeOpts::default()
    };
    serialize(&mut buf, &SerializableHandle::from(root), opts)?;
    let mut out = String::from_utf8(buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    replacements.apply(&mut out);
    Ok(out)
}

/// Parse `html` as the content of a `<body>` and return the fragment root.
fn parse(html: &str) -> Handle {
    let dom = parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        QualName::new(None, ns!(html), local_name!("body")),
        Vec::new(),
    )
    .one(html);

    // The fragment parser wraps the parsed nodes in an `html` element.
    let root = dom.document.children.borrow().first().cloned();
    root.unwrap_or(dom.document)
}

/// Collect `(parent, child index)` of every frame below `node`.
fn collect(node: &Handle, container_class: &str, out: &mut Vec<(Handle, usize)>) {
    for (index, child) in node.children.borrow().iter().enumerate() {
        if let NodeData::Element { name, attrs, .. } = &child.data {
            let attrs = attrs.borrow();
            let find = |key: &str| attrs.iter().find(|attr| &*attr.name.local == key);
            if &*name.local == "iframe" && find("src").is_some() {
                out.push((Rc::clone(node), index));
                continue;
            }
            let is_container = find("class").is_some_and(|attr| {
                attr.value
                    .split_ascii_whitespace()
                    .any(|class| class == container_class)
            });
            if is_container {
                continue;
            }
        }
        collect(child, container_class, out);
    }
}

fn element_attrs(node: &Handle) -> Option<Vec<(String, String)>> {
    match &node.data {
        NodeData::Element { attrs, .. } => Some(
            attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_frames_in_document_order() {
        let html = r#"<p>a</p><iframe src="one.md"></iframe><div><iframe width="3" src="two"></iframe></div>"#;

        let found = frames(html, "markdown-embed");

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].attr("src"), Some("one.md"));
        assert_eq!(found[1].attrs[0], ("width".to_owned(), "3".to_owned()));
    }

    #[test]
    fn test_frames_skip_containers_and_srcless() {
        let html = r#"<div class="x markdown-embed"><iframe src="in.md"></iframe></div><iframe></iframe>"#;
        assert!(frames(html, "markdown-embed").is_empty());
    }

    #[test]
    fn test_frames_tolerate_html5_markup() {
        let html = "<p>Tom & Jerry<p>unclosed\n<script>if (a < b) {}</script><iframe src=\"x.md\"></iframe>";

        let found = frames(html, "markdown-embed");

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].attr("src"), Some("x.md"));
    }

    #[test]
    fn test_keep_returns_input() {
        let html = "<p>a & b</p><iframe src=\"x\"></iframe>";
        assert_eq!(
            rewrite_frames(html, "markdown-embed", &[FrameEdit::Keep]).unwrap(),
            html
        );
    }

    #[test]
    fn test_replace_splices_markup() {
        let html = "<script>if (a < b) {}</script>\n\n<iframe src=\"x.md\"></iframe> tail";

        let out = rewrite_frames(
            html,
            "markdown-embed",
            &[FrameEdit::Replace("<div>X</div>".to_owned())],
        )
        .unwrap();

        assert_eq!(out, "<script>if (a < b) {}</script>\n\n<div>X</div> tail");
    }

    #[test]
    fn test_attributes_keep_content() {
        let html = r#"<iframe sandbox="" src="a">fallback</iframe>"#;

        let out = rewrite_frames(
            html,
            "markdown-embed",
            &[FrameEdit::Attributes(vec![("src".to_owned(), "b".to_owned())])],
        )
        .unwrap();

        assert_eq!(out, r#"<iframe src="b">fallback</iframe>"#);
    }
}
