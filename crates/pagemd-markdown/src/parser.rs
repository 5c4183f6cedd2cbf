use ego_tree::NodeRef;
use rustc_hash::FxHashMap;
use scraper::{Html, Node, Selector};

use crate::node::{HtmlElement, HtmlNode};

/// Tags that never contribute content to the Markdown output, removed here
/// regardless of the configured cleanup selectors.
const DROPPED_TAGS: &[&str] = &["script", "style", "noscript"];

/// Parses an HTML document and returns the mapped children of its `<body>`.
/// Input without a `<body>` element is treated as a fragment.
pub fn parse_body(html: &str) -> Vec<HtmlNode> {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").expect("'body' is a valid selector");

    if let Some(body) = document.select(&body_selector).next() {
        map_children(*body)
    } else {
        let fragment = Html::parse_fragment(html);
        map_children(*fragment.root_element())
    }
}

fn map_children(node: NodeRef<'_, Node>) -> Vec<HtmlNode> {
    node.children().filter_map(map_node).collect()
}

fn map_node(node: NodeRef<'_, Node>) -> Option<HtmlNode> {
    match node.value() {
        Node::Text(text) => Some(HtmlNode::Text(text.to_string())),
        Node::Element(element) => {
            let tag_name = element.name().to_lowercase();
            if DROPPED_TAGS.contains(&tag_name.as_str()) {
                return None;
            }

            let mut attributes = FxHashMap::default();
            for (name, value) in element.attrs() {
                attributes.insert(name.to_string(), value.to_string());
            }

            Some(HtmlNode::Element(HtmlElement {
                tag_name,
                attributes,
                children: map_children(node),
            }))
        }
        // Comments, doctypes and processing instructions carry no content.
        _ => None,
    }
}
