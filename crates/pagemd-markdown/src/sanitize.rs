use scraper::{Html, Selector};

/// Removes every element matching any of `selectors` from the document and
/// returns the serialized result. A selector that fails to parse is skipped
/// without affecting the remaining selectors, and a selector matching
/// nothing leaves the document untouched.
pub fn clean_html(html: &str, selectors: &[String]) -> String {
    let mut document = Html::parse_document(html);

    for selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            // Unsupported selector syntax, skip this one.
            continue;
        };

        let matched: Vec<_> = document
            .select(&selector)
            .map(|element| element.id())
            .collect();
        for id in matched {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }

    document.root_element().html()
}
