use itertools::Itertools;

use crate::error::ConvertError;
use crate::node::{HtmlElement, HtmlNode};

#[derive(PartialEq, Debug, Clone, Copy)]
enum Alignment {
    Left,
    Center,
    Right,
    Default,
}

/// Container tags whose children are converted in place.
const CONTAINER_TAGS: &[&str] = &[
    "html", "head", "body", "div", "main", "article", "section", "header", "footer", "nav",
    "aside", "hgroup", "figure",
];

/// Tags rendered as inline Markdown marks.
const INLINE_TAGS: &[&str] = &[
    "strong", "b", "em", "i", "a", "code", "span", "img", "br", "s", "strike", "del", "u", "kbd",
    "sub", "sup", "small", "mark",
];

/// Converts a block-level node sequence to Markdown. Consecutive inline
/// content is merged into a single paragraph; blocks are separated by a
/// blank line.
pub fn convert_nodes_to_markdown(nodes: &[HtmlNode]) -> Result<String, ConvertError> {
    let mut blocks: Vec<String> = Vec::new();
    let mut inline_run = String::new();

    fn flush(blocks: &mut Vec<String>, inline_run: &mut String) {
        let paragraph = inline_run.trim().to_string();
        if !paragraph.is_empty() {
            blocks.push(paragraph);
        }
        inline_run.clear();
    }

    for node in nodes {
        match node {
            HtmlNode::Text(text) => {
                if !text.trim().is_empty() {
                    inline_run.push_str(&collapse_whitespace(text));
                }
            }
            HtmlNode::Element(element) => {
                let tag = element.tag_name.as_str();
                if INLINE_TAGS.contains(&tag) {
                    inline_run.push_str(&inline_text(std::slice::from_ref(node)));
                    continue;
                }

                flush(&mut blocks, &mut inline_run);
                let block = match tag {
                    _ if CONTAINER_TAGS.contains(&tag) => {
                        convert_nodes_to_markdown(&element.children)?
                    }
                    "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => render_heading(element),
                    "p" => inline_text(&element.children).trim().to_string(),
                    "hr" => "---".to_string(),
                    "ul" | "ol" => render_list(element, 0)?,
                    "blockquote" => render_blockquote(element)?,
                    "pre" => render_code_block(element),
                    "table" => render_table(element),
                    // Unknown tags fall back to their inline content.
                    _ => inline_text(&element.children).trim().to_string(),
                };
                if !block.is_empty() {
                    blocks.push(block);
                }
            }
        }
    }
    flush(&mut blocks, &mut inline_run);

    Ok(blocks.join("\n\n"))
}

/// Renders inline content: emphasis, links, images, inline code and hard
/// breaks. Unknown tags contribute their text content.
pub fn inline_text(nodes: &[HtmlNode]) -> String {
    let mut parts: Vec<String> = Vec::new();
    for node in nodes {
        match node {
            HtmlNode::Text(text) => parts.push(collapse_whitespace(text)),
            HtmlNode::Element(element) => {
                let inner = inline_text(&element.children);
                match element.tag_name.as_str() {
                    "strong" | "b" => {
                        if !inner.trim().is_empty() {
                            parts.push(format!("**{}**", inner.trim()));
                        }
                    }
                    "em" | "i" => {
                        if !inner.trim().is_empty() {
                            parts.push(format!("*{}*", inner.trim()));
                        }
                    }
                    "s" | "strike" | "del" => {
                        if !inner.trim().is_empty() {
                            parts.push(format!("~~{}~~", inner.trim()));
                        }
                    }
                    "a" => match element.attr("href") {
                        Some(href) => {
                            let text = inner.replace('\n', "");
                            parts.push(format!(
                                "[{}]({}{})",
                                text.trim(),
                                format_url(href),
                                title_suffix(element)
                            ));
                        }
                        None => parts.push(inner),
                    },
                    "img" => {
                        if let Some(src) = element.attr("src").filter(|src| !src.is_empty()) {
                            let alt = element.attr("alt").unwrap_or("");
                            parts.push(format!(
                                "![{}]({}{})",
                                alt,
                                format_url(src),
                                title_suffix(element)
                            ));
                        }
                    }
                    "code" => {
                        let code = raw_text(&element.children);
                        parts.push(format!("`{}`", code.trim()));
                    }
                    "br" => parts.push("  \n".to_string()),
                    _ => parts.push(inner),
                }
            }
        }
    }
    parts.join("")
}

/// Collapses whitespace runs to single spaces, preserving the fact that a
/// run existed at either edge of the text node.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_whitespace = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
            }
            in_whitespace = true;
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }
    out
}

/// Text content with entities already decoded by the parser; `<br>` becomes
/// a newline. Used for code where Markdown marks must not apply.
fn raw_text(nodes: &[HtmlNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.push_str(text),
            HtmlNode::Element(element) if element.tag_name == "br" => out.push('\n'),
            HtmlNode::Element(element) => out.push_str(&raw_text(&element.children)),
        }
    }
    out
}

fn format_url(url: &str) -> String {
    let encoded = url.replace(' ', "%20");
    if url.is_empty() || url.contains(' ') || encoded.contains('(') || encoded.contains(')') {
        format!("<{}>", encoded)
    } else {
        encoded
    }
}

fn title_suffix(element: &HtmlElement) -> String {
    element
        .attr("title")
        .filter(|title| !title.is_empty())
        .map(|title| format!(" \"{}\"", title.replace('"', "\\\"")))
        .unwrap_or_default()
}

fn render_heading(element: &HtmlElement) -> String {
    let level: usize = element.tag_name[1..].parse().unwrap_or(1);
    format!(
        "{} {}",
        "#".repeat(level),
        inline_text(&element.children).trim()
    )
}

fn render_blockquote(element: &HtmlElement) -> Result<String, ConvertError> {
    let inner = convert_nodes_to_markdown(&element.children)?;
    if inner.is_empty() {
        return Ok(">".to_string());
    }
    Ok(inner
        .lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {}", line)
            }
        })
        .join("\n"))
}

fn render_code_block(element: &HtmlElement) -> String {
    let mut language = String::new();
    let mut content_nodes = &element.children;

    if let Some(HtmlNode::Element(code)) = element
        .children
        .iter()
        .find(|n| matches!(n, HtmlNode::Element(_)))
        && code.tag_name == "code"
    {
        content_nodes = &code.children;
        if let Some(class_attr) = code.attr("class") {
            for class_name in class_attr.split_whitespace() {
                if let Some(lang) = class_name
                    .strip_prefix("language-")
                    .or_else(|| class_name.strip_prefix("lang-"))
                {
                    language = lang.to_string();
                    break;
                }
            }
        }
    }

    let mut content = raw_text(content_nodes);
    if content.starts_with('\n') {
        content.remove(0);
    }
    format!("```{}\n{}\n```", language, content.trim_end_matches('\n'))
}

fn render_list(element: &HtmlElement, depth: usize) -> Result<String, ConvertError> {
    let indent = "    ".repeat(depth);
    let ordered = match element.tag_name.as_str() {
        "ol" => true,
        "ul" => false,
        other => {
            return Err(ConvertError::InvalidStructure {
                message: format!("unexpected list tag <{}>", other),
            });
        }
    };
    let mut number: usize = if ordered {
        element
            .attr("start")
            .and_then(|start| start.parse().ok())
            .unwrap_or(1)
    } else {
        0
    };

    let mut lines: Vec<String> = Vec::new();
    for child in &element.children {
        let HtmlNode::Element(item) = child else {
            continue;
        };
        if item.tag_name != "li" {
            continue;
        }

        let marker = if ordered {
            let marker = format!("{}. ", number);
            number += 1;
            marker
        } else {
            "- ".to_string()
        };

        let mut sublists: Vec<String> = Vec::new();
        let mut own_children: Vec<HtmlNode> = Vec::new();
        for li_child in &item.children {
            match li_child {
                HtmlNode::Element(el) if el.tag_name == "ul" || el.tag_name == "ol" => {
                    sublists.push(render_list(el, depth + 1)?);
                }
                other => own_children.push(other.clone()),
            }
        }

        let content = convert_nodes_to_markdown(&own_children)?;
        if content.is_empty() {
            lines.push(format!("{}{}", indent, marker.trim_end()));
        } else {
            let continuation = " ".repeat(marker.len());
            for (i, line) in content.lines().enumerate() {
                if i == 0 {
                    lines.push(format!("{}{}{}", indent, marker, line));
                } else if line.is_empty() {
                    lines.push(String::new());
                } else {
                    lines.push(format!("{}{}{}", indent, continuation, line));
                }
            }
        }
        for sublist in sublists {
            lines.extend(sublist.lines().map(String::from));
        }
    }
    Ok(lines.join("\n"))
}

fn child_elements<'a>(element: &'a HtmlElement, tag: &str) -> Vec<&'a HtmlElement> {
    element
        .children
        .iter()
        .filter_map(|node| match node {
            HtmlNode::Element(el) if el.tag_name == tag => Some(el),
            _ => None,
        })
        .collect()
}

fn row_cells(tr: &HtmlElement) -> Vec<(String, Alignment)> {
    tr.children
        .iter()
        .filter_map(|node| match node {
            HtmlNode::Element(cell) if cell.tag_name == "th" || cell.tag_name == "td" => {
                let content = inline_text(&cell.children).trim().replace('|', "\\|");
                Some((content, cell_alignment(cell)))
            }
            _ => None,
        })
        .collect()
}

fn cell_alignment(cell: &HtmlElement) -> Alignment {
    if let Some(style) = cell.attr("style") {
        for declaration in style.split(';') {
            let mut parts = declaration.splitn(2, ':');
            if parts.next().map(str::trim) == Some("text-align")
                && let Some(value) = parts.next()
            {
                return parse_alignment(value.trim());
            }
        }
    }
    cell.attr("align").map(parse_alignment).unwrap_or(Alignment::Default)
}

fn parse_alignment(value: &str) -> Alignment {
    match value.to_lowercase().as_str() {
        "left" => Alignment::Left,
        "center" => Alignment::Center,
        "right" => Alignment::Right,
        _ => Alignment::Default,
    }
}

fn render_table(table: &HtmlElement) -> String {
    let mut header: Vec<(String, Alignment)> = Vec::new();
    if let Some(thead) = child_elements(table, "thead").first()
        && let Some(tr) = child_elements(thead, "tr").first()
    {
        header = row_cells(tr);
    }

    // Rows live under tbody after document parsing, but accept direct
    // children too for hand-built trees.
    let mut body_rows: Vec<&HtmlElement> = Vec::new();
    for tbody in child_elements(table, "tbody") {
        body_rows.extend(child_elements(tbody, "tr"));
    }
    body_rows.extend(child_elements(table, "tr"));

    if header.is_empty() && !body_rows.is_empty() {
        header = row_cells(body_rows.remove(0));
    }
    if header.is_empty() {
        return String::new();
    }
    let column_count = header.len();

    let mut out = String::new();
    out.push_str("| ");
    out.push_str(&header.iter().map(|(text, _)| text.as_str()).join(" | "));
    out.push_str(" |\n|");
    for (_, alignment) in &header {
        out.push_str(match alignment {
            Alignment::Left => ":---",
            Alignment::Center => ":---:",
            Alignment::Right => "---:",
            Alignment::Default => "---",
        });
        out.push('|');
    }

    for tr in body_rows {
        let mut cells: Vec<String> = row_cells(tr).into_iter().map(|(text, _)| text).collect();
        cells.resize(column_count, String::new());
        cells.truncate(column_count);
        out.push('\n');
        out.push_str("| ");
        out.push_str(&cells.join(" | "));
        out.push_str(" |");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rustc_hash::FxHashMap;

    fn text(text: &str) -> HtmlNode {
        HtmlNode::Text(text.to_string())
    }

    fn element(tag: &str, children: Vec<HtmlNode>) -> HtmlNode {
        HtmlNode::Element(HtmlElement {
            tag_name: tag.to_string(),
            attributes: FxHashMap::default(),
            children,
        })
    }

    fn element_with_attrs(tag: &str, attrs: &[(&str, &str)], children: Vec<HtmlNode>) -> HtmlNode {
        let mut attributes = FxHashMap::default();
        for (name, value) in attrs {
            attributes.insert(name.to_string(), value.to_string());
        }
        HtmlNode::Element(HtmlElement {
            tag_name: tag.to_string(),
            attributes,
            children,
        })
    }

    #[rstest]
    #[case(vec![element("p", vec![text("Hello, world!")])], "Hello, world!")]
    #[case(vec![element("h1", vec![text("Title")])], "# Title")]
    #[case(vec![element("h3", vec![text("Deep")])], "### Deep")]
    #[case(vec![element("hr", vec![])], "---")]
    #[case(
        vec![element("p", vec![
            element("strong", vec![text("Bold")]),
            text(" and "),
            element("em", vec![text("Italic")]),
        ])],
        "**Bold** and *Italic*"
    )]
    #[case(
        vec![element_with_attrs("a", &[("href", "/about")], vec![text("About")])],
        "[About](/about)"
    )]
    #[case(
        vec![element_with_attrs("img", &[("src", "/img.png"), ("alt", "Image")], vec![])],
        "![Image](/img.png)"
    )]
    #[case(
        vec![element("ul", vec![
            element("li", vec![text("Item 1")]),
            element("li", vec![text("Item 2")]),
        ])],
        "- Item 1\n- Item 2"
    )]
    #[case(
        vec![element("ol", vec![
            element("li", vec![text("First")]),
            element("li", vec![text("Second")]),
        ])],
        "1. First\n2. Second"
    )]
    #[case(
        vec![element_with_attrs("ol", &[("start", "3")], vec![
            element("li", vec![text("Third")]),
            element("li", vec![text("Fourth")]),
        ])],
        "3. Third\n4. Fourth"
    )]
    #[case(
        vec![element("pre", vec![element("code", vec![text("let x = 1;")])])],
        "```\nlet x = 1;\n```"
    )]
    #[case(
        vec![element("blockquote", vec![element("p", vec![text("Quote")])])],
        "> Quote"
    )]
    #[case(
        vec![element("p", vec![element("del", vec![text("gone")])])],
        "~~gone~~"
    )]
    fn test_convert_nodes(#[case] nodes: Vec<HtmlNode>, #[case] expected: &str) {
        let markdown = convert_nodes_to_markdown(&nodes).unwrap();
        assert_eq!(markdown.trim(), expected);
    }

    #[test]
    fn test_nested_list_indentation() {
        let nodes = vec![element(
            "ul",
            vec![
                element(
                    "li",
                    vec![
                        text("Parent"),
                        element(
                            "ul",
                            vec![
                                element("li", vec![text("Child A")]),
                                element("li", vec![text("Child B")]),
                            ],
                        ),
                    ],
                ),
                element("li", vec![text("Sibling")]),
            ],
        )];
        let markdown = convert_nodes_to_markdown(&nodes).unwrap();
        assert_eq!(
            markdown,
            "- Parent\n    - Child A\n    - Child B\n- Sibling"
        );
    }

    #[test]
    fn test_code_block_language_class() {
        let nodes = vec![element(
            "pre",
            vec![element_with_attrs(
                "code",
                &[("class", "language-rust")],
                vec![text("fn main() {}")],
            )],
        )];
        assert_eq!(
            convert_nodes_to_markdown(&nodes).unwrap(),
            "```rust\nfn main() {}\n```"
        );
    }

    #[test]
    fn test_table_with_alignment() {
        let nodes = vec![element(
            "table",
            vec![
                element(
                    "thead",
                    vec![element(
                        "tr",
                        vec![
                            element_with_attrs("th", &[("align", "center")], vec![text("H1")]),
                            element("th", vec![text("H2")]),
                        ],
                    )],
                ),
                element(
                    "tbody",
                    vec![element(
                        "tr",
                        vec![
                            element("td", vec![text("a")]),
                            element("td", vec![text("b")]),
                        ],
                    )],
                ),
            ],
        )];
        assert_eq!(
            convert_nodes_to_markdown(&nodes).unwrap(),
            "| H1 | H2 |\n|:---:|---|\n| a | b |"
        );
    }

    #[test]
    fn test_table_first_body_row_as_header() {
        let nodes = vec![element(
            "table",
            vec![element(
                "tbody",
                vec![
                    element("tr", vec![element("td", vec![text("H")])]),
                    element("tr", vec![element("td", vec![text("C")])]),
                ],
            )],
        )];
        assert_eq!(
            convert_nodes_to_markdown(&nodes).unwrap(),
            "| H |\n|---|\n| C |"
        );
    }

    #[test]
    fn test_table_cell_pipe_escaped() {
        let nodes = vec![element(
            "table",
            vec![element(
                "tbody",
                vec![
                    element("tr", vec![element("td", vec![text("Head")])]),
                    element("tr", vec![element("td", vec![text("a | b")])]),
                ],
            )],
        )];
        assert!(
            convert_nodes_to_markdown(&nodes)
                .unwrap()
                .contains("a \\| b")
        );
    }

    #[test]
    fn test_blockquote_multiple_paragraphs() {
        let nodes = vec![element(
            "blockquote",
            vec![
                element("p", vec![text("First")]),
                element("p", vec![text("Second")]),
            ],
        )];
        assert_eq!(
            convert_nodes_to_markdown(&nodes).unwrap(),
            "> First\n>\n> Second"
        );
    }

    #[test]
    fn test_link_without_href_keeps_text() {
        let nodes = vec![element("p", vec![element("a", vec![text("plain")])])];
        assert_eq!(convert_nodes_to_markdown(&nodes).unwrap(), "plain");
    }

    #[test]
    fn test_url_with_spaces_and_parens() {
        let nodes = vec![element_with_attrs(
            "a",
            &[("href", "/my page (new)")],
            vec![text("x")],
        )];
        assert_eq!(
            convert_nodes_to_markdown(&nodes).unwrap(),
            "[x](</my%20page%20(new)>)"
        );
    }

    #[test]
    fn test_img_without_src_dropped() {
        let nodes = vec![element_with_attrs("img", &[("alt", "Alt")], vec![])];
        assert_eq!(convert_nodes_to_markdown(&nodes).unwrap(), "");
    }

    #[test]
    fn test_inline_code_keeps_raw_content() {
        let nodes = vec![element("p", vec![
            text("Run "),
            element("code", vec![text("a < b")]),
        ])];
        assert_eq!(convert_nodes_to_markdown(&nodes).unwrap(), "Run `a < b`");
    }

    #[test]
    fn test_blocks_separated_by_blank_line() {
        let nodes = vec![
            element("h1", vec![text("Title")]),
            element("p", vec![text("Body")]),
        ];
        assert_eq!(convert_nodes_to_markdown(&nodes).unwrap(), "# Title\n\nBody");
    }

    #[test]
    fn test_container_flattening() {
        let nodes = vec![element(
            "div",
            vec![element(
                "section",
                vec![element("h2", vec![text("Nested")])],
            )],
        )];
        assert_eq!(convert_nodes_to_markdown(&nodes).unwrap(), "## Nested");
    }
}
