use scraper::node::Element;
use scraper::{ElementRef, Html};

/// Metadata extracted from a page's meta tags, canonical link, root `lang`
/// attribute and title. Every field is optional; `language` falls back to
/// `"en"` when the document does not declare one.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub author: Option<String>,
    pub canonical: Option<String>,
    pub language: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_type: Option<String>,
    pub og_url: Option<String>,
    pub og_image: Option<String>,
    pub og_site_name: Option<String>,
    pub og_locale: Option<String>,
    pub article_author: Option<String>,
    pub article_published_time: Option<String>,
    pub article_modified_time: Option<String>,
    pub article_section: Option<String>,
    pub article_tag: Option<Vec<String>>,
    pub twitter_card: Option<String>,
    pub twitter_title: Option<String>,
    pub twitter_description: Option<String>,
    pub twitter_image: Option<String>,
    pub twitter_creator: Option<String>,
    pub twitter_site: Option<String>,
    pub robots_index: Option<bool>,
    pub robots_follow: Option<bool>,
}

/// Extracts metadata and JSON-LD structured data from the ORIGINAL (not yet
/// sanitized) document in a single DOM traversal. Malformed JSON-LD blocks
/// are skipped without affecting the rest of the document.
pub fn extract_metadata(html: &str) -> (PageMetadata, Vec<String>) {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut metadata = PageMetadata::default();
    let mut structured_data = Vec::new();

    metadata.language = Some(
        root.value()
            .attr("lang")
            .filter(|lang| !lang.is_empty())
            .unwrap_or("en")
            .to_string(),
    );

    for node in root.descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        match element.value().name() {
            "title" => {
                if metadata.title.is_none() {
                    let title = element.text().collect::<String>().trim().to_string();
                    if !title.is_empty() {
                        metadata.title = Some(title);
                    }
                }
            }
            "link" => {
                if metadata.canonical.is_none()
                    && element.value().attr("rel") == Some("canonical")
                    && let Some(href) = element.value().attr("href")
                {
                    metadata.canonical = Some(href.to_string());
                }
            }
            "meta" => apply_meta_tag(&mut metadata, element.value()),
            "script" => {
                if element
                    .value()
                    .attr("type")
                    .is_some_and(|t| t.eq_ignore_ascii_case("application/ld+json"))
                {
                    let raw = element.text().collect::<String>();
                    let raw = raw.trim();
                    if raw.is_empty() {
                        continue;
                    }
                    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw)
                        && let Ok(pretty) = serde_json::to_string_pretty(&value)
                    {
                        structured_data.push(pretty);
                    }
                }
            }
            _ => {}
        }
    }

    (metadata, structured_data)
}

fn apply_meta_tag(metadata: &mut PageMetadata, element: &Element) {
    let Some(content) = element.attr("content") else {
        return;
    };
    if content.is_empty() {
        return;
    }
    let content = content.to_string();

    if let Some(name) = element.attr("name") {
        match name.to_lowercase().as_str() {
            "description" => metadata.description = Some(content.clone()),
            "keywords" => {
                let keywords: Vec<String> = content
                    .split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect();
                metadata.keywords = Some(keywords);
            }
            "author" => metadata.author = Some(content.clone()),
            "robots" => {
                let robots = content.to_lowercase();
                metadata.robots_index = Some(!robots.contains("noindex"));
                metadata.robots_follow = Some(!robots.contains("nofollow"));
            }
            other => {
                if let Some(field) = other.strip_prefix("twitter:") {
                    let slot = match field {
                        "card" => &mut metadata.twitter_card,
                        "title" => &mut metadata.twitter_title,
                        "description" => &mut metadata.twitter_description,
                        "image" => &mut metadata.twitter_image,
                        "creator" => &mut metadata.twitter_creator,
                        "site" => &mut metadata.twitter_site,
                        _ => return,
                    };
                    *slot = Some(content.clone());
                }
            }
        }
    }

    if let Some(property) = element.attr("property") {
        if let Some(field) = property.strip_prefix("og:") {
            let slot = match field {
                "title" => &mut metadata.og_title,
                "description" => &mut metadata.og_description,
                "type" => &mut metadata.og_type,
                "url" => &mut metadata.og_url,
                "image" => &mut metadata.og_image,
                "site_name" => &mut metadata.og_site_name,
                "locale" => &mut metadata.og_locale,
                _ => return,
            };
            *slot = Some(content);
        } else if let Some(field) = property.strip_prefix("article:") {
            match field {
                "author" => metadata.article_author = Some(content),
                "published_time" => metadata.article_published_time = Some(content),
                "modified_time" => metadata.article_modified_time = Some(content),
                "section" => metadata.article_section = Some(content),
                // article:tag is repeatable and accumulates.
                "tag" => metadata.article_tag.get_or_insert_default().push(content),
                _ => {}
            }
        }
    }
}

fn yaml_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn push_string(lines: &mut Vec<String>, key: &str, value: Option<&String>) {
    if let Some(value) = value
        && !value.trim().is_empty()
    {
        lines.push(format!("{}: {}", key, yaml_quote(value)));
    }
}

fn push_list(lines: &mut Vec<String>, key: &str, value: Option<&Vec<String>>) {
    if let Some(items) = value
        && !items.is_empty()
    {
        lines.push(format!("{}:", key));
        for item in items {
            lines.push(format!("  - {}", yaml_quote(item)));
        }
    }
}

fn push_bool(lines: &mut Vec<String>, key: &str, value: Option<bool>) {
    if let Some(value) = value {
        lines.push(format!("{}: {}", key, value));
    }
}

impl PageMetadata {
    /// Renders the populated fields as a `---`-delimited frontmatter block.
    /// The field order is fixed so output is deterministic. Returns `None`
    /// when no field is set.
    pub fn to_frontmatter(&self) -> Option<String> {
        let mut lines = vec!["---".to_string()];

        push_string(&mut lines, "title", self.title.as_ref());
        push_string(&mut lines, "description", self.description.as_ref());
        push_list(&mut lines, "keywords", self.keywords.as_ref());
        push_string(&mut lines, "author", self.author.as_ref());
        push_string(&mut lines, "canonical", self.canonical.as_ref());
        push_string(&mut lines, "language", self.language.as_ref());

        push_string(&mut lines, "og_title", self.og_title.as_ref());
        push_string(&mut lines, "og_description", self.og_description.as_ref());
        push_string(&mut lines, "og_type", self.og_type.as_ref());
        push_string(&mut lines, "og_url", self.og_url.as_ref());
        push_string(&mut lines, "og_image", self.og_image.as_ref());
        push_string(&mut lines, "og_site_name", self.og_site_name.as_ref());
        push_string(&mut lines, "og_locale", self.og_locale.as_ref());

        push_string(&mut lines, "article_author", self.article_author.as_ref());
        push_string(
            &mut lines,
            "article_published_time",
            self.article_published_time.as_ref(),
        );
        push_string(
            &mut lines,
            "article_modified_time",
            self.article_modified_time.as_ref(),
        );
        push_string(&mut lines, "article_section", self.article_section.as_ref());
        push_list(&mut lines, "article_tag", self.article_tag.as_ref());

        push_string(&mut lines, "twitter_card", self.twitter_card.as_ref());
        push_string(&mut lines, "twitter_title", self.twitter_title.as_ref());
        push_string(
            &mut lines,
            "twitter_description",
            self.twitter_description.as_ref(),
        );
        push_string(&mut lines, "twitter_image", self.twitter_image.as_ref());
        push_string(&mut lines, "twitter_creator", self.twitter_creator.as_ref());
        push_string(&mut lines, "twitter_site", self.twitter_site.as_ref());

        push_bool(&mut lines, "robots_index", self.robots_index);
        push_bool(&mut lines, "robots_follow", self.robots_follow);

        if lines.len() == 1 {
            return None;
        }
        lines.push("---".to_string());
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html lang="ja">
<head>
  <title> My Page </title>
  <meta name="description" content="A description">
  <meta name="keywords" content="one, two,, three ">
  <meta name="author" content="Someone">
  <meta name="robots" content="noindex, follow">
  <meta name="twitter:card" content="summary">
  <meta name="twitter:creator" content="@someone">
  <meta property="og:title" content="OG Title">
  <meta property="og:site_name" content="Site">
  <meta property="article:tag" content="rust">
  <meta property="article:tag" content="markdown">
  <link rel="canonical" href="https://example.com/page">
</head>
<body><h1>Body</h1></body>
</html>"#;

    #[test]
    fn test_extract_basic_fields() {
        let (meta, _) = extract_metadata(PAGE);
        assert_eq!(meta.title.as_deref(), Some("My Page"));
        assert_eq!(meta.description.as_deref(), Some("A description"));
        assert_eq!(meta.author.as_deref(), Some("Someone"));
        assert_eq!(meta.canonical.as_deref(), Some("https://example.com/page"));
        assert_eq!(meta.language.as_deref(), Some("ja"));
    }

    #[test]
    fn test_keywords_split_and_trimmed() {
        let (meta, _) = extract_metadata(PAGE);
        assert_eq!(
            meta.keywords,
            Some(vec!["one".to_string(), "two".to_string(), "three".to_string()])
        );
    }

    #[test]
    fn test_robots_token_absence() {
        let (meta, _) = extract_metadata(PAGE);
        assert_eq!(meta.robots_index, Some(false));
        assert_eq!(meta.robots_follow, Some(true));
    }

    #[test]
    fn test_twitter_og_and_article_dispatch() {
        let (meta, _) = extract_metadata(PAGE);
        assert_eq!(meta.twitter_card.as_deref(), Some("summary"));
        assert_eq!(meta.twitter_creator.as_deref(), Some("@someone"));
        assert_eq!(meta.og_title.as_deref(), Some("OG Title"));
        assert_eq!(meta.og_site_name.as_deref(), Some("Site"));
        assert_eq!(
            meta.article_tag,
            Some(vec!["rust".to_string(), "markdown".to_string()])
        );
    }

    #[test]
    fn test_first_canonical_link_wins() {
        let html = r#"<html><head>
<link rel="canonical" href="https://example.com/first">
<link rel="canonical" href="https://example.com/second">
</head></html>"#;
        let (meta, _) = extract_metadata(html);
        assert_eq!(meta.canonical.as_deref(), Some("https://example.com/first"));
    }

    #[test]
    fn test_language_defaults_to_en() {
        let (meta, _) = extract_metadata("<html><body></body></html>");
        assert_eq!(meta.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_meta_without_content_ignored() {
        let (meta, _) =
            extract_metadata(r#"<html><head><meta name="description"></head></html>"#);
        assert_eq!(meta.description, None);
    }

    #[test]
    fn test_json_ld_valid_kept_invalid_skipped() {
        let html = r#"<html><head>
<script type="application/ld+json">{"@type": "Article", "name": "Ok"}</script>
<script type="application/ld+json">{not valid json</script>
</head><body></body></html>"#;
        let (_, blocks) = extract_metadata(html);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].contains("\"@type\": \"Article\""));
    }

    #[test]
    fn test_json_ld_pretty_printed_in_order() {
        let html = r#"<html><head>
<script type="application/ld+json">{"a":1}</script>
<script type="application/ld+json">[1,2]</script>
</head></html>"#;
        let (_, blocks) = extract_metadata(html);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], "{\n  \"a\": 1\n}");
        assert!(blocks[1].starts_with('['));
    }

    #[test]
    fn test_frontmatter_field_order_and_quoting() {
        let meta = PageMetadata {
            title: Some("A \"quoted\" title".to_string()),
            description: Some("desc\\path".to_string()),
            keywords: Some(vec!["k1".to_string(), "k2".to_string()]),
            language: Some("en".to_string()),
            robots_index: Some(true),
            ..Default::default()
        };
        let fm = meta.to_frontmatter().unwrap();
        let expected = concat!(
            "---\n",
            "title: \"A \\\"quoted\\\" title\"\n",
            "description: \"desc\\\\path\"\n",
            "keywords:\n",
            "  - \"k1\"\n",
            "  - \"k2\"\n",
            "language: \"en\"\n",
            "robots_index: true\n",
            "---"
        );
        assert_eq!(fm, expected);
    }

    #[test]
    fn test_frontmatter_empty_metadata() {
        assert_eq!(PageMetadata::default().to_frontmatter(), None);
    }
}
