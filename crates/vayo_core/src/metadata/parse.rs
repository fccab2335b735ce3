//! HTML extraction with `scraper`.

use super::PageMetadata;
use crate::constants::SUMMARY_MAX_CHARS;
use crate::url::resolve_http_reference;
use reqwest::Url;
use scraper::{Html, Selector};

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: &str) -> Option<String> {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

fn first_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    let selector = selector(css)?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .find_map(non_empty)
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = selector(css)?;
    document
        .select(&selector)
        .map(|element| element.text().collect::<String>())
        .find_map(|text| non_empty(&text))
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        None => text.to_string(),
        Some((cut, _)) => {
            let head = &text[..cut];
            let head = head.rsplit_once(' ').map(|(words, _)| words).unwrap_or(head);
            format!("{}...", head.trim_end())
        }
    }
}

fn paragraph_summary(document: &Html) -> Option<String> {
    let selector = selector("p")?;
    let text = document
        .select(&selector)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|paragraph| !paragraph.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(truncate_chars(&text, SUMMARY_MAX_CHARS))
    }
}

/// Extract metadata from an HTML document fetched from `page_url`.
///
/// Title prefers `og:title` over `<title>`; description prefers the plain
/// `description` meta over `og:description`. Favicon and preview-image
/// references are resolved against `page_url` and dropped unless they end up
/// http(s).
pub fn extract_metadata(html: &str, page_url: &Url, with_summary: bool) -> PageMetadata {
    let document = Html::parse_document(html);

    let title = first_attr(&document, r#"meta[property="og:title"]"#, "content")
        .or_else(|| first_text(&document, "title"));
    let description = first_attr(&document, r#"meta[name="description"]"#, "content")
        .or_else(|| first_attr(&document, r#"meta[property="og:description"]"#, "content"));
    let favicon_url = first_attr(&document, r#"link[rel~="icon"]"#, "href")
        .and_then(|href| resolve_http_reference(page_url, &href));
    let og_image_url = first_attr(&document, r#"meta[property="og:image"]"#, "content")
        .and_then(|href| resolve_http_reference(page_url, &href));
    let summary = if with_summary {
        paragraph_summary(&document)
    } else {
        None
    };

    PageMetadata {
        title,
        description,
        favicon_url,
        og_image_url,
        summary,
    }
}
