//! Readable text extraction from entry HTML built on `scraper`.

use scraper::{ElementRef, Html};

/// Subtrees that never contain article text.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "template", "noscript", "svg", "nav", "header", "footer", "aside", "form",
    "iframe", "button",
];

/// Elements that end a line of text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre",
    "table", "tr", "td", "th", "section", "article", "figure", "figcaption", "hr", "dd", "dt",
];

/// Extract the main readable text of an entry body.
///
/// Every outermost `article` element is used as a content root, in document
/// order. Without any, the first `main`, else `body` element is used.
/// Boilerplate subtrees are skipped and whitespace is collapsed. Malformed
/// markup never fails: the HTML parser recovers and the best-effort text is
/// returned. Plain text passes through unchanged apart from whitespace
/// normalization.
pub fn extract_readable_text(content: &str) -> String {
    if content.trim().is_empty() {
        return String::new();
    }

    let document = Html::parse_document(content);

    let mut raw = String::with_capacity(content.len());
    for root in pick_roots(&document) {
        collect_text(root, &mut raw);
        raw.push('\n');
    }
    collapse_whitespace(&raw)
}

fn pick_roots(document: &Html) -> Vec<ElementRef<'_>> {
    let elements = || {
        document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
    };

    // Nested articles are already covered by their outermost ancestor
    let articles: Vec<ElementRef<'_>> = elements()
        .filter(|element| is_named(element, "article"))
        .filter(|element| {
            !element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| is_named(&ancestor, "article"))
        })
        .collect();
    if !articles.is_empty() {
        return articles;
    }

    let root = elements()
        .find(|element| is_named(element, "main"))
        .or_else(|| elements().find(|element| is_named(element, "body")))
        .unwrap_or_else(|| document.root_element());
    vec![root]
}

fn is_named(element: &ElementRef<'_>, name: &str) -> bool {
    element.value().name() == name
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if SKIPPED_TAGS.contains(&name) {
                continue;
            }
            let is_block = BLOCK_TAGS.contains(&name);
            if is_block {
                out.push('\n');
            }
            collect_text(child_element, out);
            if is_block {
                out.push('\n');
            }
        }
    }
}

fn collapse_whitespace(input: &str) -> String {
    let mut buf = String::with_capacity(input.len());
    let mut last_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_space && !buf.is_empty() {
                buf.push(' ');
            }
            last_space = true;
        } else {
            buf.push(ch);
            last_space = false;
        }
    }
    buf.trim_end().to_string()
}
