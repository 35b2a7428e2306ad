//! Text cleanup helpers used when normalizing source fields.

use scraper::{ElementRef, Html, Node};

/// Inline elements (HTML and JATS local names) that do not separate words
const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bold", "code", "em", "i", "italic", "sc", "small", "span", "strong", "sub",
    "sup", "u", "underline",
];

/// Collapse runs of whitespace into single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop HTML/JATS markup and keep the text content
///
/// Block elements (paragraphs, headings, JATS sections) become word breaks.
/// Plain text passes through unchanged apart from whitespace collapsing.
pub fn strip_markup(text: &str) -> String {
    if !text.contains('<') {
        return collapse_whitespace(text);
    }

    let fragment = Html::parse_fragment(text);
    let mut content = String::with_capacity(text.len());
    collect_text(fragment.root_element(), &mut content);
    collapse_whitespace(&content)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            let local = name.rsplit(':').next().unwrap_or(name);
            let block = !INLINE_ELEMENTS.contains(&local);

            if block {
                out.push(' ');
            }
            collect_text(child_element, out);
            if block {
                out.push(' ');
            }
        } else if let Node::Text(text) = child.value() {
            out.push_str(text);
        }
    }
}
