//! HTML rendering of resolved evidence.
//!
//! Document text is always escaped before it is placed next to markup. Each
//! piece (context before, quote, context after) is escaped on its own, so an
//! entity can never be split across the `<mark>` boundary.

use crate::text::SourceText;

use super::types::Evidence;

/// Escape text for use in HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render a highlighted snippet for one piece of evidence
pub fn render(evidence: &Evidence) -> String {
    format!(
        r#"<div class="evidence">...{}<mark class="highlight">{}</mark>{}...</div>"#,
        escape_html(&evidence.context_before),
        escape_html(&evidence.quote),
        escape_html(&evidence.context_after),
    )
}

/// Render the whole document with every evidence span highlighted.
///
/// Spans are applied in document order; a span overlapping one already
/// highlighted is skipped.
pub fn render_document(full_text: &str, evidence: &[Evidence]) -> String {
    let document = SourceText::new(full_text);
    let mut spans: Vec<_> = evidence
        .iter()
        .map(Evidence::span)
        .filter(|span| !span.is_empty() && span.end <= document.char_len())
        .collect();
    spans.sort_by_key(|span| (span.start, span.end));

    let mut html = String::from(r#"<div class="document">"#);
    let mut cursor = 0;
    for span in spans {
        if span.start < cursor {
            continue;
        }
        html.push_str(&escape_html(document.slice(cursor, span.start)));
        html.push_str(&format!(
            r#"<mark class="highlight" data-start="{}" data-end="{}">{}</mark>"#,
            span.start,
            span.end,
            escape_html(document.slice_span(span)),
        ));
        cursor = span.end;
    }
    html.push_str(&escape_html(document.slice(cursor, document.char_len())));
    html.push_str("</div>");
    html
}

/// A standalone review page: one snippet per evidence, then the document
pub fn render_page(title: &str, full_text: &str, evidence: &[Evidence]) -> String {
    let mut html = String::new();
    html.push_str("<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    html.push_str(
        "<style>\n\
         body { font-family: system-ui, sans-serif; margin: 20px; }\n\
         .evidence { margin: 8px 0; padding: 8px; border-left: 3px solid #ccc; }\n\
         .document { white-space: pre-wrap; border: 1px solid #eee; padding: 12px; }\n\
         mark.highlight { background: #fffb8f; }\n\
         </style>\n</head>\n<body>\n",
    );
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(title)));
    for item in evidence {
        html.push_str(&render(item));
        html.push('\n');
    }
    html.push_str(&render_document(full_text, evidence));
    html.push_str("\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::types::ResolutionMethod;

    fn evidence(before: &str, quote: &str, after: &str, start: usize) -> Evidence {
        Evidence {
            quote: quote.to_string(),
            source_chunk_id: None,
            start_char: start,
            end_char: start + quote.chars().count(),
            context_before: before.to_string(),
            context_after: after.to_string(),
            method: ResolutionMethod::ExactDocument,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"A&B"</b> 'x'"#),
            "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt; &#x27;x&#x27;"
        );
    }

    #[test]
    fn test_render_escapes_each_part() {
        let html = render(&evidence("p<0.05 & ", "OR>1", " <i>", 9));
        assert_eq!(
            html,
            r#"<div class="evidence">...p&lt;0.05 &amp; <mark class="highlight">OR&gt;1</mark> &lt;i&gt;...</div>"#
        );
    }

    #[test]
    fn test_render_document_highlights_in_order() {
        let text = "a <b> c & d";
        let items = vec![evidence("", "d", "", 10), evidence("", "<b>", "", 2)];
        let html = render_document(text, &items);
        assert_eq!(
            html,
            concat!(
                r#"<div class="document">a "#,
                r#"<mark class="highlight" data-start="2" data-end="5">&lt;b&gt;</mark>"#,
                r#" c &amp; "#,
                r#"<mark class="highlight" data-start="10" data-end="11">d</mark>"#,
                "</div>"
            )
        );
    }

    #[test]
    fn test_render_document_skips_overlaps() {
        let text = "abcdef";
        let items = vec![evidence("", "abcd", "", 0), evidence("", "cdef", "", 2)];
        let html = render_document(text, &items);
        assert_eq!(html.matches("<mark").count(), 1);
        assert!(html.ends_with("ef</div>"));
    }

    #[test]
    fn test_render_page_escapes_title() {
        let page = render_page("A<B>", "text", &[]);
        assert!(page.contains("<title>A&lt;B&gt;</title>"));
        assert!(page.contains(r#"<div class="document">text</div>"#));
    }
}
