//! Local preview: compiled markup assembled into a standalone HTML
//! document a host can hand to any embedded browser frame, plus a
//! textual snapshot for headless inspection.

use scraper::{Html, Selector};

// Same frame reset the embedded preview frame applies, so the local
// render matches what the hosted service draws onto the image canvas.
const FRAME_RESET_CSS: &str =
    "body, html { height: 100%; padding: 0; margin: 0; }";

/// Wrap compiled template markup and the user stylesheet into a
/// self-contained document.
pub fn preview_document(compiled_html: &str, css: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <style type=\"text/css\">{}</style>\n\
         <style type=\"text/css\">{}</style>\n\
         </head>\n<body>{}</body>\n</html>\n",
        FRAME_RESET_CSS, css, compiled_html
    )
}

/// A textual snapshot of the local preview.
///
/// `title` is the text of the first `<h1>` (the headline slot of a
/// typical OpenGraph card); `text` is the full body text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSnapshot {
    pub title: String,
    pub text: String,
}

/// Extract a [`TextSnapshot`] from an assembled preview document.
pub fn text_snapshot(document: &str) -> TextSnapshot {
    let document = Html::parse_document(document);
    let h1_sel = Selector::parse("h1").unwrap();
    let body_sel = Selector::parse("body").unwrap();

    let title = document
        .select(&h1_sel)
        .next()
        .map(|n| n.text().collect::<String>())
        .unwrap_or_default();

    let text = document
        .select(&body_sel)
        .next()
        .map(|b| b.text().collect::<String>())
        .unwrap_or_default();

    TextSnapshot { title, text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_embeds_styles_and_markup() {
        let doc = preview_document("<h1>Hi</h1>", "h1 { color: red }");
        assert!(doc.contains("<h1>Hi</h1>"));
        assert!(doc.contains("h1 { color: red }"));
        assert!(doc.contains(FRAME_RESET_CSS));
        assert!(doc.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn snapshot_extracts_headline_and_body_text() {
        let doc = preview_document("<h1>Launch day</h1><p>It works</p>", "");
        let snapshot = text_snapshot(&doc);
        assert_eq!(snapshot.title, "Launch day");
        assert!(snapshot.text.contains("Launch day"));
        assert!(snapshot.text.contains("It works"));
    }

    #[test]
    fn snapshot_of_empty_document() {
        let snapshot = text_snapshot(&preview_document("", ""));
        assert_eq!(snapshot.title, "");
        assert_eq!(snapshot.text.trim(), "");
    }
}
