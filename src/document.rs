//! Thin HTML document handle.
//!
//! The client layer treats HTML parsing as an external capability: it accepts
//! text and returns a queryable handle, nothing more. The handle wraps
//! `scraper::Html`; callers needing full query power can reach the inner
//! document directly.

use scraper::{Html, Selector};

/// A parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses document text. HTML parsing is lenient and never fails;
    /// malformed input yields a best-effort tree.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }

    /// The underlying parsed document, for full selector queries.
    #[must_use]
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Whether at least one element matches the CSS selector.
    ///
    /// An invalid selector matches nothing. Handy for presence checks such as
    /// "is there still a login form on this page".
    #[must_use]
    pub fn has(&self, css: &str) -> bool {
        Selector::parse(css)
            .map(|selector| self.html.select(&selector).next().is_some())
            .unwrap_or(false)
    }

    /// Concatenated text of the first element matching the CSS selector.
    #[must_use]
    pub fn first_text(&self, css: &str) -> Option<String> {
        let selector = Selector::parse(css).ok()?;
        let element = self.html.select(&selector).next()?;
        Some(element.text().collect::<String>().trim().to_string())
    }
}
