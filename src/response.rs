//! Fully buffered HTTP response.
//!
//! Responses are read to completion before being handed out. Buffering is
//! what lets login detection inspect the body and still pass the same
//! response on to the caller, and it is also where the HTML document handle
//! is parsed from.

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use url::Url;

use crate::document::Document;
use crate::error::FetchError;

/// One completed HTTP exchange: final URL, status, headers, and body text.
#[derive(Debug, Clone)]
pub struct PageResponse {
    url: Url,
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl PageResponse {
    /// Buffers a reqwest response into a [`PageResponse`].
    ///
    /// # Errors
    ///
    /// Returns a transport error when reading the body fails mid-stream.
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, FetchError> {
        let url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|error| FetchError::from_send(url.as_str(), error))?;
        Ok(Self {
            url,
            status,
            headers,
            body,
        })
    }

    /// Builds a response directly from parts. Intended for tests and for
    /// [`Authenticator`](crate::Authenticator) implementations that probe
    /// synthetic responses.
    #[must_use]
    pub fn from_parts(url: Url, status: StatusCode, headers: HeaderMap, body: String) -> Self {
        Self {
            url,
            status,
            headers,
            body,
        }
    }

    /// Final URL of the response, after any redirects.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// HTTP status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Response headers (case-insensitive map).
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Response body as text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Parses the body into an HTML document handle.
    #[must_use]
    pub fn document(&self) -> Document {
        Document::parse(&self.body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn page(body: &str) -> PageResponse {
        PageResponse::from_parts(
            "http://example.test/page".parse().unwrap(),
            StatusCode::OK,
            HeaderMap::new(),
            body.to_string(),
        )
    }

    #[test]
    fn test_accessors() {
        let response = page("hello");
        assert_eq!(response.url().as_str(), "http://example.test/page");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.is_success());
        assert_eq!(response.text(), "hello");
    }

    #[test]
    fn test_document_parses_body() {
        let response = page("<html><body><h1 id='t'>Title</h1></body></html>");
        let document = response.document();
        assert_eq!(document.first_text("h1#t").as_deref(), Some("Title"));
    }
}
