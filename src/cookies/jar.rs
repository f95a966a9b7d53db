//! Enumerable cookie jar bridging normalized records and the HTTP transport.
//!
//! reqwest's builtin `Jar` can answer "which cookies apply to this URL?" but
//! cannot enumerate its contents, which makes flushing live cookie state to
//! durable storage impossible. [`RecordJar`] keeps the live state as plain
//! [`CookieRecord`]s instead: `Set-Cookie` response headers are decoded into
//! records, the `Cookie` request header is rendered from matching records,
//! and the whole set can be seeded from or snapshotted to a [`CookieSet`] at
//! any time.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::header::HeaderValue;
use tracing::{debug, warn};
use url::Url;

use super::record::{CookieRecord, CookieSet};

/// Thread-safe, enumerable cookie jar.
///
/// Implements [`reqwest::cookie::CookieStore`] so it can be installed as a
/// transport's cookie provider, while remaining readable for persistence.
/// Within the jar, a new cookie replaces any existing cookie occupying the
/// same (name, domain, path) slot.
#[derive(Debug, Default)]
pub struct RecordJar {
    records: Mutex<Vec<CookieRecord>>,
}

impl RecordJar {
    /// Creates an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entire jar contents with the given records.
    ///
    /// Used to seed a fresh transport from a previously persisted set before
    /// the first request.
    pub fn seed(&self, records: &[CookieRecord]) {
        let mut guard = self.lock();
        *guard = records.to_vec();
    }

    /// Returns a copy of the current jar contents, in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> CookieSet {
        self.lock().clone()
    }

    /// Number of cookies currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the jar holds no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Inserts a record, replacing any record in the same (name, domain, path)
    /// slot. An already-expired record acts as a deletion.
    pub fn upsert(&self, record: CookieRecord) {
        let now = now_epoch();
        let mut guard = self.lock();
        let slot = guard.iter().position(|existing| existing.same_slot(&record));

        if record.is_expired_at(now) {
            if let Some(index) = slot {
                debug!(name = %record.name, domain = %record.domain, "removing expired cookie");
                guard.remove(index);
            }
            return;
        }

        match slot {
            Some(index) => guard[index] = record,
            None => guard.push(record),
        }
    }

    // Mutex poisoning only happens if a holder panicked mid-update; the data
    // is plain records, so recover the guard rather than propagate.
    fn lock(&self) -> MutexGuard<'_, Vec<CookieRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl reqwest::cookie::CookieStore for RecordJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else {
                warn!(url = %url, "skipping non-UTF-8 Set-Cookie header");
                continue;
            };
            match parse_set_cookie(raw, url) {
                Some(record) => {
                    debug!(
                        name = %record.name,
                        domain = %record.domain,
                        path = %record.path,
                        "stored response cookie"
                    );
                    self.upsert(record);
                }
                None => warn!(url = %url, "skipping malformed Set-Cookie header"),
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let host = url.host_str()?;
        let request_path = url.path();
        let is_https = url.scheme() == "https";
        let now = now_epoch();

        let header = self
            .lock()
            .iter()
            .filter(|cookie| !cookie.is_expired_at(now))
            .filter(|cookie| !cookie.secure || is_https)
            .filter(|cookie| domain_matches(&cookie.domain, host))
            .filter(|cookie| path_matches(&cookie.path, request_path))
            .map(|cookie| format!("{}={}", cookie.name, cookie.value()))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            HeaderValue::from_str(&header).ok()
        }
    }
}

/// Decodes one `Set-Cookie` header into a record, scoped by the request URL.
///
/// Unknown attributes are ignored. A missing `Domain` attribute yields a
/// host-only cookie; an explicit one is normalized to a leading dot so
/// subdomains match, and the cookie is rejected outright when the request
/// host is not within that domain. A missing `Path` defaults to the directory of the
/// request path. `Expires`/`Max-Age` clear the session-cookie `discard` flag.
fn parse_set_cookie(raw: &str, url: &Url) -> Option<CookieRecord> {
    let mut parts = raw.split(';');

    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let host = url.host_str()?;
    let mut record = CookieRecord::new(name, value.trim(), host, default_path(url));

    for part in parts {
        let part = part.trim();
        if let Some((key, attr_value)) = part.split_once('=') {
            let attr_value = attr_value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "domain" if !attr_value.is_empty() => {
                    let bare = attr_value.trim_start_matches('.');
                    let scoped = format!(".{bare}");
                    // RFC 6265 §5.3: a Domain attribute the request host is
                    // not itself inside rejects the whole cookie. Anything
                    // else would let one site plant cookies for another.
                    if !domain_matches(&scoped, host) {
                        return None;
                    }
                    record.domain = scoped;
                }
                "path" if attr_value.starts_with('/') => {
                    record.path = attr_value.to_string();
                }
                "expires" => {
                    if let Ok(time) = httpdate::parse_http_date(attr_value) {
                        record.expires = epoch_secs(time);
                        record.discard = false;
                    }
                }
                "max-age" => {
                    if let Ok(seconds) = attr_value.parse::<i64>() {
                        record.expires = if seconds <= 0 {
                            // Non-positive Max-Age is an immediate deletion.
                            Some(now_epoch())
                        } else {
                            Some(now_epoch().saturating_add(seconds.unsigned_abs()))
                        };
                        record.discard = false;
                    }
                }
                _ => {}
            }
        } else if part.eq_ignore_ascii_case("secure") {
            record.secure = true;
        }
    }

    Some(record)
}

/// Default cookie path: the directory of the request path (RFC 6265 §5.1.4).
fn default_path(url: &Url) -> String {
    match url.path().rsplit_once('/') {
        Some((prefix, _)) if !prefix.is_empty() => prefix.to_string(),
        _ => "/".to_string(),
    }
}

/// Whether a cookie scoped to `cookie_domain` is sent to `host`.
///
/// A leading dot means the registered domain itself plus any subdomain;
/// otherwise the match is exact (host-only cookie).
fn domain_matches(cookie_domain: &str, host: &str) -> bool {
    match cookie_domain.strip_prefix('.') {
        Some(bare) => host == bare || host.ends_with(cookie_domain),
        None => host == cookie_domain,
    }
}

/// RFC 6265 §5.1.4 path matching.
fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

fn now_epoch() -> u64 {
    epoch_secs(SystemTime::now()).unwrap_or(0)
}

fn epoch_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}
