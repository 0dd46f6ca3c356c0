//! Security utilities for input validation.
//!
//! This module provides:
//! - Video URL validation (SSRF protection for URL downloads)
//! - A download client that re-validates every redirect hop
//! - Confinement of client-supplied video paths to the managed directories

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;
use url::{Host, Url};

/// Maximum URL length to prevent DoS attacks.
pub const MAX_URL_LENGTH: usize = 2048;

/// Blocked URL patterns (internal hosts and metadata endpoints).
static BLOCKED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^https?://localhost(:|/|$)",
        r"^https?://[^/]*\.localhost(:|/|$)",
        r"^https?://metadata\.",
        r"^https?://metadata\.google\.internal",
        r"^https?://[^/]*\.internal(:|/|$)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Result of URL validation.
#[derive(Debug, PartialEq, Eq)]
pub enum UrlValidationResult {
    /// URL is valid and allowed.
    Valid(String),
    /// URL is malformed or uses an unsupported protocol.
    Invalid(String),
    /// URL targets an internal or restricted endpoint.
    Blocked(String),
    /// URL exceeds maximum length.
    TooLong,
}

impl UrlValidationResult {
    /// Convert to Result for easy error handling.
    pub fn into_result(self) -> Result<String, String> {
        match self {
            Self::Valid(url) => Ok(url),
            Self::Invalid(msg) | Self::Blocked(msg) => Err(msg),
            Self::TooLong => Err(format!(
                "URL exceeds maximum length of {} characters",
                MAX_URL_LENGTH
            )),
        }
    }
}

/// Validate a video download URL.
///
/// Any public http/https host is accepted. Loopback, private, link-local and
/// metadata targets are rejected unless `allow_private` is set.
pub fn validate_video_url(url: &str, allow_private: bool) -> UrlValidationResult {
    if url.len() > MAX_URL_LENGTH {
        return UrlValidationResult::TooLong;
    }

    let url = url.trim();
    if url.is_empty() {
        return UrlValidationResult::Invalid("URL cannot be empty".to_string());
    }

    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(e) => return UrlValidationResult::Invalid(format!("Invalid URL format: {}", e)),
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return UrlValidationResult::Invalid(format!(
                "Invalid protocol '{}'. Only HTTP and HTTPS are allowed.",
                scheme
            ))
        }
    }

    let host = match parsed.host() {
        Some(h) => h,
        None => return UrlValidationResult::Invalid("URL must have a valid host".to_string()),
    };

    if !allow_private {
        let internal_ip = match host {
            Host::Ipv4(ip) => is_internal_ip(IpAddr::V4(ip)),
            Host::Ipv6(ip) => is_internal_ip(IpAddr::V6(ip)),
            Host::Domain(_) => false,
        };
        let lowered = url.to_lowercase();
        if internal_ip || BLOCKED_PATTERNS.iter().any(|p| p.is_match(&lowered)) {
            warn!(url = %url, "Blocked URL pattern detected");
            return UrlValidationResult::Blocked(
                "URL appears to target an internal or restricted endpoint".to_string(),
            );
        }
    }

    UrlValidationResult::Valid(parsed.to_string())
}

fn is_internal_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local, fe80::/10 link-local
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
                || v6.to_ipv4_mapped().is_some_and(|v4| is_internal_ip(IpAddr::V4(v4)))
        }
    }
}

/// Maximum redirect hops followed by URL downloads.
pub const MAX_REDIRECTS: usize = 10;

/// Build the HTTP client used for URL downloads.
///
/// Every redirect target goes through [`validate_video_url`] with the same
/// `allow_private` setting as the original URL.
pub fn download_client(allow_private: bool) -> reqwest::Result<reqwest::Client> {
    let policy = reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        match validate_video_url(attempt.url().as_str(), allow_private).into_result() {
            Ok(_) => attempt.follow(),
            Err(reason) => {
                warn!(url = %attempt.url(), "Refusing redirect: {}", reason);
                attempt.error(format!("Redirect refused: {}", reason))
            }
        }
    });

    reqwest::Client::builder().redirect(policy).build()
}

/// Resolve a client-supplied video path, accepting it only when it points
/// inside one of `roots`.
///
/// Returns `None` when the path does not exist or escapes every root.
pub async fn resolve_managed_path(requested: &str, roots: &[&Path]) -> Option<PathBuf> {
    let requested = requested.trim();
    if requested.is_empty() {
        return None;
    }

    let canonical = tokio::fs::canonicalize(requested).await.ok()?;
    for root in roots {
        if let Ok(root) = tokio::fs::canonicalize(root).await {
            if canonical.starts_with(&root) {
                return Some(canonical);
            }
        }
    }
    None
}
