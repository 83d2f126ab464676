use url::Url;

use super::types::{RedirectTarget, RequestContext};

/// A redirect is safe when it stays on the requesting host: relative paths,
/// or absolute http(s) URLs whose `host[:port]` equals `host`.
pub fn is_safe_url(url: &str, host: &str) -> bool {
    let url = url.trim();
    if url.is_empty() || url.contains('\\') || url.chars().any(char::is_control) {
        return false;
    }
    if url.starts_with('/') {
        return !url.starts_with("//");
    }
    match Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.username().is_empty()
                && parsed.password().is_none()
                && authority(&parsed).is_some_and(|authority| authority.eq_ignore_ascii_case(host))
        }
        Err(_) => false,
    }
}

fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// The validated `next` parameter, or `fallback` when it is missing or unsafe.
pub fn resolve_next(request: &RequestContext, fallback: RedirectTarget) -> RedirectTarget {
    match request.next.as_deref() {
        Some(next) if is_safe_url(next, &request.host) => RedirectTarget::to(next.trim()),
        Some(next) => {
            tracing::event!(
                target: "backend",
                tracing::Level::WARN,
                "Rejected unsafe redirect target: {}",
                next
            );
            fallback
        }
        None => fallback,
    }
}
