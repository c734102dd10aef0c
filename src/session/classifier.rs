//! Pure URL classification for the embedded checkout session.
//!
//! All three observation channels call [`classify`] identically; the
//! at-most-once guard lives in the session controller, not here, so this
//! stays independently testable.

use url::Url;

use super::{Channel, Outcome};

/// Path segment marking a provider redirect wrapper. The true destination is
/// carried in the `redirectURL` query parameter instead of being navigated to
/// directly.
pub const REDIRECT_WRAPPER_SEGMENT: &str = "order-return-redirect";
const REDIRECT_PARAM: &str = "redirectURL";
const ORDER_ID_PARAM: &str = "orderId";

/// Terminal return-path markers. Matching is exact path-segment or
/// path-suffix matching, never raw substring matching: a merchant slug
/// containing "cancel" or a segment "error-free" must stay Pending.
const SUCCESS_SUFFIXES: &[&str] = &["payment/success", "checkout/success", "checkout-success"];
const FAILURE_SUFFIXES: &[&str] = &[
    "payment/fail",
    "payment/failure",
    "checkout/fail",
    "payment-failed",
];
const FAILURE_SEGMENTS: &[&str] = &["cancel", "cancelled", "error"];

/// Wrappers pointing at further wrappers are unwrapped up to this depth.
const MAX_WRAPPER_DEPTH: usize = 3;

/// Maps an observed URL to an outcome. Side-effect free.
pub fn classify(raw_url: &str, _channel: Channel) -> Outcome {
    let mut current = raw_url.to_owned();

    for _ in 0..=MAX_WRAPPER_DEPTH {
        let Ok(url) = Url::parse(&current) else {
            return Outcome::Pending;
        };
        match wrapped_destination(&url) {
            Some(inner) => current = inner,
            None => return classify_resolved(&url),
        }
    }

    Outcome::Pending
}

/// True when the URL is a provider redirect wrapper. The session suppresses
/// these navigations so the user never sees the intermediate blank page.
pub fn is_wrapper(raw_url: &str) -> bool {
    Url::parse(raw_url)
        .map(|url| has_wrapper_segment(&url))
        .unwrap_or(false)
}

fn has_wrapper_segment(url: &Url) -> bool {
    url.path_segments()
        .map(|mut segments| segments.any(|s| s == REDIRECT_WRAPPER_SEGMENT))
        .unwrap_or(false)
}

fn wrapped_destination(url: &Url) -> Option<String> {
    if !has_wrapper_segment(url) {
        return None;
    }
    query_param(url, REDIRECT_PARAM)
}

fn classify_resolved(url: &Url) -> Outcome {
    let path = url.path().trim_matches('/').to_ascii_lowercase();

    if SUCCESS_SUFFIXES
        .iter()
        .any(|suffix| matches_suffix(&path, suffix))
    {
        return Outcome::Success {
            order_id: query_param(url, ORDER_ID_PARAM),
        };
    }

    if let Some(marker) = FAILURE_SUFFIXES
        .iter()
        .find(|suffix| matches_suffix(&path, suffix))
    {
        return Outcome::Failure {
            reason: format!("provider returned {}", marker),
        };
    }

    if let Some(segment) = url.path_segments().and_then(|segments| {
        segments
            .map(|s| s.to_ascii_lowercase())
            .find(|s| FAILURE_SEGMENTS.contains(&s.as_str()))
    }) {
        return Outcome::Failure {
            reason: format!("provider returned {}", segment),
        };
    }

    Outcome::Pending
}

fn matches_suffix(path: &str, suffix: &str) -> bool {
    path == suffix || path.ends_with(&format!("/{}", suffix))
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key.as_ref() == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
