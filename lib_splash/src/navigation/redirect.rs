//! # SPA Redirect Rewrite
//!
//! Static hosts answer deep links with a 404 page that bounces to
//! `/?redirect=<encoded path>`. On load the shell restores the original path
//! in the address bar with a history replacement, without a network
//! navigation, so the client-side router can pick it up.
//!
//! Only same-origin absolute paths are accepted: the target must start with
//! `/`, must not start with `//`, and must resolve to the current origin.
//! Anything else is ignored.

use url::Url;

/// Query parameter carrying the original path.
pub const REDIRECT_PARAM: &str = "redirect";

/// `history.replaceState`.
pub trait History {
    /// Replaces the current entry's URL with `path` (path, query, fragment).
    fn replace_state(&self, path: &str);
}

/// Extracts the validated redirect target from `current`, if any.
///
/// The query parser decodes one level; the value is percent-decoded once more
/// because the 404 page encodes the whole path as a single component.
pub fn redirect_target(current: &Url) -> Option<String> {
    let raw = current
        .query_pairs()
        .find(|(key, _)| key == REDIRECT_PARAM)
        .map(|(_, value)| value.into_owned())?;

    let decoded = urlencoding::decode(&raw).ok()?.into_owned();
    if !decoded.starts_with('/') || decoded.starts_with("//") {
        return None;
    }

    let resolved = current.join(&decoded).ok()?;
    if resolved.origin() != current.origin() {
        return None;
    }

    let mut target = resolved.path().to_string();
    if let Some(query) = resolved.query() {
        target.push('?');
        target.push_str(query);
    }
    if let Some(fragment) = resolved.fragment() {
        target.push('#');
        target.push_str(fragment);
    }
    Some(target)
}

/// Applies the rewrite to `current_url` through `history`.
///
/// Returns the path written, or `None` when there was nothing (valid) to do.
/// Parse failures are swallowed.
pub fn rewrite_spa_redirect(current_url: &str, history: &dyn History) -> Option<String> {
    let current = match Url::parse(current_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(url = current_url, error = %e, "redirect rewrite skipped");
            return None;
        }
    };

    let target = redirect_target(&current)?;
    history.replace_state(&target);
    tracing::debug!(target = %target, "address rewritten from redirect parameter");
    Some(target)
}
