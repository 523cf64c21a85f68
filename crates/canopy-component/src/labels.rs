//! Localized label catalog.
//!
//! Three layers merge at the labels phase, lowest priority first:
//! built-in defaults, manifest labels, config-supplied labels.

use std::collections::BTreeMap;

/// Built-in catalog every component starts from.
fn builtin() -> BTreeMap<String, String> {
    let pairs = [
        ("loading", "Loading..."),
        ("retrying", "Retrying..."),
        ("error_busy", "Loading. Please wait..."),
        ("error_timeout", "Loading. Please wait..."),
        ("error_waiting", "Loading. Please wait..."),
        (
            "error_view_limit",
            "View creation rate limit has been exceeded. Retrying in {seconds} seconds...",
        ),
        (
            "error_view_update_capacity_exceeded",
            "This stream is momentarily unavailable due to unusually high activity. \
             Retrying in {seconds} seconds...",
        ),
        (
            "error_result_too_large",
            "(result_too_large) The search result is too large.",
        ),
        (
            "error_wrong_query",
            "(wrong_query) Incorrect or missing query parameter.",
        ),
        (
            "error_incorrect_appkey",
            "(incorrect_appkey) Incorrect or missing appkey.",
        ),
        ("error_internal_error", "(internal_error) Unknown server error."),
        (
            "error_quota_exceeded",
            "(quota_exceeded) Required more quota than is available.",
        ),
        (
            "error_incorrect_user_id",
            "(incorrect_user_id) Incorrect user specified in User ID predicate.",
        ),
        ("error_unknown", "(unknown) Unknown error."),
    ];
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Merged label catalog of one component instance.
#[derive(Debug, Clone, Default)]
pub struct Labels {
    map: BTreeMap<String, String>,
}

impl Labels {
    /// Merges builtin < manifest < config.
    #[must_use]
    pub fn resolve(
        manifest: &BTreeMap<String, String>,
        config: &BTreeMap<String, String>,
    ) -> Self {
        let mut map = builtin();
        for (k, v) in manifest {
            map.insert(k.clone(), v.clone());
        }
        for (k, v) in config {
            map.insert(k.clone(), v.clone());
        }
        Self { map }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// The label, or the key itself when it is not in the catalog.
    #[must_use]
    pub fn get_or_key(&self, key: &str) -> String {
        self.map
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// The label with every `{placeholder}` replaced from `values`.
    /// Missing labels fall back to the key, as `get_or_key`.
    #[must_use]
    pub fn interpolate(&self, key: &str, values: &[(&str, String)]) -> String {
        let mut label = self.get_or_key(key);
        for (name, value) in values {
            label = label.replace(&format!("{{{name}}}"), value);
        }
        label
    }
}
