//! Favicon derivation for shortcut items.

use url::Url;

use crate::model::ShortcutItem;

const FAVICON_SERVICE: &str = "https://www.google.com/s2/favicons";

/// Qualify a user-entered url with `https://` unless it already names an
/// http(s) scheme.
pub fn normalize_url(raw: &str) -> String {
    if raw.starts_with("http") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

/// Icon service url for the host of `raw`. `None` when the url has no
/// parsable host.
pub fn favicon_url(raw: &str) -> Option<String> {
    let parsed = Url::parse(&normalize_url(raw)).ok()?;
    let host = parsed.host_str().filter(|h| !h.is_empty())?;
    Some(format!("{}?domain={}&sz=64", FAVICON_SERVICE, host))
}

impl ShortcutItem {
    /// Fill in a missing favicon from the item's url.
    pub fn with_favicon(mut self) -> Self {
        let missing = self.favicon.as_deref().map_or(true, str::is_empty);
        if missing {
            self.favicon = favicon_url(&self.url);
        }
        self
    }
}

/// Apply `with_favicon` across a collection.
pub fn fill_favicons(items: Vec<ShortcutItem>) -> Vec<ShortcutItem> {
    items.into_iter().map(ShortcutItem::with_favicon).collect()
}
