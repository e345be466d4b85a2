//! Resolution of image references returned by the API into absolute URLs.

use url::Url;

use crate::config::ApiSettings;

#[derive(Debug, Clone)]
pub struct MediaResolver {
    api_base: Url,
    media_base: Url,
}

impl MediaResolver {
    pub fn new(api_base: Url, media_base: Url) -> Self {
        Self {
            api_base,
            media_base,
        }
    }

    pub fn from_settings(settings: &ApiSettings) -> Self {
        Self::new(settings.base_url.clone(), settings.media_url.clone())
    }

    /// Absolute URL for an image reference.
    ///
    /// Absolute `http(s)` URLs pass through. Paths that already start with
    /// `media/` are served by the API host; every other relative path is
    /// joined onto the media base. Blank references resolve to `None`.
    pub fn resolve(&self, reference: &str) -> Option<Url> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        if let Ok(url) = Url::parse(reference) {
            if matches!(url.scheme(), "http" | "https") {
                return Some(url);
            }
        }

        let relative = reference.trim_start_matches('/');
        let base = if relative.starts_with("media/") {
            &self.api_base
        } else {
            &self.media_base
        };
        base.join(relative).ok()
    }
}
