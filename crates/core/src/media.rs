//! Image URL resolution for uploaded media.

/// Shown wherever a category or product has no image.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://img.freepik.com/premium-vector/default-image-icon-vector-missing-picture-page-website-design-mobile-app-no-photo-available_87543-11093.jpg?w=900";

/// Turns stored image paths (relative to the media root) into URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUrls {
    base_url: String,
    placeholder: String,
}

impl MediaUrls {
    /// `base_url` is the public prefix uploads are served under, e.g. `/media/`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, placeholder: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            placeholder: placeholder.into(),
        }
    }

    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// URL for a stored image path, or the placeholder when there is none.
    ///
    /// Blank paths count as missing. Paths that are already absolute URLs are
    /// returned unchanged.
    #[must_use]
    pub fn resolve(&self, path: Option<&str>) -> String {
        match path.map(str::trim) {
            None | Some("") => self.placeholder.clone(),
            Some(p) if p.starts_with("http://") || p.starts_with("https://") => p.to_owned(),
            Some(p) => format!("{}{}", self.base_url, p.trim_start_matches('/')),
        }
    }
}

impl Default for MediaUrls {
    fn default() -> Self {
        Self::new("/media/", PLACEHOLDER_IMAGE_URL)
    }
}
