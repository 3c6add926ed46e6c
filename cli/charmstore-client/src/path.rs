//! Versioned charmstore URL construction.

/// Scheme prefix of charmstore identifiers.
pub const SCHEME: &str = "cs:";

/// Builds `<base_url><api_version>/<endpoint><extension>?<query>` URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathBuilder {
    base_url: String,
    api_version: String,
}

impl PathBuilder {
    pub fn new(base_url: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_version: api_version.into(),
        }
    }

    /// Compose a URL for `endpoint`.
    ///
    /// `extension` is appended to the endpoint as is, so it must carry its
    /// own leading `/`. A `?` is only emitted when a query is given.
    pub fn build(&self, endpoint: &str, query: Option<&str>, extension: Option<&str>) -> String {
        let mut path = format!("{}{}/{endpoint}", self.base_url, self.api_version);
        if let Some(extension) = extension {
            path.push_str(extension);
        }
        if let Some(query) = query.filter(|query| !query.is_empty()) {
            path.push('?');
            path.push_str(query);
        }
        path
    }
}

/// Remove the first occurrence of the `cs:` scheme from an identifier.
pub fn strip_scheme(id: &str) -> String {
    id.replacen(SCHEME, "", 1)
}
