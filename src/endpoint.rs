//! Relative backend locations and their resolution against the base URL.
//!
//! Path segments are percent-encoded and query values form-encoded when an
//! endpoint is resolved, so callers pass raw user input.

#[cfg(test)]
#[path = "endpoint_test.rs"]
mod endpoint_test;

use std::fmt;

use reqwest::Url;

/// A backend path plus query pairs, independent of the server origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    /// Build from a literal `/`-separated path such as `/api/profiles/`.
    ///
    /// A trailing `/` is kept as an empty final segment.
    #[must_use]
    pub fn new(path: &str) -> Self {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let segments = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').map(str::to_owned).collect()
        };
        Self { segments, query: Vec::new() }
    }

    /// Append one raw path segment; it is encoded on resolve.
    #[must_use]
    pub fn segment(mut self, raw: impl Into<String>) -> Self {
        self.segments.push(raw.into());
        self
    }

    /// Append one query pair; the value is encoded on resolve.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_owned(), value.into()));
        self
    }

    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Value of the first query pair named `key`.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Join onto `base`, keeping any path prefix `base` already carries.
    #[must_use]
    pub fn resolve(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(&self.segments);
        }
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        url
    }
}

impl From<&str> for Endpoint {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))?;
        for (i, (k, v)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{k}={v}")?;
        }
        Ok(())
    }
}
