//! Excluded-route matching.

/// Paths on which ads never run, matched exactly or by prefix.
#[derive(Debug, Clone, Default)]
pub struct RouteExclusions {
    exact: Vec<String>,
    prefixes: Vec<String>,
}

impl RouteExclusions {
    /// Creates an exclusion list from exact paths and path prefixes.
    #[must_use]
    pub fn new(
        exact: impl IntoIterator<Item = impl Into<String>>,
        prefixes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            exact: exact.into_iter().map(Into::into).collect(),
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// The usual policy pages of a content site.
    #[must_use]
    pub fn policy_pages() -> Self {
        Self::new(
            ["/privacy-policy", "/cookie-policy", "/terms-of-service"],
            [] as [&str; 0],
        )
    }

    /// Whether `path` is excluded.
    ///
    /// A prefix entry matches the path itself and anything below it,
    /// so `"/admin"` excludes `/admin` and `/admin/users` but not
    /// `/administrator`.
    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        if self.exact.iter().any(|p| p == path) {
            return true;
        }
        self.prefixes.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Whether the list excludes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.prefixes.is_empty()
    }
}
