use std::collections::HashSet;

const BEARER_PREFIX: &str = "Bearer ";

/// Fixed set of API keys accepted by the gateway.
///
/// Built once at startup and only read afterwards, so it can be shared across
/// request tasks without locking.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyAllowList {
    keys: HashSet<String>,
}

impl ApiKeyAllowList {
    /// Creates an allow-list from configured keys.
    #[must_use]
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the matched key for an `Authorization` header value.
    ///
    /// Accepts both `Bearer <key>` and a bare `<key>`, ignoring surrounding whitespace.
    #[must_use]
    pub fn authenticate(&self, authorization: &str) -> Option<&str> {
        let candidate = authorization
            .strip_prefix(BEARER_PREFIX)
            .unwrap_or(authorization)
            .trim();

        self.keys.get(candidate).map(String::as_str)
    }

    /// Returns the number of configured keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns whether no keys are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
