use rustc_hash::FxHashSet;

/// Blocked-domain lookup with subdomain matching.
#[derive(Debug, Default)]
pub struct DomainMatcher {
    domains: FxHashSet<Box<str>>,
}

impl DomainMatcher {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Returns the blocked entry covering `host`, if any.
    ///
    /// `host` matches entry `b` when it equals `b` or ends with `"." + b`.
    /// The most specific entry wins when several cover the same host.
    pub fn matching_entry(&self, host: &str) -> Option<&str> {
        // Exact host first, then the suffix after every '.'
        std::iter::once(host)
            .chain(host.match_indices('.').map(|(idx, _)| &host[idx + 1..]))
            .find_map(|candidate| self.domains.get(candidate).map(|d| &**d))
    }

    pub fn is_blocked(&self, host: &str) -> bool {
        self.matching_entry(host).is_some()
    }
}
