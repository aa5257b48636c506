use std::fmt::{self, Display};

/// Scheme prefixes stripped from input lines, compared case-insensitively
const SCHEMES: [&str; 2] = ["http://", "https://"];

/// A normalized domain, i.e. the bare host part of an input line.
///
/// Input lines may carry a scheme and a path (`https://example.com/foo`);
/// both are removed. Use [`Domain::parse`] to construct one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain(String);

impl Domain {
    /// Normalize a raw input line.
    ///
    /// Returns `None` if nothing is left after trimming whitespace and removing
    /// the scheme and path. Such lines are skipped, they are not an error.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut host = raw.trim();

        for scheme in SCHEMES {
            if host.len() >= scheme.len()
                && host.is_char_boundary(scheme.len())
                && host[..scheme.len()].eq_ignore_ascii_case(scheme)
            {
                host = &host[scheme.len()..];
                break;
            }
        }

        let host = host.split('/').next().unwrap_or_default().trim();
        if host.is_empty() {
            return None;
        }
        Some(Self(host.to_string()))
    }

    /// The normalized host
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
