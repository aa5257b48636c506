use std::fmt::{self, Display};

/// Prefix of every playback URL
pub const PLAYBACK_PREFIX: &str = "https://web.archive.org/web";

/// A single capture listed by the CDX index: one `timestamp original` line.
///
/// Records borrow from the response body they were parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveRecord<'a> {
    /// Capture timestamp as sent by the index, e.g. `20200101000000`
    pub timestamp: &'a str,
    /// The URL that was captured
    pub original: &'a str,
}

impl<'a> ArchiveRecord<'a> {
    /// Create a record from its two fields
    #[must_use]
    pub const fn new(timestamp: &'a str, original: &'a str) -> Self {
        Self {
            timestamp,
            original,
        }
    }

    /// The URL under which this capture can be replayed.
    ///
    /// This is a plain string composition; the timestamp is not validated.
    #[must_use]
    pub fn playback_url(&self) -> String {
        self.to_string()
    }
}

impl Display for ArchiveRecord<'_> {
    /// Formats the record as its playback URL
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PLAYBACK_PREFIX}/{}/{}", self.timestamp, self.original)
    }
}
