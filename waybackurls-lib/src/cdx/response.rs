//! Parser for plain-text CDX responses (`output=text`).
//!
//! Every line of a response is expected to hold exactly two
//! whitespace-separated fields: the capture timestamp and the original URL.
//! Lines of any other shape are skipped and counted; a single bad line
//! never invalidates the rest of the response.

use std::str::Split;

use log::debug;

use crate::ArchiveRecord;

/// Counters collected while reading one CDX response.
///
/// These are purely diagnostic.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResponseStats {
    /// Lines which yielded a valid record
    pub records: usize,
    /// Non-blank lines which did not have exactly two fields
    pub discarded: usize,
    /// Records that were classified as sensitive
    pub sensitive: usize,
}

/// Lazily parse `body` into [`ArchiveRecord`]s, in body order.
#[must_use]
pub fn parse(body: &str) -> Records<'_> {
    Records::new(body)
}

/// Iterator over the records of a CDX response body.
///
/// Records are yielded in the order they appear in the body. Nothing is
/// reordered or deduplicated; the index already collapsed duplicates.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    lines: Split<'a, char>,
    stats: ResponseStats,
}

impl<'a> Records<'a> {
    /// Start parsing `body`
    #[must_use]
    pub fn new(body: &'a str) -> Self {
        Self {
            lines: body.split('\n'),
            stats: ResponseStats::default(),
        }
    }

    /// Counters for the lines consumed so far
    #[must_use]
    pub const fn stats(&self) -> ResponseStats {
        self.stats
    }

    /// Count a record that matched the sensitive pattern table
    pub const fn record_sensitive(&mut self) {
        self.stats.sensitive += 1;
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = ArchiveRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split_whitespace();
            if let (Some(timestamp), Some(original), None) =
                (fields.next(), fields.next(), fields.next())
            {
                self.stats.records += 1;
                return Some(ArchiveRecord::new(timestamp, original));
            }

            self.stats.discarded += 1;
            debug!("Skipping malformed line: {line}");
        }
        None
    }
}
