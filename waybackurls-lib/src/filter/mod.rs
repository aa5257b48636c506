//! Classification of archived URLs as likely sensitive.
//!
//! A [`SensitiveFilter`] is a compiled set of [`PatternRule`]s. The built-in
//! table is [`DEFAULT_RULES`]; a custom table can be loaded from a TOML file:
//!
//! ```toml
//! [[rule]]
//! category = "credentials"
//! pattern = 'id_rsa(?:\.pub)?'
//! ```

mod rules;

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use regex::{RegexSet, RegexSetBuilder};
use serde::Deserialize;

use crate::{ErrorKind, Result};

pub use rules::{Category, DEFAULT_RULES};

/// A single pattern fragment and what it is looking for
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatternRule {
    /// What kind of resource the pattern detects
    pub category: Category,
    /// Regex fragment, matched right after the start of the URL or a `/`
    pub pattern: Cow<'static, str>,
}

impl PatternRule {
    /// Create a rule from its parts
    #[must_use]
    pub fn new(category: Category, pattern: impl Into<Cow<'static, str>>) -> Self {
        Self {
            category,
            pattern: pattern.into(),
        }
    }

    /// The fragment as it is compiled into the set
    fn anchored(&self) -> String {
        format!("(?:^|/)(?:{})", self.pattern)
    }
}

/// Layout of a pattern table file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PatternFile {
    #[serde(rename = "rule", default)]
    rules: Vec<PatternRule>,
}

/// Decides whether an original URL looks like a sensitive resource.
///
/// Matching is case-insensitive and every rule is evaluated in a single pass
/// over the URL.
#[derive(Debug, Clone)]
pub struct SensitiveFilter {
    regex: RegexSet,
    categories: Vec<Category>,
}

impl SensitiveFilter {
    /// Compile `rules` into a filter
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::EmptyPatternTable`] for an empty table and
    /// [`ErrorKind::InvalidPatternTable`] if a pattern does not compile.
    pub fn new(rules: &[PatternRule]) -> Result<Self> {
        if rules.is_empty() {
            return Err(ErrorKind::EmptyPatternTable);
        }
        let regex = RegexSetBuilder::new(rules.iter().map(PatternRule::anchored))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            regex,
            categories: rules.iter().map(|rule| rule.category).collect(),
        })
    }

    /// The built-in rule table as [`PatternRule`]s
    #[must_use]
    pub fn default_rules() -> Vec<PatternRule> {
        DEFAULT_RULES
            .iter()
            .map(|(category, pattern)| PatternRule::new(*category, *pattern))
            .collect()
    }

    /// Compile the built-in rule table
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidPatternTable`] if the table does not
    /// compile with the linked regex engine.
    pub fn builtin() -> Result<Self> {
        Self::new(&Self::default_rules())
    }

    /// Load a rule table from a TOML file, replacing the built-in table
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed, or if the rules it holds
    /// do not compile.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ErrorKind::ReadPatternFile(path.to_path_buf(), e))?;
        let file: PatternFile = toml::from_str(&contents)
            .map_err(|e| ErrorKind::ParsePatternFile(path.to_path_buf(), e))?;
        Self::new(&file.rules)
    }

    #[inline]
    #[must_use]
    /// Returns `true` if `original` matches any rule
    pub fn is_match(&self, original: &str) -> bool {
        self.regex.is_match(original)
    }

    /// Categories of all rules matching `original`, in table order and
    /// without duplicates
    #[must_use]
    pub fn matching_categories(&self, original: &str) -> Vec<Category> {
        let mut categories: Vec<Category> = Vec::new();
        for index in self.regex.matches(original).iter() {
            let category = self.categories[index];
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        categories
    }

    /// Number of compiled rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.regex.len()
    }

    /// Whether there are no rules. Never `true` for a constructed filter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regex.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::NamedTempFile;

    use super::{Category, PatternRule, SensitiveFilter};
    use crate::ErrorKind;

    fn builtin() -> SensitiveFilter {
        SensitiveFilter::builtin().unwrap()
    }

    #[rstest]
    #[case("http://a.com/.env")]
    #[case("http://a.com/backup.zip")]
    #[case("http://a.com/.git/config")]
    #[case("http://a.com/.svn/entries")]
    #[case("http://a.com/.env.production")]
    #[case("http://a.com/wp-config.php")]
    #[case("http://a.com/home/.ssh/id_rsa.pub")]
    #[case("http://a.com/certs/server.pem")]
    #[case("http://a.com/dump-2020.sql")]
    #[case("http://a.com/docker-compose.yml")]
    #[case("http://a.com/.aws/credentials")]
    #[case("http://a.com/logs/error.log")]
    #[case("http://a.com/.htpasswd")]
    #[case("http://a.com/auth_token.json")]
    #[case("http://a.com/SITE.TAR.GZ")]
    #[case("http://a.com/Backup.ZIP")]
    fn test_sensitive(#[case] url: &str) {
        assert!(builtin().is_match(url), "{url} should match");
    }

    #[rstest]
    #[case("http://a.com/index.html")]
    #[case("http://a.com/")]
    #[case("http://a.com/about/team")]
    #[case("http://a.com/static/app.js")]
    #[case("http://a.com/environment")]
    #[case("http://a.com/my.gitignore.txt")]
    fn test_not_sensitive(#[case] url: &str) {
        assert!(!builtin().is_match(url), "{url} should not match");
    }

    #[test]
    fn test_fragments_are_anchored() {
        let filter = builtin();
        // `.env` in the middle of a segment is not an env file
        assert!(!filter.is_match("http://a.com/foo.env.html"));
        assert!(filter.is_match("http://a.com/foo/.env"));
    }

    #[test]
    fn test_matching_categories() {
        let filter = builtin();
        assert_eq!(
            filter.matching_categories("http://a.com/.git/HEAD"),
            vec![Category::VersionControl, Category::ExactMarkers]
        );
        assert_eq!(
            filter.matching_categories("http://a.com/backup.zip"),
            vec![
                Category::Backups,
                Category::SourceArchives,
                Category::GenericArchives,
                Category::ExactMarkers
            ]
        );
        assert!(filter.matching_categories("http://a.com/index.html").is_empty());
    }

    #[test]
    fn test_default_table_compiles() {
        let rules = SensitiveFilter::default_rules();
        let filter = SensitiveFilter::new(&rules).unwrap();
        assert_eq!(filter.len(), rules.len());
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_invalid_rules() {
        assert!(matches!(
            SensitiveFilter::new(&[]),
            Err(ErrorKind::EmptyPatternTable)
        ));
        assert!(matches!(
            SensitiveFilter::new(&[PatternRule::new(Category::Logs, "(unclosed")]),
            Err(ErrorKind::InvalidPatternTable(_))
        ));
    }

    #[test]
    fn test_custom_table_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[rule]]
category = "credentials"
pattern = 'secret\.txt$'

[[rule]]
category = "logs"
pattern = 'trace\.log'
"#
        )
        .unwrap();

        let filter = SensitiveFilter::from_file(file.path()).unwrap();
        assert_eq!(filter.len(), 2);
        assert!(filter.is_match("http://a.com/files/SECRET.txt"));
        assert!(filter.is_match("http://a.com/trace.log"));
        // The built-in table is replaced, not extended
        assert!(!filter.is_match("http://a.com/.env"));
        assert_eq!(
            filter.matching_categories("http://a.com/trace.log"),
            vec![Category::Logs]
        );
    }

    #[test]
    fn test_bad_pattern_files() {
        let missing = SensitiveFilter::from_file("does/not/exist.toml".as_ref());
        assert!(matches!(missing, Err(ErrorKind::ReadPatternFile(..))));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[[rule]]\ncategory = \"nonsense\"\npattern = 'x'").unwrap();
        let unknown_category = SensitiveFilter::from_file(file.path());
        assert!(matches!(unknown_category, Err(ErrorKind::ParsePatternFile(..))));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# nothing here").unwrap();
        let empty = SensitiveFilter::from_file(file.path());
        assert!(matches!(empty, Err(ErrorKind::EmptyPatternTable)));
    }
}
