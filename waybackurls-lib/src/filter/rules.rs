//! The built-in table of sensitive-file patterns.
//!
//! Each fragment is later anchored at the start of the URL or right after
//! a `/` and compiled case-insensitively.

use serde::Deserialize;
use strum::{Display, EnumIter};

/// What kind of resource a rule is looking for
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Category {
    /// `.git/`, `.svn/` and friends
    VersionControl,
    /// `.env` files and application configuration
    EnvironmentConfig,
    /// SSH keys, API keys, service account files
    Credentials,
    /// Certificates and key stores
    Certificates,
    /// Backups and dumps
    Backups,
    /// Database files
    DatabaseFiles,
    /// Docker and Kubernetes configuration
    ContainerConfig,
    /// Cloud provider credentials
    CloudCredentials,
    /// Log files which tend to leak secrets
    Logs,
    /// Archives of source trees
    SourceArchives,
    /// Well-known sensitive files like `.htpasswd`
    CommonSensitiveFiles,
    /// Token and session files
    TokenFiles,
    /// Any archive, dump or key file by extension
    GenericArchives,
    /// Short exact markers like `.git/` or `wp-config.php`
    ExactMarkers,
}

/// The default rule table as `(category, fragment)` pairs
pub const DEFAULT_RULES: &[(Category, &str)] = &[
    (Category::VersionControl, r"\.git(?:/|$)"),
    (Category::VersionControl, r"\.svn(?:/|$)"),
    (Category::VersionControl, r"\.hg(?:/|$)"),
    (Category::VersionControl, r"\.bzr(?:/|$)"),
    (Category::EnvironmentConfig, r"\.env(?:\.|$)"),
    (
        Category::EnvironmentConfig,
        r"\.env\.(?:local|dev|prod|production|staging|test)",
    ),
    (
        Category::EnvironmentConfig,
        r"config\.(?:php|json|yml|yaml|xml|ini|properties|conf|cfg)",
    ),
    (
        Category::EnvironmentConfig,
        r"wp-config\.php|settings\.php|configuration\.php",
    ),
    (
        Category::EnvironmentConfig,
        r"database\.yml|secrets\.(?:yml|yaml|json)",
    ),
    (
        Category::Credentials,
        r"(?:id_rsa|id_dsa|id_ecdsa|id_ed25519)(?:\.pub)?",
    ),
    (Category::Credentials, r"\.?(?:aws|gcp|azure)_credentials"),
    (Category::Credentials, r"\.?(?:ssh|api|private)[\w\-]*\.key"),
    (Category::Credentials, r"\.?keystore\.jks|client-secret\.json"),
    (Category::Credentials, r"service-account.*\.json"),
    (Category::Certificates, r"\.(?:pem|crt|cer|p12|pfx|key)$"),
    (
        Category::Backups,
        r"(?:backup|dump|db|database|export|archive|copy|old|bak|save)[\w\-\.]*\.(?:zip|tar|tar\.gz|tgz|tar\.bz2|gz|rar|7z|bz2|sql|sqlite|db|dump|bak|old|json|xml|csv|txt|log)",
    ),
    (Category::DatabaseFiles, r"\.(?:sql|sqlite|db|mdb|accdb|dump)$"),
    (
        Category::ContainerConfig,
        r"(?:docker-compose|dockerfile|\.dockerignore)(?:\.yml|\.yaml)?",
    ),
    (
        Category::ContainerConfig,
        r"(?:kubernetes|k8s)-config\.yml|secrets\.yaml",
    ),
    (Category::CloudCredentials, r"\.aws/credentials|\.boto|\.s3cfg"),
    (Category::CloudCredentials, r"gcloud/.*\.json|\.azure/credentials"),
    (
        Category::Logs,
        r"(?:error|access|debug|app|application)\.log",
    ),
    (
        Category::SourceArchives,
        r"(?:source|src|project|backup).*\.(?:zip|tar\.gz|tgz|rar)",
    ),
    (
        Category::CommonSensitiveFiles,
        r"\.htpasswd|\.htaccess|web\.config",
    ),
    (Category::CommonSensitiveFiles, r"shadow|passwd|master\.passwd"),
    (
        Category::CommonSensitiveFiles,
        r"\.npmrc|\.pypirc|\.netrc|\.git-credentials",
    ),
    (Category::TokenFiles, r"\.token|token\.txt|session\.json"),
    (Category::TokenFiles, r"auth.*\.(?:json|txt|key|token)"),
    (
        Category::GenericArchives,
        r"[^/]*\.(?:zip|tar|tar\.gz|tgz|tar\.bz2|gz|rar|7z|bz2|sql|sqlite|db|dump|bak|old|pem|key|p12|pfx|crt|cer)$",
    ),
    (Category::ExactMarkers, r"\.git/|\.env$|wp-config\.php$"),
    (
        Category::ExactMarkers,
        r"(?:backup|dump|db|credentials|secret|passwd)[\w\-\._]*\.(?:zip|tar|tar\.gz|tgz|sql|bak|gz|json|csv|txt|pem|key|p12|pfx|log|yml|yaml|env)",
    ),
];
