mod domain;
mod error;
mod record;

pub use domain::Domain;
pub use error::ErrorKind;
pub use record::{ArchiveRecord, PLAYBACK_PREFIX};

/// The waybackurls `Result` type
pub type Result<T> = std::result::Result<T, crate::ErrorKind>;
