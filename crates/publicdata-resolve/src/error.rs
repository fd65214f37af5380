//! Error types for landing-page resolution.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Result alias for resolver operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Errors raised while scanning a landing page.
///
/// Malformed markup is never an error; pages that match nothing simply yield
/// no assets.
#[derive(Debug)]
pub enum ResolveError {
    /// The landing page URL could not be parsed.
    LandingUrl {
        /// Offending URL string.
        url: String,
        /// Underlying parse error.
        source: url::ParseError,
    },
    /// A scanning regex failed to compile.
    RegexCompile {
        /// Regex pattern.
        pattern: String,
        /// Underlying regex error.
        source: regex::Error,
    },
}

impl Display for ResolveError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::LandingUrl { .. } => formatter.write_str("invalid landing page url"),
            Self::RegexCompile { .. } => formatter.write_str("failed to compile regex"),
        }
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LandingUrl { source, .. } => Some(source),
            Self::RegexCompile { source, .. } => Some(source),
        }
    }
}
