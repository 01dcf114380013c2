use std::fmt;
use std::time::Duration;

/// Errors surfaced by the catalog browser core.
///
/// Fetch failures never escape as panics; they are turned into a
/// `LoadState::Error` by the browser and the last good page stays visible.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserError {
    /// The remote catalog could not be reached or returned something unusable
    Unavailable(String),
    /// A page load did not complete within the configured window
    Timeout { index: usize, after: Duration },
    /// A 1-based page number outside `[1, max]`
    InvalidPage { requested: usize, max: usize },
}

impl BrowserError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Short label for the status line
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::Timeout { .. } => "timeout",
            Self::InvalidPage { .. } => "invalid page",
        }
    }
}

impl fmt::Display for BrowserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "catalog unavailable: {}", message),
            Self::Timeout { index, after } => write!(
                f,
                "loading page {} timed out after {} ms",
                index + 1,
                after.as_millis()
            ),
            Self::InvalidPage { requested, max } => {
                write!(f, "page {} is outside 1..={}", requested, max)
            }
        }
    }
}

impl std::error::Error for BrowserError {}

impl From<reqwest::Error> for BrowserError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for BrowserError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unavailable(format!("malformed response: {}", err))
    }
}

pub type BrowserResult<T> = Result<T, BrowserError>;
