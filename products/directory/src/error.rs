use platform_api::ErrorCode;
use thiserror::Error;

pub type DirectoryResult<T> = Result<T, DirectoryError>;
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Everything the service surface can fail with.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DirectoryError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Programmer error: the service was used after `close()`.
    #[error("directory service used outside of an open session")]
    ContextMisuse,
}

impl DirectoryError {
    pub fn is_remote(&self) -> bool {
        matches!(self, DirectoryError::Remote(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, DirectoryError::Parse(_))
    }
}

/// A rejected remote call. Passed through to callers unchanged and never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("server responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{operation} rejected ({code}): {message}")]
    Rejected {
        operation: &'static str,
        code: ErrorCode,
        message: String,
    },
    #[error("could not decode {operation} response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

impl RemoteError {
    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            RemoteError::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else if err.is_decode() {
            RemoteError::Decode {
                operation: "response",
                message: err.to_string(),
            }
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}

const PARSE_PREFIX: &str = "Failed to parse CSV file. Please check the format.";

/// Structural CSV failure. Row-level problems are reported in the import summary instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{} The input is empty.", PARSE_PREFIX)]
    Empty,
    #[error("{} Header column {column} has no name.", PARSE_PREFIX)]
    BlankHeader { column: usize },
    #[error("{} Header `{name}` appears more than once.", PARSE_PREFIX)]
    DuplicateHeader { name: String },
}
