use std::fmt;

/// Error types for DataFlash decoding
#[derive(Debug)]
pub enum DFError {
    /// I/O errors
    Io(std::io::Error),
    /// Stream never showed a schema-definition record within the lookback horizon
    InvalidLog(String),
    /// Record type name or numeric code not present in the registry
    UnknownFormat(String),
    /// Structural decode failure for a single line or frame
    MalformedRecord(String),
    /// A format references a type character with no converter
    UnknownTypeCode(char),
    /// Value could not be coerced to the requested view
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// Field name not present on the record's format
    MissingField(String),
    /// End of data reached mid-read
    UnexpectedEof,
}

impl DFError {
    /// Per-record failures are skipped by the parsers; everything else ends the pass.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DFError::UnknownFormat(_)
                | DFError::MalformedRecord(_)
                | DFError::UnknownTypeCode(_)
                | DFError::TypeMismatch { .. }
                | DFError::MissingField(_)
        )
    }
}

impl fmt::Display for DFError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DFError::Io(err) => write!(f, "I/O error: {}", err),
            DFError::InvalidLog(msg) => {
                write!(f, "This doesn't look like a recognized DataFlash log: {}", msg)
            }
            DFError::UnknownFormat(name) => write!(f, "Unknown format: {}", name),
            DFError::MalformedRecord(msg) => write!(f, "Malformed record: {}", msg),
            DFError::UnknownTypeCode(code) => write!(f, "Unknown type code: '{}'", code),
            DFError::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
            DFError::MissingField(name) => write!(f, "Missing field: {}", name),
            DFError::UnexpectedEof => write!(f, "Unexpected end of data"),
        }
    }
}

impl std::error::Error for DFError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DFError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DFError {
    fn from(err: std::io::Error) -> Self {
        DFError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, DFError>;
