use std::io::Error as IoError;
use std::path::PathBuf;

/// Broad category of a [`SealError`], used to decide how a failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Format,
    Coordinate,
    InvariantViolation,
    Pairing,
    OutputConflict,
    Io,
}

#[derive(Debug)]
pub enum SealError {
    MissingOption(String),
    InvalidOption {
        option: String,
        value: String,
        reason: String,
    },
    PartitionerNotConfigured {
        partition_count: usize,
        partition_width: u64,
    },
    WrongFieldCount {
        expected: usize,
        found: usize,
        record: String,
    },
    InvalidFilterFlag {
        value: String,
        record: String,
    },
    InvalidNumber {
        field: &'static str,
        value: String,
    },
    MalformedAlignmentRecord(String),
    UnknownContig(String),
    CoordinateOutOfRange {
        contig: String,
        position: u64,
        length: u64,
    },
    PartitionOverflow {
        coordinate: u64,
        partition: u64,
        partition_count: usize,
        reference_length: u64,
    },
    UnpairedFragment {
        location: String,
        count: usize,
    },
    OutputAlreadyExists(PathBuf),
    InvalidAnnotation(String),
    AtLine {
        path: PathBuf,
        line: usize,
        source: Box<SealError>,
    },
    Io(IoError),
}

impl SealError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SealError::MissingOption(_)
            | SealError::InvalidOption { .. }
            | SealError::PartitionerNotConfigured { .. }
            | SealError::InvalidAnnotation(_) => ErrorKind::Configuration,
            SealError::WrongFieldCount { .. }
            | SealError::InvalidFilterFlag { .. }
            | SealError::InvalidNumber { .. }
            | SealError::MalformedAlignmentRecord(_) => ErrorKind::Format,
            SealError::UnknownContig(_) | SealError::CoordinateOutOfRange { .. } => {
                ErrorKind::Coordinate
            }
            SealError::PartitionOverflow { .. } => ErrorKind::InvariantViolation,
            SealError::UnpairedFragment { .. } => ErrorKind::Pairing,
            SealError::OutputAlreadyExists(_) => ErrorKind::OutputConflict,
            SealError::AtLine { source, .. } => source.kind(),
            SealError::Io(_) => ErrorKind::Io,
        }
    }

    /// Attach the file and 1-based line number at which a record-level error was raised.
    pub fn at_line(self, path: impl Into<PathBuf>, line: usize) -> Self {
        SealError::AtLine {
            path: path.into(),
            line,
            source: Box::new(self),
        }
    }
}

impl std::fmt::Display for SealError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SealError::MissingOption(option) => write!(f, "Missing required option: {}", option),
            SealError::InvalidOption {
                option,
                value,
                reason,
            } => write!(f, "Invalid value '{}' for {}: {}", value, option, reason),
            SealError::PartitionerNotConfigured {
                partition_count,
                partition_width,
            } => write!(
                f,
                "Partitioner is not configured (partition count: {}, partition width: {})",
                partition_count, partition_width
            ),
            SealError::WrongFieldCount {
                expected,
                found,
                record,
            } => write!(
                f,
                "Found {} fields instead of {} in record: {}",
                found, expected, record
            ),
            SealError::InvalidFilterFlag { value, record } => write!(
                f,
                "Invalid value '{}' in filter column (expected '0' or '1'): {}",
                value, record
            ),
            SealError::InvalidNumber { field, value } => {
                write!(f, "Invalid {} value: '{}'", field, value)
            }
            SealError::MalformedAlignmentRecord(record) => {
                write!(f, "Invalid SAM record: {}", record)
            }
            SealError::UnknownContig(name) => {
                write!(f, "Sequence '{}' not found in reference annotation", name)
            }
            SealError::CoordinateOutOfRange {
                contig,
                position,
                length,
            } => write!(
                f,
                "Position {} is outside contig '{}' (length {})",
                position, contig, length
            ),
            SealError::PartitionOverflow {
                coordinate,
                partition,
                partition_count,
                reference_length,
            } => write!(
                f,
                "Partition index too big: coordinate {} maps to partition {} of {} (reference length {})",
                coordinate, partition, partition_count, reference_length
            ),
            SealError::UnpairedFragment { location, count } => write!(
                f,
                "Didn't get a pair for location {} (got {} reads)",
                location, count
            ),
            SealError::OutputAlreadyExists(path) => write!(
                f,
                "Output destination {} exists. Please remove it or change the output path.",
                path.display()
            ),
            SealError::InvalidAnnotation(msg) => write!(f, "Invalid reference annotation: {}", msg),
            SealError::AtLine { path, line, source } => {
                write!(f, "{}:{}: {}", path.display(), line, source)
            }
            SealError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for SealError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SealError::AtLine { source, .. } => Some(source.as_ref()),
            SealError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IoError> for SealError {
    fn from(e: IoError) -> Self {
        SealError::Io(e)
    }
}

impl From<SealError> for IoError {
    fn from(e: SealError) -> Self {
        match e {
            SealError::Io(e) => e,
            other => {
                let kind = match other.kind() {
                    ErrorKind::Configuration => std::io::ErrorKind::InvalidInput,
                    ErrorKind::OutputConflict => std::io::ErrorKind::AlreadyExists,
                    _ => std::io::ErrorKind::InvalidData,
                };
                IoError::new(kind, other.to_string())
            }
        }
    }
}
