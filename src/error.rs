//! Error type shared by all evaluators.
//!
//! Every error signals malformed input or a violated precondition; none of
//! them is transient, so nothing here is ever retried.

use std::fmt;
use std::io;

/// Errors raised while loading or evaluating circuits.
#[derive(Debug)]
pub enum Error {
    /// Missing or wrong header token, unknown record kind, or an unparsable field.
    Format { line: usize, message: String },
    /// A record refers to a node id that is out of range or not yet defined.
    CorruptReference { line: usize, id: usize },
    /// A literal weight that is not a probability, where one is required.
    InvalidWeight { literal: i32, weight: f64 },
    /// A circuit node that is neither a decision, a literal, nor a constant.
    UnknownLeafKind(String),
    /// A node was treated as a decision node but does not have decision shape.
    ExpectedDecisionNode(String),
    /// File I/O error.
    Io(io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        Error::Format {
            line,
            message: message.into(),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Format { line, message } => write!(f, "Format error on line {}: {}", line, message),
            Error::CorruptReference { line, id } => {
                write!(f, "Corrupt reference on line {}: node {} is not defined", line, id)
            }
            Error::InvalidWeight { literal, weight } => {
                write!(f, "Invalid weight {} for literal {}: expected a probability", weight, literal)
            }
            Error::UnknownLeafKind(node) => write!(f, "Unknown node kind: {}", node),
            Error::ExpectedDecisionNode(node) => write!(f, "Expected a decision node: {}", node),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}
