//! Definition of errors.

use std::error::Error;
use std::fmt;

pub type Result<T, E = DacmarkError> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum DacmarkError {
    EmptyDictionary,
    InvalidPattern(InvalidPatternError),
    WorkerDisconnected,
}

impl DacmarkError {
    pub(crate) fn invalid_pattern<S>(index: usize, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidPattern(InvalidPatternError {
            index,
            msg: msg.into(),
        })
    }
}

impl fmt::Display for DacmarkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::EmptyDictionary => write!(f, "EmptyDictionary: no patterns were given"),
            Self::InvalidPattern(e) => e.fmt(f),
            Self::WorkerDisconnected => {
                write!(f, "WorkerDisconnected: tagger threads are no longer running")
            }
        }
    }
}

impl Error for DacmarkError {}

/// Error used when a pattern cannot be compiled into the automaton.
#[derive(Debug)]
pub struct InvalidPatternError {
    /// Position of the pattern in the given dictionary.
    pub(crate) index: usize,

    /// Error message.
    pub(crate) msg: String,
}

impl InvalidPatternError {
    /// Position of the rejected pattern in the given dictionary.
    pub const fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for InvalidPatternError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidPatternError: pattern #{}: {}", self.index, self.msg)
    }
}

impl Error for InvalidPatternError {}
