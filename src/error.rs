//! Library error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The engine executable could not be launched. Never retried.
    #[error("failed to launch engine `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Columns of a matrix disagree on length.
    #[error("column {column} has {found} values, expected {expected}")]
    Shape {
        column: usize,
        expected: usize,
        found: usize,
    },

    /// The engine answered a separator query in a shape we do not recognise.
    #[error("unrecognised datafile separator reply: {reply:?}")]
    ProtocolParse { reply: String },

    #[error("session has not been started")]
    NotStarted,

    #[error("invalid value {value:?} for {key}: {reason}")]
    Config {
        key: String,
        value: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
