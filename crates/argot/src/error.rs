//! Recoverable errors.
//!
//! Only user-input problems are represented here. Declaration mistakes
//! (bad names, name collisions, unsupported operations) panic instead; they
//! are bugs in how a command line was declared, not something an end user
//! can fix.

use thiserror::Error;

/// Failure to turn one piece of text into a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("invalid numeric format: '{0}'")]
    InvalidNumber(String),

    #[error("numeric value out of range: '{0}'")]
    OutOfRange(String),

    #[error("invalid boolean value: '{0}' (expected true/t/1 or false/f/0)")]
    InvalidBool(String),

    #[error("invalid character value: '{0}' (expected exactly one printable character)")]
    InvalidChar(String),

    #[error("invalid file mode: '{0}'")]
    InvalidMode(String),

    #[error("can't open '{path}': {reason}")]
    Open { path: String, reason: String },

    #[error("{0}")]
    Message(String),
}

impl ConversionError {
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }
}

impl From<String> for ConversionError {
    fn from(msg: String) -> Self {
        Self::Message(msg)
    }
}

impl From<&str> for ConversionError {
    fn from(msg: &str) -> Self {
        Self::Message(msg.to_string())
    }
}

/// Errors reported by [`crate::parser::ArgumentParser::parse_args`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unrecognized option: {0}")]
    UnknownOption(String),

    #[error("option {option} does not take a value")]
    UnexpectedValue { option: String },

    #[error("argument {argument}: {expected}")]
    WrongCount { argument: String, expected: String },

    #[error("argument {argument}: {source}")]
    Conversion {
        argument: String,
        #[source]
        source: ConversionError,
    },

    #[error("unrecognized arguments: {}", .0.join(" "))]
    Unrecognized(Vec<String>),

    #[error("the following arguments are required: {}", .0.join(", "))]
    MissingRequired(Vec<String>),

    #[error("invalid choice: '{given}' (choose from {})", .choices.join(", "))]
    UnknownSubCommand { given: String, choices: Vec<String> },

    #[error("a sub-command is required (choose from {})", .0.join(", "))]
    MissingSubCommand(Vec<String>),
}

impl ParseError {
    /// Whether the error came from the argument text rather than from its shape.
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
