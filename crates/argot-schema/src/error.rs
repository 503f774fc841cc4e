use thiserror::Error;

/// Problems found in a command schema before anything is declared on a
/// parser.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "unknown value type `{0}` (expected string, int, float, bool, char, path or list[...])"
    )]
    UnknownType(String),

    #[error("command `{command}`: invalid argument name `{name}`")]
    InvalidName { command: String, name: String },

    #[error("command `{command}`: argument name `{name}` is declared twice")]
    DuplicateName { command: String, name: String },

    #[error("command `{command}`: value key `{key}` is produced twice")]
    DuplicateKey { command: String, key: String },

    #[error("argument `{argument}`: {reason}")]
    Invalid { argument: String, reason: String },

    #[error("argument `{argument}`: bad default: {reason}")]
    BadDefault { argument: String, reason: String },

    #[error("argument `{argument}`: bad const: {reason}")]
    BadConst { argument: String, reason: String },

    #[error("invalid sub-command name `{0}`")]
    InvalidSubCommand(String),

    #[error("sub-command name `{0}` is declared twice")]
    DuplicateSubCommand(String),

    #[error("slot table was allocated for a different schema")]
    TableMismatch,
}

impl SchemaError {
    pub(crate) fn invalid(argument: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            argument: argument.to_string(),
            reason: reason.into(),
        }
    }
}
