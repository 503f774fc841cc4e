//! Serde model of a command line.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use argot::info::{ActionKind, NumArgsInfo};
use argot::operations_of;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct CommandSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<SubCommandSchema>,
    #[serde(default)]
    pub subcommand_required: bool,
}

impl CommandSchema {
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct SubCommandSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ArgSchema {
    /// One positional name, or one or more `-x` / `--name` spellings.
    pub names: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(default)]
    pub action: ActionSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nargs: Option<Nargs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metavar: Option<String>,
    /// `r`, `w`, `a` with optional `+` and `b`; values are opened as files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_mode: Option<String>,
}

impl ArgSchema {
    /// The name used in schema diagnostics.
    pub fn label(&self) -> String {
        match self.names.as_slice() {
            [] => "<unnamed>".to_string(),
            names => names.join("/"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionSchema {
    #[default]
    Store,
    StoreConst,
    StoreTrue,
    StoreFalse,
    Append,
    AppendConst,
    Count,
    Help,
    Usage,
    Version,
}

impl ActionSchema {
    pub fn kind(self) -> ActionKind {
        match self {
            Self::Store => ActionKind::Store,
            Self::StoreConst => ActionKind::StoreConst,
            Self::StoreTrue => ActionKind::StoreTrue,
            Self::StoreFalse => ActionKind::StoreFalse,
            Self::Append => ActionKind::Append,
            Self::AppendConst => ActionKind::AppendConst,
            Self::Count => ActionKind::Count,
            Self::Help => ActionKind::PrintHelp,
            Self::Usage => ActionKind::PrintUsage,
            Self::Version => ActionKind::PrintVersion,
        }
    }

    /// Whether the action consumes command-line values.
    pub fn takes_values(self) -> bool {
        matches!(self, Self::Store | Self::Append)
    }
}

/// `nargs`: a count or one of `?`, `*`, `+`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Nargs {
    Count(usize),
    Flag(String),
}

impl Nargs {
    pub fn to_num_args(&self) -> Result<NumArgsInfo, String> {
        match self {
            Self::Count(n) => Ok(NumArgsInfo::from_num(*n)),
            Self::Flag(flag) => match flag.as_str() {
                "?" => Ok(NumArgsInfo::ZeroOrOne),
                "*" => Ok(NumArgsInfo::ZeroOrMore),
                "+" => Ok(NumArgsInfo::OneOrMore),
                other => Err(format!(
                    "invalid nargs `{other}` (expected a count, `?`, `*` or `+`)"
                )),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScalarType {
    #[default]
    String,
    Int,
    Float,
    Bool,
    Char,
    Path,
}

impl ScalarType {
    pub const ALL: [ScalarType; 6] = [
        Self::String,
        Self::Int,
        Self::Float,
        Self::Bool,
        Self::Char,
        Self::Path,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Path => "path",
        }
    }

    /// The Rust type slots of this scalar are stored as.
    pub fn rust_type(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int => "i64",
            Self::Float => "f64",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Path => "PathBuf",
        }
    }

    /// The hint help output shows for this scalar.
    pub fn type_hint(self) -> String {
        match self {
            Self::String => operations_of::<String>().type_hint(),
            Self::Int => operations_of::<i64>().type_hint(),
            Self::Float => operations_of::<f64>().type_hint(),
            Self::Bool => operations_of::<bool>().type_hint(),
            Self::Char => operations_of::<char>().type_hint(),
            Self::Path => operations_of::<PathBuf>().type_hint(),
        }
    }
}

/// A scalar, or `list[scalar]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValueType {
    pub scalar: ScalarType,
    pub list: bool,
}

impl ValueType {
    pub fn scalar(scalar: ScalarType) -> Self {
        Self {
            scalar,
            list: false,
        }
    }

    pub fn list(scalar: ScalarType) -> Self {
        Self { scalar, list: true }
    }

    pub fn type_hint(self) -> String {
        if self.list {
            format!("list[{}]", self.scalar.type_hint())
        } else {
            self.scalar.type_hint()
        }
    }
}

impl FromStr for ValueType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let (inner, list) = match text.strip_prefix("list[").and_then(|r| r.strip_suffix(']')) {
            Some(inner) => (inner.trim(), true),
            None => (text, false),
        };
        let scalar = ScalarType::ALL
            .into_iter()
            .find(|t| t.name() == inner)
            .ok_or_else(|| SchemaError::UnknownType(s.to_string()))?;
        Ok(Self { scalar, list })
    }
}

impl TryFrom<String> for ValueType {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ValueType> for String {
    fn from(value: ValueType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.list {
            write!(f, "list[{}]", self.scalar.name())
        } else {
            f.write_str(self.scalar.name())
        }
    }
}
