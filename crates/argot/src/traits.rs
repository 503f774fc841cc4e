//! Trait families a value type implements to take part in argument handling.
//!
//! Each family is independent. Implementing one does nothing on its own: the
//! type also has to switch the matching capability on in its
//! [`crate::ops::ArgType`] registration.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::num::IntErrorKind;
use std::path::PathBuf;

use crate::error::ConversionError;
use crate::mode::OpenMode;

/// Text to value.
pub trait ParseTraits: Sized {
    fn parse_text(text: &str) -> Result<Self, ConversionError>;
}

/// Containers that accept one element at a time.
pub trait AppendTraits {
    type Value;

    fn append_value(&mut self, value: Self::Value);

    fn clear_values(&mut self);
}

/// Types created by opening a named file.
pub trait OpenTraits: Sized {
    fn open_path(path: &str, mode: OpenMode) -> Result<Self, ConversionError>;
}

/// Value to display text (used for default-value hints).
pub trait FormatTraits {
    fn format_text(&self) -> String;
}

/// Types a `count` action can bump.
pub trait CountTraits {
    fn increment(&mut self);
}

/// Custom user-facing type name.
pub trait TypeHintTraits {
    fn type_hint() -> String;
}

/// Coarse classification used to pick a default type hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetaType {
    String,
    Bool,
    Char,
    File,
    List,
    Number,
    #[default]
    Other,
}

impl ParseTraits for bool {
    fn parse_text(text: &str) -> Result<Self, ConversionError> {
        match text.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Ok(true),
            "false" | "f" | "0" => Ok(false),
            _ => Err(ConversionError::InvalidBool(text.to_string())),
        }
    }
}

impl ParseTraits for char {
    fn parse_text(text: &str) -> Result<Self, ConversionError> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if is_printable(c) => Ok(c),
            _ => Err(ConversionError::InvalidChar(text.to_string())),
        }
    }
}

/// Rejects controls (Cc), format characters (Cf) and separators (Zs, Zl,
/// Zp) other than the ASCII space. Unassigned code points pass.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !c.is_control()
        && !matches!(
            c,
            // Zs
            '\u{a0}' | '\u{1680}' | '\u{2000}'..='\u{200a}' | '\u{202f}' | '\u{205f}' | '\u{3000}'
            // Zl, Zp
            | '\u{2028}' | '\u{2029}'
            // Cf
            | '\u{ad}'
            | '\u{600}'..='\u{605}'
            | '\u{61c}'
            | '\u{6dd}'
            | '\u{70f}'
            | '\u{890}'..='\u{891}'
            | '\u{8e2}'
            | '\u{180e}'
            | '\u{200b}'..='\u{200f}'
            | '\u{202a}'..='\u{202e}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206f}'
            | '\u{feff}'
            | '\u{fff9}'..='\u{fffb}'
            | '\u{110bd}'
            | '\u{110cd}'
            | '\u{13430}'..='\u{1343f}'
            | '\u{1bca0}'..='\u{1bca3}'
            | '\u{1d173}'..='\u{1d17a}'
            | '\u{e0001}'
            | '\u{e0020}'..='\u{e007f}'
        )
}

impl ParseTraits for String {
    fn parse_text(text: &str) -> Result<Self, ConversionError> {
        Ok(text.to_string())
    }
}

impl ParseTraits for PathBuf {
    fn parse_text(text: &str) -> Result<Self, ConversionError> {
        Ok(PathBuf::from(text))
    }
}

impl ParseTraits for OsString {
    fn parse_text(text: &str) -> Result<Self, ConversionError> {
        Ok(OsString::from(text))
    }
}

macro_rules! integer_traits {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ParseTraits for $ty {
                fn parse_text(text: &str) -> Result<Self, ConversionError> {
                    text.parse::<$ty>().map_err(|e| match e.kind() {
                        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                            ConversionError::OutOfRange(text.to_string())
                        }
                        _ => ConversionError::InvalidNumber(text.to_string()),
                    })
                }
            }

            impl CountTraits for $ty {
                fn increment(&mut self) {
                    *self = self.saturating_add(1);
                }
            }
        )*
    };
}

integer_traits!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! float_traits {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ParseTraits for $ty {
                fn parse_text(text: &str) -> Result<Self, ConversionError> {
                    let value = text
                        .parse::<$ty>()
                        .map_err(|_| ConversionError::InvalidNumber(text.to_string()))?;
                    if value.is_infinite() && !names_infinity(text) {
                        return Err(ConversionError::OutOfRange(text.to_string()));
                    }
                    Ok(value)
                }
            }
        )*
    };
}

float_traits!(f32, f64);

fn names_infinity(text: &str) -> bool {
    let unsigned = text.trim_start_matches(['+', '-']);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

impl<T> AppendTraits for Vec<T> {
    type Value = T;

    fn append_value(&mut self, value: T) {
        self.push(value);
    }

    fn clear_values(&mut self) {
        self.clear();
    }
}

impl<T> AppendTraits for VecDeque<T> {
    type Value = T;

    fn append_value(&mut self, value: T) {
        self.push_back(value);
    }

    fn clear_values(&mut self) {
        self.clear();
    }
}

impl OpenTraits for File {
    fn open_path(path: &str, mode: OpenMode) -> Result<Self, ConversionError> {
        let mode = if mode.is_empty() { OpenMode::READ } else { mode };
        mode.to_open_options()
            .open(path)
            .map_err(|e| ConversionError::Open {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }
}

impl OpenTraits for BufReader<File> {
    fn open_path(path: &str, mode: OpenMode) -> Result<Self, ConversionError> {
        File::open_path(path, mode).map(BufReader::new)
    }
}

impl OpenTraits for BufWriter<File> {
    fn open_path(path: &str, mode: OpenMode) -> Result<Self, ConversionError> {
        let mode = if mode.is_empty() {
            OpenMode::WRITE | OpenMode::TRUNCATE
        } else {
            mode
        };
        File::open_path(path, mode).map(BufWriter::new)
    }
}
