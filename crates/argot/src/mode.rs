//! File open modes.

use std::fmt;
use std::fs::OpenOptions;
use std::ops::{BitOr, BitOrAssign};

use crate::error::ConversionError;

/// Bitmask describing how a file argument is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OpenMode(u8);

impl OpenMode {
    pub const NONE: Self = Self(0);
    pub const READ: Self = Self(1);
    pub const WRITE: Self = Self(2);
    pub const APPEND: Self = Self(4);
    pub const TRUNCATE: Self = Self(8);
    pub const BINARY: Self = Self(16);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x1f)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Parse a C-style mode string (`r`, `w+`, `ab`, `rb+` ...).
    ///
    /// Exactly one of `r`, `w`, `a` is required. `+` may follow it and adds
    /// the complementary read/write bit; naming that bit directly (`rw`,
    /// `wr`, `ar`) is the same as `+`. `b` may appear anywhere after the
    /// leading letter.
    pub fn from_chars(chars: &str) -> Result<Self, ConversionError> {
        let invalid = || ConversionError::InvalidMode(chars.to_string());
        let mut iter = chars.chars();
        let (mut mode, complement) = match iter.next() {
            Some('r') => (Self::READ, 'w'),
            Some('w') => (Self::WRITE | Self::TRUNCATE, 'r'),
            Some('a') => (Self::WRITE | Self::APPEND, 'r'),
            _ => return Err(invalid()),
        };
        let (mut plus, mut binary) = (false, false);
        for c in iter {
            match c {
                c if !plus && (c == '+' || c == complement) => {
                    plus = true;
                    mode |= Self::READ | Self::WRITE;
                }
                'b' if !binary => {
                    binary = true;
                    mode |= Self::BINARY;
                }
                _ => return Err(invalid()),
            }
        }
        Ok(mode)
    }

    /// Render back to a mode string that names every access bit: `r+`
    /// comes back as `rw`, `w+` as `wr`, `ab+` as `arb`. `None` if the bits
    /// do not describe an openable mode (no read and no write bit).
    pub fn to_chars(self) -> Option<String> {
        let read = self.contains(Self::READ);
        let write = self.contains(Self::WRITE) || self.contains(Self::APPEND);
        let (primary, complement) = if self.contains(Self::APPEND) {
            ('a', read.then_some('r'))
        } else if write && (self.contains(Self::TRUNCATE) || !read) {
            ('w', read.then_some('r'))
        } else if read {
            ('r', write.then_some('w'))
        } else {
            return None;
        };
        let mut out = String::from(primary);
        out.extend(complement);
        if self.contains(Self::BINARY) {
            out.push('b');
        }
        Some(out)
    }

    /// Translate into the host representation.
    pub fn to_open_options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        let append = self.contains(Self::APPEND);
        let write = self.contains(Self::WRITE) || append;
        options
            .read(self.contains(Self::READ))
            .write(write)
            .append(append)
            .truncate(self.contains(Self::TRUNCATE) && !append)
            .create(write);
        options
    }
}

impl BitOr for OpenMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for OpenMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_chars() {
            Some(chars) => f.write_str(&chars),
            None => write!(f, "{:#04x}", self.0),
        }
    }
}
