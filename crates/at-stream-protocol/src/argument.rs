//! Typed command arguments and their wire text form.
//!
//! Arguments are joined with commas. Integers are plain decimal, strings are
//! wrapped in double quotes and copied verbatim, and a null argument leaves its
//! field empty:
//!
//! ```text
//! "version",2,,-7
//! ```
//!
//! There is no escaping. A string containing `"` or `,` is sent as-is but will
//! not parse back to the same value.

use std::borrow::Cow;
use std::fmt::{self, Write};

use crate::error::{AtError, AtResult, BufferKind};

/// Separator between argument fields.
pub const ARGUMENT_SEPARATOR: char = ',';

/// Delimiter wrapped around string arguments.
pub const STRING_DELIMITER: char = '"';

/// A single command or response argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument<'a> {
    /// Signed decimal integer.
    Integer(i32),
    /// Quoted text, without the quotes.
    String(Cow<'a, str>),
    /// An empty field.
    Null,
}

impl<'a> Argument<'a> {
    /// Build a string argument from borrowed or owned text.
    pub fn string(text: impl Into<Cow<'a, str>>) -> Self {
        Argument::String(text.into())
    }

    /// Detach the argument from any borrowed text.
    pub fn into_owned(self) -> Argument<'static> {
        match self {
            Argument::Integer(value) => Argument::Integer(value),
            Argument::String(text) => Argument::String(Cow::Owned(text.into_owned())),
            Argument::Null => Argument::Null,
        }
    }

    /// Get the value if this is an integer argument.
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Argument::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the text if this is a string argument.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Argument::String(text) => Some(text),
            _ => None,
        }
    }

    /// Check if this is a null argument.
    pub fn is_null(&self) -> bool {
        matches!(self, Argument::Null)
    }

    /// Whether this argument survives a serialize/parse round trip.
    pub fn is_wire_safe(&self) -> bool {
        match self {
            Argument::String(text) => !text.contains([STRING_DELIMITER, ARGUMENT_SEPARATOR]),
            _ => true,
        }
    }

    /// Number of bytes this argument occupies on the wire.
    fn wire_len(&self) -> usize {
        match self {
            Argument::Integer(value) => decimal_len(*value),
            Argument::String(text) => text.len() + 2,
            Argument::Null => 0,
        }
    }
}

impl From<i32> for Argument<'_> {
    fn from(value: i32) -> Self {
        Argument::Integer(value)
    }
}

impl<'a> From<&'a str> for Argument<'a> {
    fn from(text: &'a str) -> Self {
        Argument::String(Cow::Borrowed(text))
    }
}

impl From<String> for Argument<'_> {
    fn from(text: String) -> Self {
        Argument::String(Cow::Owned(text))
    }
}

impl fmt::Display for Argument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Integer(value) => write!(f, "{}", value),
            Argument::String(text) => write!(f, "{0}{1}{0}", STRING_DELIMITER, text),
            Argument::Null => Ok(()),
        }
    }
}

fn decimal_len(value: i32) -> usize {
    let digits = value.unsigned_abs().checked_ilog10().map_or(1, |log| log as usize + 1);
    digits + usize::from(value < 0)
}

/// Serialize arguments into their comma-joined wire form.
///
/// The output is reserved up front; if that allocation fails the result is
/// [`AtError::AllocationFailure`] rather than an abort.
pub fn serialize_arguments(args: &[Argument<'_>]) -> AtResult<String> {
    let len = args.iter().map(Argument::wire_len).sum::<usize>() + args.len().saturating_sub(1);

    let mut out = String::new();
    out.try_reserve_exact(len).map_err(|_| AtError::AllocationFailure {
        buffer: BufferKind::Command,
        limit: len,
    })?;

    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(ARGUMENT_SEPARATOR);
        }
        // Formatting into a String cannot fail.
        let _ = write!(out, "{}", arg);
    }

    Ok(out)
}

/// Parse comma-separated argument text, as echoed back in response lines.
///
/// Each field is classified in order: a field both starting and ending with
/// `"` is a string (quotes stripped, nothing unescaped), an empty field is
/// null, anything else must be a decimal `i32`. Non-numeric text is rejected
/// with [`AtError::MalformedArgument`] instead of being read as zero.
///
/// String arguments borrow from `text`. Empty input yields no arguments.
pub fn parse_arguments(text: &str) -> AtResult<Vec<Argument<'_>>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }

    text.split(ARGUMENT_SEPARATOR)
        .enumerate()
        .map(|(index, field)| parse_field(index, field))
        .collect()
}

fn parse_field(index: usize, field: &str) -> AtResult<Argument<'_>> {
    if field.len() >= 2 && field.starts_with(STRING_DELIMITER) && field.ends_with(STRING_DELIMITER) {
        return Ok(Argument::String(Cow::Borrowed(&field[1..field.len() - 1])));
    }

    if field.is_empty() {
        return Ok(Argument::Null);
    }

    field
        .parse::<i32>()
        .map(Argument::Integer)
        .map_err(|_| AtError::MalformedArgument {
            index,
            text: field.to_string(),
        })
}
