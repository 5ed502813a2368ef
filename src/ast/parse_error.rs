use std::{error::Error, fmt::Display};

use crate::lexer::Position;

/// Struct representing an error which happened while parsing the code.
///
/// Rendered as `file:line:col ERROR: message`, optionally followed by a
/// `NOTE:` line pointing at a secondary position (e.g., the first
/// definition of a redefined variable).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    /// Error message of this parse error
    pub message: String,
    /// Position of this error
    pub position: Position,
    /// An optional annotation with a secondary position
    pub note: Option<Note>,
}

/// An annotation attached to a [`ParseError`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub message: String,
    pub position: Position,
}

impl ParseError {
    pub fn new(message: String, position: Position) -> Self {
        Self {
            message,
            position,
            note: None,
        }
    }

    pub fn with_note(mut self, message: String, position: Position) -> Self {
        self.note = Some(Note { message, position });
        self
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (file, line, col) = &self.position;
        write!(f, "{file}:{line}:{col} ERROR: {}", self.message)?;

        if let Some(Note { message, position }) = &self.note {
            let (file, line, col) = position;
            write!(f, "\n{file}:{line}:{col} NOTE:  {message}")?;
        }

        Ok(())
    }
}

impl Error for ParseError {}

/// The result of parsing a sequence of operations.
pub type ParseResult<T> = Result<T, ParseError>;
