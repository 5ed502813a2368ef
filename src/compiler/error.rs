use std::{error::Error, fmt::Display, io};

use crate::lexer::Position;

/// An error which happened while compiling a program: either the
/// output could not be written, or the program needs a diagnostic.
/// Diagnostics are rendered as `file:line:col ERROR: message`, like the
/// parser's errors.
#[derive(Debug)]
pub enum CompileError {
    Io(io::Error),
    Diagnostic { message: String, position: Position },
}

impl Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Io(error) => {
                write!(f, "ERROR: Cannot write the output file: {error}")
            }
            CompileError::Diagnostic { message, position } => {
                let (file, line, col) = position;
                write!(f, "{file}:{line}:{col} ERROR: {message}")
            }
        }
    }
}

impl Error for CompileError {}

impl From<io::Error> for CompileError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

/// The result of compiling (part of) a program.
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let error = CompileError::Diagnostic {
            message: "Unknown identifier 'x'.".to_owned(),
            position: ("main.betsy".to_owned(), 1, 11),
        };

        assert_eq!(
            error.to_string(),
            "main.betsy:1:11 ERROR: Unknown identifier 'x'."
        );
    }
}
