//! Errors raised while compiling. The first one is always fatal.
use std::fmt;
use std::io;

use super::lexer::Token;

/// The current token does not fit the grammar at this point.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub image: String,
    pub expected: String,
}

impl SyntaxError {
    /// Builds an error anchored at the start of `found`.
    pub fn at(found: &Token, expected: impl Into<String>) -> Self {
        SyntaxError {
            line: found.begin_line,
            column: found.begin_column,
            image: found.image.clone(),
            expected: expected.into(),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error on line {} column {}\nScanning {}, expecting {}",
            self.line, self.column, self.image, self.expected)
    }
}

#[derive(Debug)]
pub enum CompileError {
    Syntax(SyntaxError),
    Io(io::Error),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompileError::Syntax(e) => write!(f, "{}", e),
            CompileError::Io(e) => write!(f, "unable to read source: {}", e),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Syntax(_) => None,
            CompileError::Io(e) => Some(e),
        }
    }
}

impl From<SyntaxError> for CompileError {
    fn from(e: SyntaxError) -> Self {
        CompileError::Syntax(e)
    }
}

impl From<io::Error> for CompileError {
    fn from(e: io::Error) -> Self {
        CompileError::Io(e)
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
