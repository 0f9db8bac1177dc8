//! Error handling for the WhileSynth toolchain
//!
//! Typed errors per phase plus a toolchain-level aggregate

use std::fmt;
use thiserror::Error;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl SourceLocation {
    pub fn new(file: String, line: usize, column: usize, offset: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset,
        }
    }

    pub fn unknown() -> Self {
        Self {
            file: "<unknown>".to_string(),
            line: 0,
            column: 0,
            offset: 0,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Lexical analysis errors
#[derive(Error, Debug, Clone)]
pub enum LexerError {
    #[error("Unexpected character '{character}' at {location}")]
    UnexpectedCharacter {
        character: char,
        location: SourceLocation,
    },

    #[error("Invalid number format '{value}' at {location}")]
    InvalidNumber {
        value: String,
        location: SourceLocation,
    },
}

/// Parsing errors
#[derive(Error, Debug, Clone)]
pub enum ParserError {
    #[error("Unexpected token {found:?}, expected {expected} at {location}")]
    UnexpectedToken {
        found: String,
        expected: String,
        location: SourceLocation,
    },

    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("Trailing input after program at {location}")]
    TrailingInput { location: SourceLocation },

    #[error("Lexer error: {source}")]
    LexerError {
        #[from]
        source: LexerError,
    },
}

/// Errors raised while building or discharging verification conditions
#[derive(Error, Debug, Clone)]
pub enum VerificationError {
    #[error("Variable '{name}' is not bound in the symbolic environment")]
    UnboundVariable { name: String },

    #[error("Identifier '{name}' is used both as a scalar and as an array")]
    SortClash { name: String },

    #[error("Hole has no solver identity; identities must be assigned before encoding")]
    MissingHoleIdentity,

    #[error("Expected a boolean expression, found an integer term")]
    BooleanExpected,

    #[error("Expected an integer expression, found a boolean term")]
    IntegerExpected,

    #[error("Identifier '{name}' names an array and cannot be read as a scalar")]
    ArrayAsScalar { name: String },

    #[error("Identifier '{name}' names a scalar and cannot be indexed")]
    ScalarAsArray { name: String },
}

/// Toolchain-level error aggregating all phases
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParserError),

    #[error("Verification error: {0}")]
    Verification(#[from] VerificationError),

    #[error("Example predicate lists differ in length: {inputs} inputs vs {outputs} outputs")]
    ExampleMismatch { inputs: usize, outputs: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation::new("prog.while".to_string(), 3, 7, 42);
        assert_eq!(loc.to_string(), "prog.while:3:7");
    }

    #[test]
    fn test_error_conversion() {
        let lex = LexerError::UnexpectedCharacter {
            character: '#',
            location: SourceLocation::unknown(),
        };
        let parse: ParserError = lex.into();
        let tool: ToolError = parse.into();
        assert!(tool.to_string().contains("Unexpected character"));
    }
}
