/* Diagnostics reported by the bracket validator and the scanner. None of these abort a scan,
 * they are collected in source order and handed back to the caller at the end. */

use serde::Serialize;
use std::fmt;

/// The broad class a diagnostic belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    /// Unmatched brackets or a missing outer `{}` wrapper
    Structural,
    /// Malformed numbers, floats, identifiers, strings or stray characters
    LexicalForm,
    /// A language rule such as `shout` requiring parentheses was broken
    LanguageRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// A closing bracket with no open bracket of the same kind before it
    UnmatchedClosing { bracket: char, position: usize },
    /// An opening bracket still open at the end of the source
    UnmatchedOpening { bracket: char, position: usize },
    /// The trimmed source does not start with `{` and end with `}`
    MissingWrapper,
    InvalidFloat(String),
    InvalidNumber(String),
    InvalidIdentifier(String),
    UnexpectedCharacter(char),
    UnterminatedString,
    UnterminatedComment,
    /// A call keyword was not followed by `(`
    MissingCallParens(String),
    /// A call keyword's `(` was never closed before `;` or the end of input
    UnclosedCallParens(String),
}

/// A single problem found in the source, with the 1-based line it was found on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    kind: DiagnosticKind,
    line: usize,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, line: usize) -> Self {
        Diagnostic { kind, line }
    }

    pub fn get_kind(&self) -> &DiagnosticKind {
        &self.kind
    }

    pub fn get_line(&self) -> usize {
        self.line
    }

    pub fn category(&self) -> Category {
        match self.kind {
            DiagnosticKind::UnmatchedClosing { .. }
            | DiagnosticKind::UnmatchedOpening { .. }
            | DiagnosticKind::MissingWrapper => Category::Structural,
            DiagnosticKind::MissingCallParens(_) | DiagnosticKind::UnclosedCallParens(_) => {
                Category::LanguageRule
            }
            _ => Category::LexicalForm,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.line;
        match &self.kind {
            DiagnosticKind::UnmatchedClosing { bracket, position } => write!(
                f,
                "Syntax Error: Unmatched closing bracket `{}` at position {}",
                bracket, position
            ),
            DiagnosticKind::UnmatchedOpening { bracket, position } => write!(
                f,
                "Syntax Error: Unmatched opening bracket `{}` at position {}",
                bracket, position
            ),
            DiagnosticKind::MissingWrapper => {
                write!(f, "Syntax Error: Code must be wrapped in curly brackets `{{}}`.")
            }
            DiagnosticKind::InvalidFloat(lexeme) => {
                write!(f, "Invalid float format: {} at line {}", lexeme, line)
            }
            DiagnosticKind::InvalidNumber(lexeme) => {
                write!(f, "Invalid number format: {} at line {}", lexeme, line)
            }
            DiagnosticKind::InvalidIdentifier(lexeme) => write!(
                f,
                "Invalid identifier: starts with invalid character at line {} = {}",
                line, lexeme
            ),
            DiagnosticKind::UnexpectedCharacter(ch) => {
                write!(f, "Unexpected character: {:?} at line {}", ch, line)
            }
            DiagnosticKind::UnterminatedString => {
                write!(f, "Unterminated string literal starting at line {}", line)
            }
            DiagnosticKind::UnterminatedComment => {
                write!(f, "Unterminated block comment starting at line {}", line)
            }
            DiagnosticKind::MissingCallParens(keyword) => write!(
                f,
                "Syntax Error: `{}` must be followed by parentheses `()` at line {}",
                keyword, line
            ),
            DiagnosticKind::UnclosedCallParens(keyword) => write!(
                f,
                "Syntax Error: Brackets of `{}` not closed, expected ')' at line {}",
                keyword, line
            ),
        }
    }
}
