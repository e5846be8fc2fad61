/* Hand written scanner for the .aa language. The scanner walks the source one character at a
 * time and dispatches on its current mode. A mode handler either consumes characters or asks for
 * the current character to be examined again in the mode it switched to, which is how a lexeme
 * ends on a character that belongs to the next lexeme. */

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::language::Lexicon;
use serde::Serialize;
use std::fmt;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Number,
    Float,
    String,
    ArithOp,
    AssignOp,
    Semicolon,
    Power,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Number => "NUMBER",
            TokenKind::Float => "FLOAT",
            TokenKind::String => "STRING",
            TokenKind::ArithOp => "ARITH_OP",
            TokenKind::AssignOp => "ASSIGN_OP",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Power => "POWER",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    kind: TokenKind,
    lexeme: String,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: &str) -> Self {
        Token {
            kind,
            lexeme: lexeme.to_string(),
        }
    }
    /// Get the syntactic category of the token
    pub fn get_kind(&self) -> TokenKind {
        self.kind
    }
    /// Get the source text the token was built from. String tokens do not include the quotes.
    pub fn get_lexeme(&self) -> &String {
        &self.lexeme
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.kind, self.lexeme)
    }
}

/// Tokens and diagnostics of one scan, both in source order
#[derive(Debug, Default, Serialize)]
pub struct ScanOutput {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanMode {
    Normal,
    Identifier,
    Integer,
    Float,
    /// A digit run which ran into a letter, absorbed up to the next whitespace or `;`
    MalformedNumber,
    LineComment,
    BlockComment { opened_at: usize },
}

enum Step {
    /// Consume this many characters, starting with the current one
    Consume(usize),
    /// Leave the current character where it is to be examined again
    Reexamine,
}

struct Scanner<'a> {
    lexicon: &'a Lexicon,
    source: Vec<char>,
    cursor: usize,
    line: usize,
    buffer: String,
    mode: ScanMode,
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
}

// Brackets are checked by the bracket validator and never become tokens
fn is_structural(ch: char) -> bool {
    matches!(ch, '{' | '}' | '(' | ')' | '[' | ']')
}

fn is_float_literal(text: &str) -> bool {
    match text.split_once('.') {
        Some((whole, fraction)) => {
            !whole.is_empty()
                && !fraction.is_empty()
                && whole.chars().all(|c| c.is_ascii_digit())
                && fraction.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

impl<'a> Scanner<'a> {
    fn new(source: &str, lexicon: &'a Lexicon) -> Self {
        Scanner {
            lexicon,
            source: source.chars().collect(),
            cursor: 0,
            line: 1,
            buffer: String::new(),
            mode: ScanMode::Normal,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn run(mut self) -> ScanOutput {
        while let Some(&ch) = self.source.get(self.cursor) {
            let step = match self.mode {
                ScanMode::Normal => self.scan_normal(ch),
                ScanMode::Identifier => self.scan_identifier(ch),
                ScanMode::Integer => self.scan_integer(ch),
                ScanMode::Float => self.scan_float(ch),
                ScanMode::MalformedNumber => self.scan_malformed_number(ch),
                ScanMode::LineComment => self.scan_line_comment(ch),
                ScanMode::BlockComment { .. } => self.scan_block_comment(),
            };

            if let Step::Consume(amount) = step {
                self.advance(amount);
            }
        }

        self.finish();

        debug!(
            tokens = self.tokens.len(),
            diagnostics = self.diagnostics.len(),
            lines = self.line,
            "scan finished"
        );

        ScanOutput {
            tokens: self.tokens,
            diagnostics: self.diagnostics,
        }
    }

    // Every consumed newline counts, whatever the mode
    fn advance(&mut self, amount: usize) {
        let end = (self.cursor + amount).min(self.source.len());
        self.line += self.source[self.cursor..end]
            .iter()
            .filter(|&&ch| ch == '\n')
            .count();
        self.cursor = end;
    }

    fn source_matches(&self, at: usize, pattern: &str) -> bool {
        pattern
            .chars()
            .enumerate()
            .all(|(offset, ch)| self.source.get(at + offset) == Some(&ch))
    }

    fn emit(&mut self, kind: TokenKind, lexeme: &str) {
        trace!(%kind, lexeme, line = self.line, "token");
        self.tokens.push(Token::new(kind, lexeme));
    }

    fn report(&mut self, kind: DiagnosticKind) {
        self.diagnostics.push(Diagnostic::new(kind, self.line));
    }

    fn emit_single(&mut self, kind: TokenKind, ch: char) -> Step {
        self.emit(kind, &ch.to_string());
        Step::Consume(1)
    }

    fn begin(&mut self, mode: ScanMode, ch: char) -> Step {
        self.buffer.push(ch);
        self.mode = mode;
        Step::Consume(1)
    }

    fn scan_normal(&mut self, ch: char) -> Step {
        match ch {
            _ if ch.is_whitespace() || is_structural(ch) => Step::Consume(1),
            'a'..='z' => self.begin(ScanMode::Identifier, ch),
            '0'..='9' => self.begin(ScanMode::Integer, ch),
            '"' => self.scan_string(),
            '+' | '-' | '*' | '/' | '%' => self.emit_single(TokenKind::ArithOp, ch),
            '=' => self.emit_single(TokenKind::AssignOp, ch),
            '^' => self.emit_single(TokenKind::Power, ch),
            ';' => self.emit_single(TokenKind::Semicolon, ch),
            '~' => {
                self.mode = ScanMode::LineComment;
                Step::Consume(1)
            }
            '#' if self.source_matches(self.cursor + 1, "**") => {
                self.mode = ScanMode::BlockComment {
                    opened_at: self.line,
                };
                Step::Consume(3)
            }
            _ if ch.is_control() => {
                self.report(DiagnosticKind::UnexpectedCharacter(ch));
                Step::Consume(1)
            }
            _ => self.scan_invalid_identifier(),
        }
    }

    // Everything up to the next double quote is taken verbatim
    fn scan_string(&mut self) -> Step {
        let start = self.cursor + 1;
        let remaining = self.source.len() - self.cursor;

        match self.source[start..].iter().position(|&ch| ch == '"') {
            Some(length) => {
                let lexeme: String = self.source[start..start + length].iter().collect();
                self.emit(TokenKind::String, &lexeme);
                Step::Consume(length + 2)
            }
            None => {
                self.report(DiagnosticKind::UnterminatedString);
                Step::Consume(remaining)
            }
        }
    }

    fn scan_invalid_identifier(&mut self) -> Step {
        let lexeme: String = self.source[self.cursor..]
            .iter()
            .take_while(|ch| !ch.is_whitespace())
            .collect();
        let length = lexeme.chars().count();

        self.report(DiagnosticKind::InvalidIdentifier(lexeme));
        Step::Consume(length)
    }

    fn scan_identifier(&mut self, ch: char) -> Step {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            self.buffer.push(ch);
            Step::Consume(1)
        } else {
            self.finish_word();
            Step::Reexamine
        }
    }

    fn scan_integer(&mut self, ch: char) -> Step {
        match ch {
            '0'..='9' => self.begin(ScanMode::Integer, ch),
            '.' => self.begin(ScanMode::Float, ch),
            _ if ch.is_ascii_alphabetic() || ch == '_' => {
                self.begin(ScanMode::MalformedNumber, ch)
            }
            _ => {
                self.finish_integer();
                Step::Reexamine
            }
        }
    }

    fn scan_float(&mut self, ch: char) -> Step {
        if ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' {
            self.buffer.push(ch);
            Step::Consume(1)
        } else {
            self.finish_float();
            Step::Reexamine
        }
    }

    fn scan_malformed_number(&mut self, ch: char) -> Step {
        if ch.is_whitespace() || ch == ';' {
            self.finish_malformed_number();
            Step::Reexamine
        } else {
            self.buffer.push(ch);
            Step::Consume(1)
        }
    }

    fn scan_line_comment(&mut self, ch: char) -> Step {
        if ch == '\n' {
            self.mode = ScanMode::Normal;
        }
        Step::Consume(1)
    }

    fn scan_block_comment(&mut self) -> Step {
        if self.source_matches(self.cursor, "**#") {
            self.mode = ScanMode::Normal;
            Step::Consume(3)
        } else {
            Step::Consume(1)
        }
    }

    fn finish_word(&mut self) {
        let word = std::mem::take(&mut self.buffer);
        self.mode = ScanMode::Normal;

        if self.lexicon.is_keyword(&word) {
            if self.lexicon.requires_call_parens(&word) {
                self.check_call_parens(&word);
            }
            self.emit(TokenKind::Keyword, &word);
        } else {
            self.emit(TokenKind::Identifier, &word);
        }
    }

    // Looks ahead from the cursor without consuming anything. The search for `)` runs even when
    // `(` is missing, so `shout x;` reports both problems.
    fn check_call_parens(&mut self, keyword: &str) {
        let mut pos = self.cursor;
        while self.source.get(pos) == Some(&' ') {
            pos += 1;
        }

        if self.source.get(pos) != Some(&'(') {
            self.report(DiagnosticKind::MissingCallParens(keyword.to_string()));
        }

        let closer = self.source[pos..]
            .iter()
            .find(|&&ch| ch == ')' || ch == ';')
            .copied();

        if closer != Some(')') {
            self.report(DiagnosticKind::UnclosedCallParens(keyword.to_string()));
        }
    }

    fn finish_integer(&mut self) {
        let lexeme = std::mem::take(&mut self.buffer);
        self.mode = ScanMode::Normal;
        self.emit(TokenKind::Number, &lexeme);
    }

    fn finish_float(&mut self) {
        let lexeme = std::mem::take(&mut self.buffer);
        self.mode = ScanMode::Normal;

        if is_float_literal(&lexeme) {
            self.emit(TokenKind::Float, &lexeme);
        } else {
            self.report(DiagnosticKind::InvalidFloat(lexeme));
        }
    }

    fn finish_malformed_number(&mut self) {
        let lexeme = std::mem::take(&mut self.buffer);
        self.mode = ScanMode::Normal;
        self.report(DiagnosticKind::InvalidNumber(lexeme));
    }

    // Flush whatever lexeme is still open at the end of the input
    fn finish(&mut self) {
        match self.mode {
            ScanMode::Identifier => self.finish_word(),
            ScanMode::Integer => self.finish_integer(),
            ScanMode::Float => self.finish_float(),
            ScanMode::MalformedNumber => self.finish_malformed_number(),
            ScanMode::BlockComment { opened_at } => {
                self.diagnostics
                    .push(Diagnostic::new(DiagnosticKind::UnterminatedComment, opened_at));
                self.mode = ScanMode::Normal;
            }
            ScanMode::Normal | ScanMode::LineComment => self.mode = ScanMode::Normal,
        }
    }
}

/// Scan the source text into tokens. Comments, whitespace and brackets produce no tokens.
/// Malformed lexemes are reported as diagnostics and dropped, and scanning carries on after them.
pub fn tokenize(source: &str, lexicon: &Lexicon) -> ScanOutput {
    Scanner::new(source, lexicon).run()
}

#[cfg(test)]
mod scanner_tests {
    use super::*;
    use crate::diagnostic::Category;
    use pretty_assertions::assert_eq;

    fn scan(source: &str) -> ScanOutput {
        tokenize(source, &Lexicon::aa())
    }

    fn token(kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme)
    }

    fn kinds(output: &ScanOutput) -> Vec<DiagnosticKind> {
        output
            .diagnostics
            .iter()
            .map(|d| d.get_kind().clone())
            .collect()
    }

    #[test]
    fn test_grab_and_shout() {
        let output = scan("{ grab x; shout(x); }");

        assert_eq!(
            output.tokens,
            vec![
                token(TokenKind::Keyword, "grab"),
                token(TokenKind::Identifier, "x"),
                token(TokenKind::Semicolon, ";"),
                token(TokenKind::Keyword, "shout"),
                token(TokenKind::Identifier, "x"),
                token(TokenKind::Semicolon, ";"),
            ]
        );
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_float_assignment() {
        let output = scan("{ numba a = 3.14; }");

        assert_eq!(
            output.tokens,
            vec![
                token(TokenKind::Keyword, "numba"),
                token(TokenKind::Identifier, "a"),
                token(TokenKind::AssignOp, "="),
                token(TokenKind::Float, "3.14"),
                token(TokenKind::Semicolon, ";"),
            ]
        );
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_invalid_float() {
        let output = scan("{ numba a = 3.1.4; }");

        assert_eq!(
            kinds(&output),
            vec![DiagnosticKind::InvalidFloat("3.1.4".to_string())]
        );
        assert!(output
            .tokens
            .iter()
            .all(|t| t.get_kind() != TokenKind::Float));
        assert_eq!(output.tokens.len(), 4);
    }

    #[test]
    fn test_float_without_fraction() {
        let output = scan("{ floatie f = 3.; }");
        assert_eq!(
            kinds(&output),
            vec![DiagnosticKind::InvalidFloat("3.".to_string())]
        );
    }

    #[test]
    fn test_shout_without_parentheses() {
        let output = scan("{\n  shout x;\n}");

        assert_eq!(
            kinds(&output),
            vec![
                DiagnosticKind::MissingCallParens("shout".to_string()),
                DiagnosticKind::UnclosedCallParens("shout".to_string()),
            ]
        );
        assert_eq!(output.diagnostics[0].get_line(), 2);
        assert_eq!(output.diagnostics[1].get_line(), 2);
        assert_eq!(output.diagnostics[0].category(), Category::LanguageRule);
        // The keyword is still emitted
        assert_eq!(output.tokens[0], token(TokenKind::Keyword, "shout"));
    }

    #[test]
    fn test_shout_spaces_before_parentheses() {
        let output = scan("{ shout   (x); }");
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_shout_unclosed_parentheses() {
        let output = scan("{ shout(x; }");
        assert_eq!(
            kinds(&output),
            vec![DiagnosticKind::UnclosedCallParens("shout".to_string())]
        );

        let output = scan("{ shout(x");
        assert_eq!(
            kinds(&output),
            vec![DiagnosticKind::UnclosedCallParens("shout".to_string())]
        );
    }

    #[test]
    fn test_shout_at_end_of_input() {
        let output = scan("shout");
        assert_eq!(
            kinds(&output),
            vec![
                DiagnosticKind::MissingCallParens("shout".to_string()),
                DiagnosticKind::UnclosedCallParens("shout".to_string()),
            ]
        );
    }

    #[test]
    fn test_shout_missing_opening_but_closed() {
        // A `)` before the `;` only leaves the missing `(` to report
        let output = scan("{ shout x); }");
        assert_eq!(
            kinds(&output),
            vec![DiagnosticKind::MissingCallParens("shout".to_string())]
        );
    }

    #[test]
    fn test_invalid_identifier_stops_at_tab() {
        let output = scan("{ numba Abc\t= 4; }");
        assert_eq!(
            kinds(&output),
            vec![DiagnosticKind::InvalidIdentifier("Abc".to_string())]
        );
        assert_eq!(output.tokens[1], token(TokenKind::AssignOp, "="));
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let output = scan("{ shoutx = grab_1; }");
        assert_eq!(
            output.tokens,
            vec![
                token(TokenKind::Identifier, "shoutx"),
                token(TokenKind::AssignOp, "="),
                token(TokenKind::Identifier, "grab_1"),
                token(TokenKind::Semicolon, ";"),
            ]
        );
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_terminator_is_reexamined() {
        let output = scan("x=1+y;");
        assert_eq!(
            output.tokens,
            vec![
                token(TokenKind::Identifier, "x"),
                token(TokenKind::AssignOp, "="),
                token(TokenKind::Number, "1"),
                token(TokenKind::ArithOp, "+"),
                token(TokenKind::Identifier, "y"),
                token(TokenKind::Semicolon, ";"),
            ]
        );
    }

    #[test]
    fn test_arithmetic_operators() {
        let output = scan("{ numba t = a + 4 * b % 2 - c / d; }");
        let operators: Vec<&str> = output
            .tokens
            .iter()
            .filter(|t| t.get_kind() == TokenKind::ArithOp)
            .map(|t| t.get_lexeme().as_str())
            .collect();

        assert_eq!(operators, vec!["+", "*", "%", "-", "/"]);
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_power() {
        let output = scan("{ numba p = 2^10; }");
        assert_eq!(
            output.tokens[3..].to_vec(),
            vec![
                token(TokenKind::Number, "2"),
                token(TokenKind::Power, "^"),
                token(TokenKind::Number, "10"),
                token(TokenKind::Semicolon, ";"),
            ]
        );
    }

    #[test]
    fn test_malformed_number_is_dropped() {
        let output = scan("{ numba x = 12ab; }");
        assert_eq!(
            kinds(&output),
            vec![DiagnosticKind::InvalidNumber("12ab".to_string())]
        );
        assert_eq!(
            output.tokens,
            vec![
                token(TokenKind::Keyword, "numba"),
                token(TokenKind::Identifier, "x"),
                token(TokenKind::AssignOp, "="),
                token(TokenKind::Semicolon, ";"),
            ]
        );
    }

    #[test]
    fn test_strings() {
        let output = scan("{ chary c = \"hi there ~ #**\"; }");
        assert_eq!(output.tokens[3], token(TokenKind::String, "hi there ~ #**"));
        assert_eq!(output.tokens[4], token(TokenKind::Semicolon, ";"));
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_unterminated_string() {
        let output = scan("{ chary c = \"oops; }");
        assert_eq!(kinds(&output), vec![DiagnosticKind::UnterminatedString]);
        assert!(output
            .tokens
            .iter()
            .all(|t| t.get_kind() != TokenKind::String));
    }

    #[test]
    fn test_comments_produce_no_tokens() {
        let output = scan("{ ~ grab x;\n numba #** shout ** y **# a; }");
        assert_eq!(
            output.tokens,
            vec![
                token(TokenKind::Keyword, "numba"),
                token(TokenKind::Identifier, "a"),
                token(TokenKind::Semicolon, ";"),
            ]
        );
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_unterminated_block_comment() {
        let output = scan("{ grab x;\n#** never closed\n");
        assert_eq!(kinds(&output), vec![DiagnosticKind::UnterminatedComment]);
        assert_eq!(output.diagnostics[0].get_line(), 2);
    }

    #[test]
    fn test_invalid_identifier() {
        let output = scan("{ numba Abc = 4; }");
        assert_eq!(
            kinds(&output),
            vec![DiagnosticKind::InvalidIdentifier("Abc".to_string())]
        );
        assert_eq!(
            output.diagnostics[0].to_string(),
            "Invalid identifier: starts with invalid character at line 1 = Abc"
        );
        assert_eq!(output.tokens.len(), 4);
    }

    #[test]
    fn test_unexpected_character() {
        let output = scan("{ grab x; \u{7} }");
        assert_eq!(
            kinds(&output),
            vec![DiagnosticKind::UnexpectedCharacter('\u{7}')]
        );
    }

    #[test]
    fn test_lines_counted_in_every_mode() {
        let output = scan("{\n#** a\nb **#\n\"x\ny\"\n Bad\n}");
        assert_eq!(
            kinds(&output),
            vec![DiagnosticKind::InvalidIdentifier("Bad".to_string())]
        );
        assert_eq!(output.diagnostics[0].get_line(), 6);
    }

    #[test]
    fn test_pending_lexeme_flushed() {
        let output = scan("grab x = 42");
        assert_eq!(
            output.tokens,
            vec![
                token(TokenKind::Keyword, "grab"),
                token(TokenKind::Identifier, "x"),
                token(TokenKind::AssignOp, "="),
                token(TokenKind::Number, "42"),
            ]
        );
    }

    #[test]
    fn test_token_display() {
        assert_eq!(
            token(TokenKind::ArithOp, "+").to_string(),
            "ARITH_OP : +"
        );
    }

    #[test]
    fn test_float_literal_check() {
        assert!(is_float_literal("3.14"));
        assert!(is_float_literal("0.0"));
        assert!(!is_float_literal("3.1.4"));
        assert!(!is_float_literal(".5"));
        assert!(!is_float_literal("3.1a"));
        assert!(!is_float_literal("314"));
    }
}
