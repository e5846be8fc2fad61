/* Bracket validation over the whole source text. Each bracket kind has its own stack, so a
 * closing bracket only ever matches the most recent unmatched opening bracket of its own kind. */

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BracketKind {
    Curly,
    Round,
    Square,
}

impl BracketKind {
    fn classify(ch: char) -> Option<(BracketKind, bool)> {
        match ch {
            '{' => Some((BracketKind::Curly, true)),
            '}' => Some((BracketKind::Curly, false)),
            '(' => Some((BracketKind::Round, true)),
            ')' => Some((BracketKind::Round, false)),
            '[' => Some((BracketKind::Square, true)),
            ']' => Some((BracketKind::Square, false)),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn opening(self) -> char {
        match self {
            BracketKind::Curly => '{',
            BracketKind::Round => '(',
            BracketKind::Square => '[',
        }
    }
}

/// Where an opening bracket was seen
#[derive(Debug, Clone, Copy)]
struct OpenBracket {
    position: usize,
    line: usize,
}

/// Check bracket balance for `{}`, `()` and `[]` independently and check that the trimmed source
/// is wrapped in `{` ... `}`. Returns the diagnostics in the order they were found, followed by
/// the unmatched opening brackets of each kind (most recently opened first).
pub fn validate_brackets(source: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut stacks: [Vec<OpenBracket>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    let mut line = 1;

    for (position, ch) in source.chars().enumerate() {
        if ch == '\n' {
            line += 1;
            continue;
        }

        let (kind, is_opening) = match BracketKind::classify(ch) {
            None => continue,
            Some(bracket) => bracket,
        };

        let stack = &mut stacks[kind.index()];

        if is_opening {
            stack.push(OpenBracket { position, line });
        } else if stack.pop().is_none() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnmatchedClosing {
                    bracket: ch,
                    position,
                },
                line,
            ));
        }
    }

    for kind in [BracketKind::Curly, BracketKind::Round, BracketKind::Square] {
        let stack = &mut stacks[kind.index()];
        while let Some(open) = stack.pop() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnmatchedOpening {
                    bracket: kind.opening(),
                    position: open.position,
                },
                open.line,
            ));
        }
    }

    if !is_wrapped(source) {
        diagnostics.push(Diagnostic::new(DiagnosticKind::MissingWrapper, 1));
    }

    debug!(count = diagnostics.len(), "bracket validation finished");

    diagnostics
}

/// Whether the source, ignoring surrounding whitespace, starts with `{` and ends with `}`
pub fn is_wrapped(source: &str) -> bool {
    let trimmed = source.trim();
    trimmed.starts_with('{') && trimmed.ends_with('}')
}

#[cfg(test)]
mod brackets_tests {
    use super::*;
    use crate::diagnostic::Category;
    use proptest::prelude::*;

    fn kinds(diagnostics: &[Diagnostic]) -> Vec<DiagnosticKind> {
        diagnostics.iter().map(|d| d.get_kind().clone()).collect()
    }

    #[test]
    fn test_balanced() {
        let diagnostics = validate_brackets("{ shout(x); numba a = [1]; }");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_lone_closing_round() {
        let diagnostics = validate_brackets("{ grab x;) }");
        assert_eq!(
            kinds(&diagnostics),
            vec![DiagnosticKind::UnmatchedClosing {
                bracket: ')',
                position: 9
            }]
        );
    }

    #[test]
    fn test_missing_closing_curly() {
        let diagnostics = validate_brackets("{ grab x; { shout(x); }");
        assert_eq!(
            kinds(&diagnostics),
            vec![DiagnosticKind::UnmatchedOpening {
                bracket: '{',
                position: 0
            }]
        );
    }

    #[test]
    fn test_kinds_are_independent() {
        // Interleaved kinds still balance per kind
        let diagnostics = validate_brackets("{ [(]) }");
        assert!(diagnostics.is_empty());

        // Without the wrapper only the wrapper check fires
        let diagnostics = validate_brackets("{(})");
        assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::MissingWrapper]);
    }

    #[test]
    fn test_unmatched_openings_in_pop_order() {
        let diagnostics = validate_brackets("{ ( ( [ }");
        assert_eq!(
            kinds(&diagnostics),
            vec![
                DiagnosticKind::UnmatchedOpening {
                    bracket: '(',
                    position: 4
                },
                DiagnosticKind::UnmatchedOpening {
                    bracket: '(',
                    position: 2
                },
                DiagnosticKind::UnmatchedOpening {
                    bracket: '[',
                    position: 6
                },
            ]
        );
    }

    #[test]
    fn test_validation_continues_after_error() {
        let diagnostics = validate_brackets("{ ] ] ) }");
        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics
            .iter()
            .all(|d| matches!(d.get_kind(), DiagnosticKind::UnmatchedClosing { .. })));
    }

    #[test]
    fn test_line_numbers() {
        let diagnostics = validate_brackets("{\n grab x;\n )\n}");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].get_line(), 3);
    }

    #[test]
    fn test_wrapper() {
        assert!(is_wrapped("  \n{ grab x; }\n"));
        assert!(!is_wrapped("grab x;"));

        let diagnostics = validate_brackets("grab x;");
        assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::MissingWrapper]);
        assert_eq!(diagnostics[0].category(), Category::Structural);
    }

    fn expected_imbalance(source: &str, open: char, close: char) -> (usize, usize) {
        let mut depth = 0usize;
        let mut unmatched_closing = 0;
        for ch in source.chars() {
            if ch == open {
                depth += 1;
            } else if ch == close {
                if depth == 0 {
                    unmatched_closing += 1;
                } else {
                    depth -= 1;
                }
            }
        }
        (unmatched_closing, depth)
    }

    proptest! {
        #[test]
        fn prop_diagnostics_match_imbalance(source in "[{}()\\[\\] a;]{0,40}") {
            let diagnostics = validate_brackets(&source);

            for (open, close) in [('{', '}'), ('(', ')'), ('[', ']')] {
                let (closing, opening) = expected_imbalance(&source, open, close);

                let found_closing = diagnostics.iter().filter(|d| matches!(
                    d.get_kind(),
                    DiagnosticKind::UnmatchedClosing { bracket, .. } if *bracket == close
                )).count();
                let found_opening = diagnostics.iter().filter(|d| matches!(
                    d.get_kind(),
                    DiagnosticKind::UnmatchedOpening { bracket, .. } if *bracket == open
                )).count();

                prop_assert_eq!(found_closing, closing);
                prop_assert_eq!(found_opening, opening);
            }
        }
    }
}
