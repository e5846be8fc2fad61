use crate::brackets::validate_brackets;
use crate::language::Lexicon;
use crate::scanner::{tokenize, ScanOutput};

/// Run the bracket validator and the scanner over one source text. Bracket diagnostics come
/// first, followed by the scanner's.
pub fn analyze_source(source: &str, lexicon: &Lexicon) -> ScanOutput {
    let mut diagnostics = validate_brackets(source);
    let mut output = tokenize(source, lexicon);

    diagnostics.append(&mut output.diagnostics);
    output.diagnostics = diagnostics;
    output
}
