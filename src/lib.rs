//! # aalex
//!
//! A lexical analyser for the `.aa` teaching language together with the automata theory
//! behind it.
//!
//! This library provides functionality to:
//! - Validate `{}`, `()` and `[]` balance over a whole source text
//! - Scan `.aa` source into keyword, identifier, number, float, string and operator tokens,
//!   collecting diagnostics instead of stopping at the first error
//! - Model the language grammar as an NFA over grammar terminals
//! - Convert NFAs to DFAs using Subset Construction
//! - Minimize DFAs by partition refinement
//! - Export and visualize the automata

// Re-export the modules
pub mod analysis;
pub mod brackets;
pub mod dfa;
pub mod diagnostic;
pub mod fa;
pub mod grammar;
pub mod language;
pub mod nfa;
pub mod scanner;
pub mod visualizer;

// Re-export commonly used functions for convenience
pub use analysis::analyze_source;
pub use brackets::validate_brackets;
pub use dfa::{construct_dfa, construct_minimal_dfa};
pub use grammar::{load_grammar, sample_grammar, save_grammar};
pub use language::Lexicon;
pub use scanner::tokenize;
pub use visualizer::visualize;
