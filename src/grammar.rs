/* Grammar automata. The built in grammar describes a tiny .aa program: a braced block holding
 * one grab, shout, numba or chary statement. Other grammars can be loaded from JSON files. */

use crate::fa::{AutomatonError, FA};
use crate::nfa::NFA;
use color_eyre::eyre::{Report, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use tracing::info;

const SAMPLE_NUM_STATES: usize = 16;

const SAMPLE_ACCEPTING: [usize; 1] = [15];

const SAMPLE_TRANSITIONS: [(usize, &str, usize); 22] = [
    (0, "{", 1),
    (1, "grab", 2),
    (2, "identifier", 3),
    (3, ";", 4),
    (1, "shout", 5),
    (5, "identifier", 6),
    (6, ";", 7),
    (1, "numba", 8),
    (8, "=", 9),
    (9, "number", 10),
    (1, "chary", 11),
    (11, "=", 12),
    (12, "char", 13),
    // Arithmetic loops back to the value state
    (10, "+", 14),
    (10, "-", 14),
    (10, "*", 14),
    (10, "/", 14),
    (14, "number", 10),
    (4, "}", 15),
    (7, "}", 15),
    (10, "}", 15),
    (13, "}", 15),
];

/// On disk form of a grammar automaton
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarFile {
    pub num_states: usize,
    pub start: usize,
    pub accepting: Vec<usize>,
    pub transitions: Vec<(usize, String, usize)>,
}

impl GrammarFile {
    pub fn from_nfa(nfa: &NFA) -> Self {
        GrammarFile {
            num_states: nfa.get_num_states(),
            start: nfa.get_start_state(),
            accepting: nfa.get_acceptor_states().iter_ones().collect(),
            transitions: nfa.get_transition_triples(),
        }
    }

    pub fn build_nfa(&self) -> Result<NFA, AutomatonError> {
        let mut nfa = NFA::new();

        for _ in 0..self.num_states {
            nfa.add_state();
        }

        for (from, label, to) in &self.transitions {
            nfa.add_transition(*from, label, *to)?;
        }

        for &accept in &self.accepting {
            nfa.set_accept_state(accept)?;
        }

        nfa.set_start_state(self.start)?;
        Ok(nfa)
    }
}

/// The grammar NFA of the .aa toy language
pub fn sample_grammar() -> Result<NFA, AutomatonError> {
    let grammar = GrammarFile {
        num_states: SAMPLE_NUM_STATES,
        start: 0,
        accepting: SAMPLE_ACCEPTING.to_vec(),
        transitions: SAMPLE_TRANSITIONS
            .iter()
            .map(|&(from, label, to)| (from, label.to_string(), to))
            .collect(),
    };

    grammar.build_nfa()
}

/// Load a grammar NFA from a JSON file
pub fn load_grammar(file_name: &Path) -> Result<NFA> {
    let file = File::open(file_name)?;
    let buf_reader = BufReader::new(file);

    let grammar: GrammarFile = serde_json::from_reader(buf_reader)?;

    let nfa = grammar.build_nfa().map_err(Report::new)?;
    info!(file = %file_name.display(), states = nfa.get_num_states(), "grammar loaded");
    Ok(nfa)
}

/// Save a grammar NFA as a JSON file
pub fn save_grammar(nfa: &NFA, file_name: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(&GrammarFile::from_nfa(nfa))?;

    let mut file = File::create(file_name)?;

    writeln!(file, "{}", json_string)?;
    Ok(())
}

#[cfg(test)]
mod grammar_tests {
    use super::*;

    #[test]
    fn test_sample_grammar() {
        let nfa = sample_grammar().unwrap();

        assert_eq!(nfa.get_num_states(), 16);
        assert_eq!(nfa.get_start_state(), 0);
        assert_eq!(nfa.get_transition_triples().len(), 22);
        assert!(nfa.is_accepting(15));
        assert!(nfa.validate().is_ok());

        let alphabet: Vec<&str> = nfa.get_alphabet().into_iter().collect();
        assert_eq!(
            alphabet,
            vec![
                "*", "+", "-", "/", ";", "=", "char", "chary", "grab", "identifier", "numba",
                "number", "shout", "{", "}"
            ]
        );
    }

    #[test]
    fn test_grammar_file_json() {
        let json = r#"{
            "num_states": 3,
            "start": 0,
            "accepting": [2],
            "transitions": [[0, "{", 1], [1, "}", 2]]
        }"#;

        let grammar: GrammarFile = serde_json::from_str(json).unwrap();
        let nfa = grammar.build_nfa().unwrap();

        assert_eq!(nfa.get_num_states(), 3);
        assert!(nfa.is_accepting(2));
        assert_eq!(GrammarFile::from_nfa(&nfa), grammar);
    }

    #[test]
    fn test_grammar_file_with_dangling_target() {
        let grammar = GrammarFile {
            num_states: 2,
            start: 0,
            accepting: vec![1],
            transitions: vec![(0, "{".to_string(), 5)],
        };

        assert_eq!(
            grammar.build_nfa().unwrap_err(),
            AutomatonError::DanglingTransition {
                from: 0,
                label: "{".to_string(),
                to: 5
            }
        );
    }

    #[test]
    fn test_dot_export() {
        let nfa = sample_grammar().unwrap();
        let dot = nfa.to_dot();

        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("Start"));
        assert!(dot.contains("Accept"));
        assert!(dot.contains("*, +, -, /"));
    }
}
