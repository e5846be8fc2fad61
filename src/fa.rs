use bitvec::prelude::BitVec;
use color_eyre::eyre::Result;
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tracing::{info, warn};

/// List of possible errors while building or converting an automaton
#[derive(Debug, PartialEq, Eq)]
pub enum AutomatonError {
    /// The state id is not part of the automaton
    InvalidState(usize),
    /// A transition leads to a state outside the automaton's state set
    DanglingTransition {
        from: usize,
        label: String,
        to: usize,
    },
    /// The state cannot be reached from the start state
    UnreachableState(usize),
}

impl fmt::Display for AutomatonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutomatonError::InvalidState(id) => {
                write!(f, "Error: State {} does not exist in the automaton!", id)
            }
            AutomatonError::DanglingTransition { from, label, to } => write!(
                f,
                "Error: Transition {} --{}--> {} leads outside the automaton!",
                from, label, to
            ),
            AutomatonError::UnreachableState(id) => {
                write!(f, "Error: State {} is not reachable from the start state!", id)
            }
        }
    }
}

impl std::error::Error for AutomatonError {}

/// A labeled transition graph. Labels are grammar terminals such as `"{"`, `"identifier"` or
/// a keyword, not single characters.
pub trait FA {
    fn get_num_states(&self) -> usize;
    fn get_start_state(&self) -> usize;
    fn get_acceptor_states(&self) -> &BitVec<u8>;
    fn get_state_transitions(&self, state_id: usize) -> Vec<(&String, &usize)>;

    fn state_label(&self, state_id: usize) -> String {
        format!("State {}", state_id)
    }

    fn is_accepting(&self, state_id: usize) -> bool {
        self.get_acceptor_states()
            .get(state_id)
            .map(|bit| *bit)
            .unwrap_or(false)
    }

    /// All labels used on any transition
    fn get_alphabet(&self) -> BTreeSet<&str> {
        (0..self.get_num_states())
            .flat_map(|state_id| self.get_state_transitions(state_id))
            .map(|(label, _)| label.as_str())
            .collect()
    }

    /// Every transition as a (state, label, target) triple, sorted
    fn get_transition_triples(&self) -> Vec<(usize, String, usize)> {
        let mut triples: Vec<(usize, String, usize)> = (0..self.get_num_states())
            .flat_map(|state_id| {
                self.get_state_transitions(state_id)
                    .into_iter()
                    .map(move |(label, target)| (state_id, label.clone(), *target))
            })
            .collect();
        triples.sort();
        triples
    }

    /// Render the automaton in Graphviz dot format. Parallel edges share one edge with their
    /// labels joined.
    fn to_dot(&self) -> String {
        let mut graph: DiGraph<String, String> = DiGraph::new();
        let num_states = self.get_num_states();

        let nodes: Vec<NodeIndex> = (0..num_states)
            .map(|state_id| {
                let mut label = self.state_label(state_id);
                if self.is_accepting(state_id) {
                    label = format!("Accept\n{}", label);
                }
                if state_id == self.get_start_state() {
                    label = format!("Start\n{}", label);
                }
                graph.add_node(label)
            })
            .collect();

        let mut edges: BTreeMap<(usize, usize), Vec<String>> = BTreeMap::new();
        for (from, label, to) in self.get_transition_triples() {
            edges.entry((from, to)).or_default().push(label);
        }

        for ((from, to), labels) in edges {
            if to < num_states {
                graph.add_edge(nodes[from], nodes[to], labels.join(", "));
            }
        }

        Dot::new(&graph).to_string()
    }

    /// Write the automaton to `<filename>.dot` and render `<filename>.jpg` with Graphviz when it
    /// is installed. Returns the path of the file produced last.
    fn show_fa(&self, filename: &str) -> Result<PathBuf> {
        let dot_filename = format!("{}.dot", filename);
        let mut dot_file = File::create(&dot_filename)?;
        dot_file.write_all(self.to_dot().as_bytes())?;

        let image_filename = format!("{}.jpg", filename);

        match Command::new("dot")
            .args(["-Tjpg", &dot_filename, "-o", &image_filename])
            .output()
        {
            Ok(output) if output.status.success() => {
                info!(file = %image_filename, "automaton visualization saved");
                Ok(PathBuf::from(image_filename))
            }
            Ok(output) => {
                warn!(status = %output.status, file = %dot_filename, "graphviz failed, kept dot file");
                Ok(PathBuf::from(dot_filename))
            }
            Err(err) => {
                warn!(%err, file = %dot_filename, "graphviz is not available, kept dot file");
                Ok(PathBuf::from(dot_filename))
            }
        }
    }
}
