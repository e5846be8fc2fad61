/* Perform subset construction to convert the grammar NFA into a DFA
 * Refine the DFA's states into equivalence classes to get the minimal DFA */

use crate::fa::{AutomatonError, FA};
use crate::nfa::NFA;
use bitvec::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::hash::{DefaultHasher, Hash, Hasher};
use tracing::debug;

/// A struct which is a bitvec and its hash stored together to ease fetching the hash of the bitvec
/// quickly instead of calculating it each time. Two sets are the same key iff they hold the same
/// NFA states.
#[derive(Clone)]
struct HashedBitVec {
    bv: BitVec<u8>,
    hash: u64,
}

impl HashedBitVec {
    fn new(bv: BitVec<u8>) -> Self {
        let mut hasher = DefaultHasher::new();
        bv.hash(&mut hasher);
        let hash = hasher.finish();
        Self { bv, hash }
    }
}

impl Hash for HashedBitVec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialEq for HashedBitVec {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.bv == other.bv
    }
}

impl Eq for HashedBitVec {}

#[derive(Debug, Clone)]
pub struct DFAState {
    transitions: HashMap<String, usize>,
    nfa_states: BitVec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct DFA {
    states: Vec<DFAState>,
    start_state: usize,
    accept_states: BitVec<u8>,
}

impl FA for DFA {
    fn get_num_states(&self) -> usize {
        self.states.len()
    }

    fn get_start_state(&self) -> usize {
        self.start_state
    }

    fn get_acceptor_states(&self) -> &BitVec<u8> {
        &self.accept_states
    }

    fn get_state_transitions(&self, state_id: usize) -> Vec<(&String, &usize)> {
        match self.states.get(state_id) {
            Some(state) => state.transitions.iter().collect(),
            None => Vec::new(),
        }
    }

    fn state_label(&self, state_id: usize) -> String {
        match self.states.get(state_id) {
            Some(state) => {
                let members: Vec<String> = state
                    .nfa_states
                    .iter_ones()
                    .map(|id| id.to_string())
                    .collect();
                format!("State {} {{{}}}", state_id, members.join(", "))
            }
            None => format!("State {}", state_id),
        }
    }
}

impl DFAState {
    fn new(nfa_states: BitVec<u8>) -> Self {
        DFAState {
            transitions: HashMap::new(),
            nfa_states,
        }
    }
    /// Get a list of all outgoing transitions for the given state
    pub fn get_transitions(&self) -> &HashMap<String, usize> {
        &self.transitions
    }
    /// The ids of the NFA states this DFA state stands for, in ascending order
    pub fn get_nfa_states(&self) -> Vec<usize> {
        self.nfa_states.iter_ones().collect()
    }
}

impl DFA {
    fn new() -> Self {
        DFA::default()
    }

    fn add_state(&mut self, nfa_states: BitVec<u8>, accepting: bool) -> usize {
        let state_id = self.states.len();
        self.states.push(DFAState::new(nfa_states));
        self.accept_states.push(accepting);
        state_id
    }

    /// Returns a reference to the DFA state whose id is provided
    pub fn get_state(&self, id: usize) -> Option<&DFAState> {
        self.states.get(id)
    }
    /// Returns a list of all states present in the DFA
    pub fn get_states(&self) -> &[DFAState] {
        &self.states
    }

    pub fn next_state(&self, state_id: usize, label: &str) -> Option<usize> {
        self.states
            .get(state_id)
            .and_then(|state| state.transitions.get(label))
            .copied()
    }

    /// Run a sequence of terminal labels from the start state and report whether it ends in an
    /// accepting state
    pub fn accepts<S: AsRef<str>>(&self, labels: &[S]) -> bool {
        if self.states.is_empty() {
            return false;
        }

        let mut state = self.start_state;
        for label in labels {
            match self.next_state(state, label.as_ref()) {
                Some(next) => state = next,
                None => return false,
            }
        }

        self.is_accepting(state)
    }
}

// Group every target reachable from the set q by label. Labels come out sorted so the DFA
// numbering only depends on the NFA.
fn delta<'a>(nfa: &'a NFA, q: &HashedBitVec) -> BTreeMap<&'a str, BitVec<u8>> {
    let num_states = nfa.get_num_states();
    let mut moves: BTreeMap<&str, BitVec<u8>> = BTreeMap::new();

    for state_id in q.bv.iter_ones() {
        let nfa_state = match nfa.get_state(state_id) {
            Some(state) => state,
            None => continue,
        };

        for (label, &target) in nfa_state.get_transitions() {
            moves
                .entry(label.as_str())
                .or_insert_with(|| BitVec::repeat(false, num_states))
                .set(target, true);
        }
    }

    moves
}

fn contains_accepting(nfa: &NFA, set: &BitVec<u8>) -> bool {
    set.iter_ones().any(|state_id| nfa.is_accepting(state_id))
}

///  Apply the subset construction algorithm on an NFA to build a DFA. Every DFA state stands
///  for one distinct set of NFA states and accepts iff that set holds an accepting NFA state.
///  The NFA must be well formed: a valid start state, no transition leaving the state set and
///  every state reachable from the start state.
///
///  An `NFA` keeps one target per (state, label), so starting from a singleton set every
///  discovered set is a singleton too. The union in `delta` only merges targets for sets of
///  more than one state.
pub fn construct_dfa(nfa: &NFA) -> Result<DFA, AutomatonError> {
    nfa.validate()?;

    let mut result = DFA::new();
    let num_states = nfa.get_num_states();

    let mut q_list: HashMap<HashedBitVec, usize> = HashMap::new(); // Mapping from nfa state set to DFA state
    let mut work_list: VecDeque<HashedBitVec> = VecDeque::new();

    let mut start_set: BitVec<u8> = BitVec::repeat(false, num_states);
    start_set.set(nfa.get_start_state(), true);

    let q0 = HashedBitVec::new(start_set);
    let d0 = result.add_state(q0.bv.clone(), contains_accepting(nfa, &q0.bv));
    result.start_state = d0;

    q_list.insert(q0.clone(), d0);
    work_list.push_back(q0);

    while let Some(q) = work_list.pop_front() {
        let dq = q_list[&q];

        for (label, end_states) in delta(nfa, &q) {
            let t = HashedBitVec::new(end_states);

            let dt = match q_list.get(&t) {
                Some(&existing) => existing,
                None => {
                    let dt = result.add_state(t.bv.clone(), contains_accepting(nfa, &t.bv));
                    debug!(
                        dfa_state = dt,
                        nfa_states = ?t.bv.iter_ones().collect::<Vec<_>>(),
                        "discovered state set"
                    );
                    q_list.insert(t.clone(), dt);
                    work_list.push_back(t);
                    dt
                }
            };

            result.states[dq].transitions.insert(label.to_string(), dt);
        }
    }

    debug!(
        nfa_states = num_states,
        dfa_states = result.get_num_states(),
        "subset construction finished"
    );

    Ok(result)
}

// Split states into classes until no class holds two states which disagree on where some label
// leads. Missing transitions count as a disagreement. Returns the class of every state.
fn partition_states(dfa: &DFA) -> Vec<usize> {
    let num_states = dfa.states.len();

    let mut classes: Vec<usize> = (0..num_states)
        .map(|state_id| usize::from(dfa.is_accepting(state_id)))
        .collect();
    let mut num_classes = classes.iter().collect::<HashSet<_>>().len();

    loop {
        let mut signatures: HashMap<(usize, Vec<(&str, usize)>), usize> = HashMap::new();
        let mut refined: Vec<usize> = Vec::with_capacity(num_states);

        for (state_id, state) in dfa.states.iter().enumerate() {
            let mut moves: Vec<(&str, usize)> = state
                .transitions
                .iter()
                .map(|(label, &target)| (label.as_str(), classes[target]))
                .collect();
            moves.sort();

            let next_class = signatures.len();
            let class = *signatures
                .entry((classes[state_id], moves))
                .or_insert(next_class);
            refined.push(class);
        }

        let refined_classes = signatures.len();
        classes = refined;

        if refined_classes == num_classes {
            break;
        }
        num_classes = refined_classes;
    }

    classes
}

// Renumber states in depth first order from the start state, following labels in sorted order
fn reorder_dfa(dfa: &DFA) -> DFA {
    let num_states = dfa.states.len();
    let mut reorder_map = vec![usize::MAX; num_states];
    let mut order: Vec<usize> = Vec::with_capacity(num_states);
    let mut stack: Vec<usize> = vec![dfa.start_state];

    while let Some(state_id) = stack.pop() {
        if reorder_map[state_id] != usize::MAX {
            continue;
        }
        reorder_map[state_id] = order.len();
        order.push(state_id);

        let mut transitions: Vec<(&String, &usize)> =
            dfa.states[state_id].transitions.iter().collect();
        transitions.sort();

        for (_, &target) in transitions.into_iter().rev() {
            if reorder_map[target] == usize::MAX {
                stack.push(target);
            }
        }
    }

    // States the walk never reached keep their relative order at the end
    for state_id in 0..num_states {
        if reorder_map[state_id] == usize::MAX {
            reorder_map[state_id] = order.len();
            order.push(state_id);
        }
    }

    let mut result = DFA::new();

    for &old_id in &order {
        result.add_state(
            dfa.states[old_id].nfa_states.clone(),
            dfa.is_accepting(old_id),
        );
    }

    for (new_id, &old_id) in order.iter().enumerate() {
        for (label, &target) in &dfa.states[old_id].transitions {
            result.states[new_id]
                .transitions
                .insert(label.clone(), reorder_map[target]);
        }
    }

    result.start_state = reorder_map[dfa.start_state];
    result
}

/// Merge equivalent states of a DFA. A merged state stands for the union of the NFA state sets
/// of the states merged into it.
pub fn construct_minimal_dfa(dfa: &DFA) -> DFA {
    if dfa.states.is_empty() {
        return DFA::new();
    }

    let classes = partition_states(dfa);
    let num_classes = classes.iter().max().map_or(0, |max| max + 1);
    let subset_width = dfa.states[0].nfa_states.len();

    let mut minimal_dfa = DFA::new();

    for _ in 0..num_classes {
        minimal_dfa.add_state(BitVec::repeat(false, subset_width), false);
    }

    for (state_id, state) in dfa.states.iter().enumerate() {
        let class = classes[state_id];

        for nfa_state in state.nfa_states.iter_ones() {
            minimal_dfa.states[class].nfa_states.set(nfa_state, true);
        }

        if dfa.is_accepting(state_id) {
            minimal_dfa.accept_states.set(class, true);
        }

        // Every member of a class agrees on the target class of each label
        for (label, &target) in &state.transitions {
            minimal_dfa.states[class]
                .transitions
                .insert(label.clone(), classes[target]);
        }
    }

    minimal_dfa.start_state = classes[dfa.start_state];

    debug!(
        dfa_states = dfa.get_num_states(),
        minimal_states = num_classes,
        "minimization finished"
    );

    reorder_dfa(&minimal_dfa)
}
