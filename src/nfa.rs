/* The grammar automaton as written by the grammar author. A state holds at most one target per
 * label, nondeterminism only shows up once sets of states are grouped by subset construction. */

use bitvec::prelude::*;
use std::collections::{HashMap, VecDeque};

use crate::fa::{AutomatonError, FA};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NFAState {
    id: usize,
    transitions: HashMap<String, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct NFA {
    states: Vec<NFAState>,
    start_state: usize,
    accept_states: BitVec<u8>,
}

impl FA for NFA {
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
}

impl NFAState {
    fn new(id: usize) -> Self {
        NFAState {
            id,
            transitions: HashMap::new(),
        }
    }

    pub fn get_id(&self) -> usize {
        self.id
    }

    pub fn get_transitions(&self) -> &HashMap<String, usize> {
        &self.transitions
    }

    pub fn get_transition(&self, label: &str) -> Option<usize> {
        self.transitions.get(label).copied()
    }
}

impl NFA {
    pub fn new() -> Self {
        NFA::default()
    }

    /// Add a fresh non accepting state and return its id
    pub fn add_state(&mut self) -> usize {
        let state_id = self.states.len();
        self.states.push(NFAState::new(state_id));
        self.accept_states.push(false);
        state_id
    }

    fn check_state(&self, state_id: usize) -> Result<(), AutomatonError> {
        if state_id < self.states.len() {
            Ok(())
        } else {
            Err(AutomatonError::InvalidState(state_id))
        }
    }

    /// Add a transition on `label`. An existing transition on the same label from the same state
    /// is replaced.
    pub fn add_transition(
        &mut self,
        from: usize,
        label: &str,
        to: usize,
    ) -> Result<(), AutomatonError> {
        self.check_state(from)?;
        if to >= self.states.len() {
            return Err(AutomatonError::DanglingTransition {
                from,
                label: label.to_string(),
                to,
            });
        }

        self.states[from].transitions.insert(label.to_string(), to);
        Ok(())
    }

    pub fn set_accept_state(&mut self, state_id: usize) -> Result<(), AutomatonError> {
        self.check_state(state_id)?;
        self.accept_states.set(state_id, true);
        Ok(())
    }

    pub fn set_start_state(&mut self, state_id: usize) -> Result<(), AutomatonError> {
        self.check_state(state_id)?;
        self.start_state = state_id;
        Ok(())
    }

    pub fn get_state(&self, id: usize) -> Option<&NFAState> {
        self.states.get(id)
    }

    pub fn get_states(&self) -> &[NFAState] {
        &self.states
    }

    /// Breadth first walk from the start state. Targets outside the state set are ignored.
    pub fn reachable_states(&self) -> BitVec<u8> {
        let num_states = self.states.len();
        let mut visited: BitVec<u8> = BitVec::repeat(false, num_states);

        if self.start_state >= num_states {
            return visited;
        }

        let mut queue: VecDeque<usize> = VecDeque::new();
        visited.set(self.start_state, true);
        queue.push_back(self.start_state);

        while let Some(state_id) = queue.pop_front() {
            for &target in self.states[state_id].transitions.values() {
                if target < num_states && !visited[target] {
                    visited.set(target, true);
                    queue.push_back(target);
                }
            }
        }

        visited
    }

    /// Check that the start state exists, that no transition leaves the state set and that
    /// every state is reachable from the start state.
    pub fn validate(&self) -> Result<(), AutomatonError> {
        let num_states = self.states.len();
        self.check_state(self.start_state)?;

        for (from, label, to) in self.get_transition_triples() {
            if to >= num_states {
                return Err(AutomatonError::DanglingTransition { from, label, to });
            }
        }

        match self.reachable_states().iter_zeros().next() {
            Some(unreachable) => Err(AutomatonError::UnreachableState(unreachable)),
            None => Ok(()),
        }
    }
}
