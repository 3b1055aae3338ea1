//! Selector Automaton Engine: the nondeterministic tree-walking automata of
//! §3/§4.2–§4.4. States are opaque arena handles (§9: "allocate states from
//! an arena with integer handles"), the same shape the teacher uses for its
//! DOM node arena (`usize` ids into a `HashMap` in `dom/document.rs`).

pub mod build;
pub mod normalize;
pub mod product;

use crate::selector::compound::Compound;

pub type StateId = u32;

/// The step kind on a transition (§3's "Arrow").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrow {
    /// Move to the parent.
    Child,
    /// Stay at the current node and refine its node-test.
    Noop,
    /// Move to the immediately preceding sibling.
    Neighbour,
    /// Move to any earlier sibling.
    Sibling,
}

/// The node-test on a transition. `Any` is the wildcard `*` used for the
/// "skip an arbitrary ancestor/sibling" loops in §4.2's build recipes.
#[derive(Debug, Clone)]
pub enum NodeTest {
    Any,
    Compound(Compound),
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub src: StateId,
    pub arrow: Arrow,
    pub test: NodeTest,
    pub dst: StateId,
}

/// A 5-tuple `(Q, q_init, q_final, δ)` (§3); `Q` is implicit as
/// `0..num_states`.
#[derive(Debug, Clone)]
pub struct Automaton {
    pub num_states: u32,
    pub q_init: StateId,
    pub q_final: StateId,
    pub transitions: Vec<Transition>,
}

impl Automaton {
    fn empty_shell() -> Self {
        Automaton { num_states: 0, q_init: 0, q_final: 0, transitions: Vec::new() }
    }

    fn fresh_state(&mut self) -> StateId {
        let id = self.num_states;
        self.num_states += 1;
        id
    }

    fn add_transition(&mut self, src: StateId, arrow: Arrow, test: NodeTest, dst: StateId) {
        self.transitions.push(Transition { src, arrow, test, dst });
    }

    pub fn transitions_from(&self, state: StateId) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |t| t.src == state)
    }

    /// Drops states unreachable from `q_init` or unable to reach `q_final`
    /// (§4.3's "prune states unreachable from the initial state", §4.4's
    /// "re-prune unreachable states"), renumbering the survivors densely.
    pub fn prune_unreachable(&self) -> Automaton {
        let forward = reachable_from(self, self.q_init, true);
        let backward = reachable_from(self, self.q_final, false);

        let keep: Vec<StateId> = (0..self.num_states)
            .filter(|s| forward.contains(s) && backward.contains(s))
            .collect();

        // Degenerate automata (q_init unreachable to q_final, etc.) still
        // need a well-formed shell so callers can detect "always rejects"
        // by `transitions.is_empty()` rather than panicking on renumbering.
        if !keep.contains(&self.q_init) || !keep.contains(&self.q_final) {
            let mut shell = Automaton::empty_shell();
            shell.q_init = shell.fresh_state();
            shell.q_final = shell.fresh_state();
            return shell;
        }

        let mut remap = std::collections::HashMap::new();
        for (new_id, &old_id) in keep.iter().enumerate() {
            remap.insert(old_id, new_id as StateId);
        }

        let transitions = self
            .transitions
            .iter()
            .filter(|t| remap.contains_key(&t.src) && remap.contains_key(&t.dst))
            .map(|t| Transition {
                src: remap[&t.src],
                arrow: t.arrow,
                test: t.test.clone(),
                dst: remap[&t.dst],
            })
            .collect();

        Automaton {
            num_states: keep.len() as u32,
            q_init: remap[&self.q_init],
            q_final: remap[&self.q_final],
            transitions,
        }
    }
}

/// BFS over the transition relation, forward (`src -> dst`) or backward
/// (`dst -> src`), from `start`.
fn reachable_from(aut: &Automaton, start: StateId, forward: bool) -> std::collections::HashSet<StateId> {
    use std::collections::{HashSet, VecDeque};
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);
    while let Some(state) = queue.pop_front() {
        for t in &aut.transitions {
            let next = if forward {
                (t.src == state).then_some(t.dst)
            } else {
                (t.dst == state).then_some(t.src)
            };
            if let Some(next) = next {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }
    seen
}
