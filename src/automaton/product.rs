//! Automaton Product (§4.3): the classical synchronized-move product of two
//! automata, used by the Overlap Primitive to ask "is there a tree position
//! both automata accept simultaneously".

use super::{Automaton, NodeTest, StateId};
use crate::normalize::conjoin_element_tests;
use crate::selector::compound::Compound;

/// Builds `a × b`: a transition fires only when both sides have a transition
/// with the same `Arrow` out of their respective current states, and the two
/// node-tests are jointly satisfiable (§4.3's "element/namespace conjunction,
/// or the pair of states is dropped if they can never agree").
///
/// Unreachable states are pruned from the result before returning, matching
/// §4.3's explicit instruction to prune the product before running the
/// Automaton Normalizer over it.
pub fn product(a: &Automaton, b: &Automaton) -> Automaton {
    let mut out = Automaton::empty_shell();
    let mut pair_to_state: std::collections::HashMap<(StateId, StateId), StateId> = std::collections::HashMap::new();

    let mut get_or_create = |out: &mut Automaton, pair: (StateId, StateId)| -> StateId {
        *pair_to_state.entry(pair).or_insert_with(|| out.fresh_state())
    };

    let q_init = get_or_create(&mut out, (a.q_init, b.q_init));
    let q_final = get_or_create(&mut out, (a.q_final, b.q_final));
    out.q_init = q_init;
    out.q_final = q_final;

    // BFS over reachable pairs, materializing states and transitions as we
    // discover them, so the result never contains a pair neither side can
    // actually reach.
    let mut queue = std::collections::VecDeque::new();
    let mut visited = std::collections::HashSet::new();
    queue.push_back((a.q_init, b.q_init));
    visited.insert((a.q_init, b.q_init));

    while let Some((sa, sb)) = queue.pop_front() {
        let src = get_or_create(&mut out, (sa, sb));
        for ta in a.transitions_from(sa) {
            for tb in b.transitions_from(sb) {
                if ta.arrow != tb.arrow {
                    continue;
                }
                let Some(test) = conjoin_tests(&ta.test, &tb.test) else { continue };
                let dst_pair = (ta.dst, tb.dst);
                let dst = get_or_create(&mut out, dst_pair);
                out.add_transition(src, ta.arrow, test, dst);
                if visited.insert(dst_pair) {
                    queue.push_back(dst_pair);
                }
            }
        }
    }

    out.prune_unreachable()
}

fn conjoin_tests(a: &NodeTest, b: &NodeTest) -> Option<NodeTest> {
    match (a, b) {
        (NodeTest::Any, NodeTest::Any) => Some(NodeTest::Any),
        (NodeTest::Any, NodeTest::Compound(c)) | (NodeTest::Compound(c), NodeTest::Any) => {
            Some(NodeTest::Compound(c.clone()))
        }
        (NodeTest::Compound(x), NodeTest::Compound(y)) => conjoin_compounds(x, y).map(NodeTest::Compound),
    }
}

/// Conjoins two compound node-tests field by field. Used only inside the
/// product, where both sides' compounds must hold at the same tree position
/// simultaneously; element-test incompatibility is the only hard ⊥ detected
/// here; the rest (pseudo-class conflicts) is left to the Automaton
/// Normalizer pass that runs immediately after the product (§4.4).
fn conjoin_compounds(a: &Compound, b: &Compound) -> Option<Compound> {
    let element = conjoin_element_tests(&a.element, &b.element)?;
    let mut out = Compound {
        element,
        has_class_attr_or_id: a.has_class_attr_or_id || b.has_class_attr_or_id,
        ids: a.ids.iter().chain(b.ids.iter()).cloned().collect(),
        stateless: a.stateless.iter().chain(b.stateless.iter()).copied().collect(),
        negated_stateless: a.negated_stateless.iter().chain(b.negated_stateless.iter()).copied().collect(),
        root: a.root || b.root,
        empty: a.empty || b.empty,
        first_child: a.first_child || b.first_child,
        last_child: a.last_child || b.last_child,
        only_child: a.only_child || b.only_child,
        first_of_type: a.first_of_type || b.first_of_type,
        last_of_type: a.last_of_type || b.last_of_type,
        negated_first_child: a.negated_first_child || b.negated_first_child,
        negated_last_child: a.negated_last_child || b.negated_last_child,
        nth: a.nth.iter().chain(b.nth.iter()).copied().collect(),
        negated_nth: a.negated_nth.iter().chain(b.negated_nth.iter()).copied().collect(),
    };
    out.stateless.sort_by_key(|p| p.name());
    out.stateless.dedup();
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::build::build_automaton;
    use crate::selector::compound::{CombinatorChain, ElementTest};

    fn elem(name: &str) -> Compound {
        Compound { element: ElementTest { local_name: Some(name.to_string()), ..Default::default() }, ..Default::default() }
    }

    #[test]
    fn product_of_identical_automata_is_nonempty() {
        let chain = CombinatorChain { compounds: vec![elem("div")], combinators: vec![] };
        let aut = build_automaton(&chain);
        let p = product(&aut, &aut);
        assert!(!p.transitions.is_empty());
    }

    #[test]
    fn product_of_disjoint_elements_has_no_accepting_transition() {
        let chain_a = CombinatorChain { compounds: vec![elem("div")], combinators: vec![] };
        let chain_b = CombinatorChain { compounds: vec![elem("span")], combinators: vec![] };
        let p = product(&build_automaton(&chain_a), &build_automaton(&chain_b));
        assert!(p.transitions.is_empty());
    }
}
