//! Automaton Normalizer (§4.4): runs the Selector Normalizer (§4.1) over
//! every transition's node-test in a freshly built product, dropping any
//! transition whose compound collapsed to ⊥, then re-prunes.

use super::{Arrow, Automaton, NodeTest, Transition};
use crate::normalize::normalize_compound;

pub fn normalize_automaton(aut: &Automaton) -> Automaton {
    let mut out = Automaton {
        num_states: aut.num_states,
        q_init: aut.q_init,
        q_final: aut.q_final,
        transitions: Vec::with_capacity(aut.transitions.len()),
    };

    for t in &aut.transitions {
        match &t.test {
            NodeTest::Any => out.transitions.push(t.clone()),
            NodeTest::Compound(c) => {
                let Some(normalized) = normalize_compound(c) else {
                    continue; // ⊥: drop the transition entirely, per §4.4.
                };
                // Arriving somewhere via `Child` means the node we left is
                // that destination's child — so a destination tagged
                // `:empty` there is self-contradictory (§9 open question
                // (b)): it demands a child to be reached, but `:empty` means
                // it has none.
                if normalized.empty && t.arrow == Arrow::Child {
                    continue;
                }
                out.transitions.push(Transition {
                    src: t.src,
                    arrow: t.arrow,
                    test: NodeTest::Compound(crate::selector::compound::Compound {
                        element: normalized.element,
                        has_class_attr_or_id: normalized.has_class_attr_or_id,
                        root: normalized.root,
                        empty: normalized.empty,
                        first_child: normalized.first_child,
                        last_child: normalized.last_child,
                        only_child: normalized.only_child,
                        first_of_type: normalized.first_of_type,
                        last_of_type: normalized.last_of_type,
                        nth: normalized.nth,
                        ..Default::default()
                    }),
                    dst: t.dst,
                });
            }
        }
    }

    out.prune_unreachable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::build::build_automaton;
    use crate::automaton::product::product;
    use crate::selector::compound::{CombinatorChain, Compound};
    use crate::selector::NonTSPseudoClass;

    #[test]
    fn empty_ancestor_reached_via_child_is_dropped() {
        use crate::selector::compound::ElementTest;

        let p = Compound { element: ElementTest { local_name: Some("p".into()), ..Default::default() }, ..Default::default() };
        let mut empty_div = Compound { element: ElementTest { local_name: Some("div".into()), ..Default::default() }, ..Default::default() };
        empty_div.empty = true;

        let chain = CombinatorChain {
            compounds: vec![p, empty_div],
            combinators: vec![crate::selector::compound::Combinator::Child],
        };
        let aut = build_automaton(&chain);
        let normalized = normalize_automaton(&aut);
        assert!(normalized.transitions.is_empty());
    }

    #[test]
    fn conflicting_pseudo_pair_vanishes_after_normalize() {
        let mut link = Compound::default();
        link.stateless.push(NonTSPseudoClass::Link);
        let mut visited = Compound::default();
        visited.stateless.push(NonTSPseudoClass::Visited);

        let chain_a = CombinatorChain { compounds: vec![link], combinators: vec![] };
        let chain_b = CombinatorChain { compounds: vec![visited], combinators: vec![] };
        let prod = product(&build_automaton(&chain_a), &build_automaton(&chain_b));
        let normalized = normalize_automaton(&prod);
        assert!(normalized.transitions.is_empty());
    }
}
