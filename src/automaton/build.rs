//! Automaton Builder (§4.2): turns a compound/combinator chain into a
//! neighborhood-walking automaton, subject-first.
//!
//! Builds the base automaton for the subject compound with a plain
//! `noop(C)` transition only — the "self-loops at `q_init` on `child(*)` and
//! `sibling(*)`" from the "Simple compound" recipe are attached once, after
//! every combinator has been folded in, to whichever state ends up as the
//! *final* outward frontier (`build_automaton`'s last few lines). Attaching
//! them to the subject's own entry state up front and then feeding later
//! combinators' `q_mid` into that same state (as a "reused base-automaton
//! relay") would let an inner `child(*)`/`sibling(*)` self-loop fire between
//! two combinators that should be adjacent, quietly turning e.g. `e1 > e2`
//! into "`e1` anywhere above `e2`". The self-loop belongs only on the
//! outermost boundary of the whole chain, so it is added there and only
//! there, once, after the `for` loop below.
//!
//! Every per-combinator recipe otherwise follows §4.2 literally, including
//! the `q_loop` states for `Child`, `Descendant`, and `General sibling`.

use super::{Arrow, Automaton, NodeTest};
use crate::selector::compound::{Combinator, CombinatorChain, Compound};

pub fn build_automaton(chain: &CombinatorChain) -> Automaton {
    let mut aut = Automaton::empty_shell();

    let q_init0 = aut.fresh_state();
    let q_final0 = aut.fresh_state();
    aut.add_transition(q_init0, Arrow::Noop, NodeTest::Compound(chain.compounds[0].clone()), q_final0);
    aut.q_final = q_final0;

    let mut frontier = q_init0;
    for (i, combinator) in chain.combinators.iter().enumerate() {
        let l = chain.compounds[i + 1].clone();
        frontier = extend(&mut aut, frontier, *combinator, l);
    }

    // The whole chain may sit arbitrarily deep in a larger tree: the
    // outermost named compound's own further ancestors/left-siblings are
    // unconstrained (§4.2's "Simple compound" self-loops), attached here to
    // the true final frontier rather than baked into `q_init0` above.
    aut.add_transition(frontier, Arrow::Child, NodeTest::Any, frontier);
    aut.add_transition(frontier, Arrow::Sibling, NodeTest::Any, frontier);
    aut.q_init = frontier;
    aut
}

/// Extends the automaton outward by one compound `l`, connected to the
/// existing automaton (whose entry point for further-outward moves is
/// `q_sub`) via `combinator`. Returns the new entry point.
fn extend(aut: &mut Automaton, q_sub: super::StateId, combinator: Combinator, l: Compound) -> super::StateId {
    match combinator {
        Combinator::Child => {
            let q_init = aut.fresh_state();
            let q_mid = aut.fresh_state();
            let q_loop = aut.fresh_state();
            aut.add_transition(q_init, Arrow::Child, NodeTest::Compound(l.clone()), q_mid);
            // "Also add an inner loop state `q_loop` with `child(L)` from
            // `q_init` then `sibling(*)` to `q_mid`" (§4.2): preserves "any
            // left-sibling is allowed under the child" once `L` is matched.
            aut.add_transition(q_init, Arrow::Child, NodeTest::Compound(l), q_loop);
            aut.add_transition(q_loop, Arrow::Sibling, NodeTest::Any, q_mid);
            aut.add_transition(q_mid, Arrow::Noop, NodeTest::Any, q_sub);
            q_init
        }
        Combinator::Descendant => {
            let q_init = aut.fresh_state();
            let q_mid = aut.fresh_state();
            let q_loop = aut.fresh_state();
            aut.add_transition(q_init, Arrow::Child, NodeTest::Compound(l.clone()), q_mid);
            aut.add_transition(q_init, Arrow::Child, NodeTest::Compound(l.clone()), q_loop);
            // "`q_loop` has `child(*)` and `sibling(*)` self-loops and both
            // `child(*)` and `neighbour(*)` exits to `q_mid`" (§4.2).
            aut.add_transition(q_loop, Arrow::Child, NodeTest::Any, q_loop);
            aut.add_transition(q_loop, Arrow::Sibling, NodeTest::Any, q_loop);
            aut.add_transition(q_loop, Arrow::Child, NodeTest::Any, q_mid);
            aut.add_transition(q_loop, Arrow::Neighbour, NodeTest::Any, q_mid);
            aut.add_transition(q_mid, Arrow::Noop, NodeTest::Any, q_sub);
            q_init
        }
        Combinator::Adjacent => {
            let q_init = aut.fresh_state();
            let q_mid = aut.fresh_state();
            aut.add_transition(q_init, Arrow::Neighbour, NodeTest::Compound(l), q_mid);
            aut.add_transition(q_mid, Arrow::Noop, NodeTest::Any, q_sub);
            q_init
        }
        Combinator::GeneralSibling => {
            let q_init = aut.fresh_state();
            let q_mid = aut.fresh_state();
            let q_loop = aut.fresh_state();
            aut.add_transition(q_init, Arrow::Neighbour, NodeTest::Compound(l.clone()), q_mid);
            // Entry mirrors `Child`'s own pattern one combinator family over:
            // the existential `sibling(L)` (any earlier sibling satisfying
            // `L`) leads into the loop, which then offers "a `sibling(*)`
            // self-loop and `neighbour(*)` exit to `q_mid`" (§4.2).
            aut.add_transition(q_init, Arrow::Sibling, NodeTest::Compound(l), q_loop);
            aut.add_transition(q_loop, Arrow::Sibling, NodeTest::Any, q_loop);
            aut.add_transition(q_loop, Arrow::Neighbour, NodeTest::Any, q_mid);
            aut.add_transition(q_mid, Arrow::Noop, NodeTest::Any, q_sub);
            q_init
        }
    }
}
