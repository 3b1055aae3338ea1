//! Emptiness Decider (§4.5): answers whether some accepting run of an
//! automaton exists, by trying increasing run lengths up to `k_max` and
//! asking an SMT solver whether each fixed-length run is satisfiable.
//!
//! A run of length `k` is a sequence of `k + 1` states `q_0 = q_init, ...,
//! q_k = q_final` together with one tree-position variable per step; the
//! transitions actually taken constrain how those positions relate to each
//! other (§4.5 points 1-6). The search is bounded because two neighborhoods
//! that only overlap arbitrarily deep in the tree are treated as not
//! overlapping for the purpose of this tool (§9 open question, and the
//! default documented in §6's `--k-max`).

use std::collections::HashMap;

use z3::ast::{Ast, Bool, Int};
use z3::{Config, Context, SatResult, Solver};

use crate::automaton::{Arrow, Automaton, NodeTest};
use crate::error::EmptinessError;
use crate::selector::compound::{Compound, NthKind};

pub const DEFAULT_K_MAX: u32 = 8;

/// `true` if some accepting run of length `<= k_max` exists.
pub fn is_nonempty(aut: &Automaton, k_max: u32) -> Result<bool, EmptinessError> {
    if aut.q_init == aut.q_final {
        return Ok(true);
    }
    if aut.transitions.is_empty() {
        return Ok(false);
    }

    let cfg = Config::new();
    let ctx = Context::new(&cfg);

    for k in 1..=k_max {
        if run_of_length_exists(aut, &ctx, k) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Per-step tree-position variables. `pos`/`last` track sibling index and
/// sibling-set size for `nth-child` family constraints; `type_pos`/
/// `type_last` track the same among same-type siblings for `nth-of-type`.
struct StepVars<'ctx> {
    pos: Int<'ctx>,
    last: Int<'ctx>,
    type_pos: Int<'ctx>,
    type_last: Int<'ctx>,
}

fn run_of_length_exists<'ctx>(aut: &Automaton, ctx: &'ctx Context, k: u32) -> bool {
    let solver = Solver::new(ctx);

    // One integer per step identifying which transition fired there,
    // constrained below by a disjunction over the automaton's transition
    // list rather than an uninterpreted enum sort.
    let chosen: Vec<Int<'ctx>> = (0..k).map(|step| Int::new_const(ctx, format!("t{step}"))).collect();
    let states: Vec<Int<'ctx>> = (0..=k).map(|i| Int::new_const(ctx, format!("q{i}"))).collect();
    solver.assert(&states[0]._eq(&Int::from_u64(ctx, aut.q_init as u64)));
    solver.assert(&states[k as usize]._eq(&Int::from_u64(ctx, aut.q_final as u64)));

    let mut vars_by_step: HashMap<u32, StepVars<'ctx>> = HashMap::new();
    let one = Int::from_i64(ctx, 1);
    for step in 0..k {
        let vars = step_vars(ctx, step, &mut vars_by_step);
        // Baseline bounds every step's position counters must satisfy
        // regardless of which test fires there: a sibling index is at least
        // 1, and never exceeds the sibling-set size it's drawn from.
        solver.assert(&vars.pos.ge(&one));
        solver.assert(&vars.pos.le(&vars.last));
        solver.assert(&vars.type_pos.ge(&one));
        solver.assert(&vars.type_pos.le(&vars.type_last));
    }

    for step in 0..k {
        let mut options = Vec::new();
        for (idx, t) in aut.transitions.iter().enumerate() {
            let picks_this = chosen[step as usize]._eq(&Int::from_u64(ctx, idx as u64));
            let src_ok = states[step as usize]._eq(&Int::from_u64(ctx, t.src as u64));
            let dst_ok = states[step as usize + 1]._eq(&Int::from_u64(ctx, t.dst as u64));
            let test_ok = encode_node_test(ctx, &t.test, step, &vars_by_step);
            options.push(Bool::and(ctx, &[&picks_this, &src_ok, &dst_ok, &test_ok]));
        }
        if options.is_empty() {
            return false;
        }
        let refs: Vec<&Bool<'ctx>> = options.iter().collect();
        solver.assert(&Bool::or(ctx, &refs));
        encode_arrow_ordering(ctx, &solver, aut, step, &chosen, &vars_by_step);
    }

    matches!(solver.check(), SatResult::Sat)
}

fn step_vars<'a, 'ctx>(
    ctx: &'ctx Context,
    step: u32,
    vars_by_step: &'a mut HashMap<u32, StepVars<'ctx>>,
) -> &'a StepVars<'ctx> {
    vars_by_step.entry(step).or_insert_with(|| StepVars {
        pos: Int::new_const(ctx, format!("pos{step}")),
        last: Int::new_const(ctx, format!("last{step}")),
        type_pos: Int::new_const(ctx, format!("tpos{step}")),
        type_last: Int::new_const(ctx, format!("tlast{step}")),
    })
}

/// Encodes the arithmetic side-constraints a compound node-test imposes on
/// the position variables at `step` (§4.5 points 1-4). `NodeTest::Any` is
/// unconditionally true.
fn encode_node_test<'ctx>(
    ctx: &'ctx Context,
    test: &NodeTest,
    step: u32,
    vars_by_step: &HashMap<u32, StepVars<'ctx>>,
) -> Bool<'ctx> {
    match test {
        NodeTest::Any => Bool::from_bool(ctx, true),
        NodeTest::Compound(c) => encode_compound(ctx, c, &vars_by_step[&step]),
    }
}

fn encode_compound<'ctx>(ctx: &'ctx Context, c: &Compound, vars: &StepVars<'ctx>) -> Bool<'ctx> {
    let mut clauses: Vec<Bool<'ctx>> = Vec::new();
    let one = Int::from_i64(ctx, 1);
    let zero = Int::from_i64(ctx, 0);

    if c.root {
        // `:root` has no parent: only satisfiable at the walk's synthetic
        // top, encoded as a childless-sibling-set node.
        clauses.push(vars.pos._eq(&one));
        clauses.push(vars.last._eq(&one));
    }
    // `:empty` has no position-counter encoding of its own: it's enforced
    // structurally by the automaton shape (no `Child` transition targets a
    // state that requires this node as an ancestor), not here.
    if c.first_child {
        clauses.push(vars.pos._eq(&one));
    }
    if c.last_child {
        clauses.push(vars.pos._eq(&vars.last));
    }
    if c.first_of_type {
        clauses.push(vars.type_pos._eq(&one));
    }
    if c.last_of_type {
        clauses.push(vars.type_pos._eq(&vars.type_last));
    }
    for nth in &c.nth {
        let subject = match nth.kind {
            NthKind::Child | NthKind::LastChild => &vars.pos,
            NthKind::OfType | NthKind::LastOfType => &vars.type_pos,
        };
        let base = match nth.kind {
            NthKind::Child => subject.clone(),
            NthKind::LastChild => Int::sub(ctx, &[&vars.last, subject, &one]),
            NthKind::OfType => subject.clone(),
            NthKind::LastOfType => Int::sub(ctx, &[&vars.type_last, subject, &one]),
        };
        let clause = encode_nth(ctx, &base, nth.a, nth.b, &zero);
        clauses.push(if nth.negated { clause.not() } else { clause });
    }

    // Attribute/class/id presence (§9 open question (a)) asserts nothing.

    if clauses.is_empty() {
        Bool::from_bool(ctx, true)
    } else {
        let refs: Vec<&Bool<'ctx>> = clauses.iter().collect();
        Bool::and(ctx, &refs)
    }
}

/// `:nth-child(an+b)`-style membership: exists an integer `n >= 0` with
/// `base = a*n + b`. `a = 0` degenerates to `base = b`.
fn encode_nth<'ctx>(ctx: &'ctx Context, base: &Int<'ctx>, a: i32, b: i32, zero: &Int<'ctx>) -> Bool<'ctx> {
    if a == 0 {
        return base._eq(&Int::from_i64(ctx, b as i64));
    }
    let a_const = Int::from_i64(ctx, a as i64);
    let b_const = Int::from_i64(ctx, b as i64);
    let diff = Int::sub(ctx, &[base, &b_const]);
    let divides = diff.rem(&a_const)._eq(zero);
    let nonneg = diff.div(&a_const).ge(zero);
    Bool::and(ctx, &[&divides, &nonneg])
}

/// Sibling-walk ordering (§4.5 points 5-6): a `Neighbour` step must land
/// exactly one slot before the previous step's position; a `Sibling` step
/// must land strictly before it (any earlier slot).
fn encode_arrow_ordering<'ctx>(
    ctx: &'ctx Context,
    solver: &Solver<'ctx>,
    aut: &Automaton,
    step: u32,
    chosen: &[Int<'ctx>],
    vars_by_step: &HashMap<u32, StepVars<'ctx>>,
) {
    if step == 0 {
        return;
    }
    let prev = &vars_by_step[&(step - 1)];
    let cur = &vars_by_step[&step];
    for (idx, t) in aut.transitions.iter().enumerate() {
        if !matches!(t.arrow, Arrow::Neighbour | Arrow::Sibling) {
            continue;
        }
        let picked = chosen[step as usize]._eq(&Int::from_u64(ctx, idx as u64));
        let ordering = match t.arrow {
            Arrow::Neighbour => cur.pos._eq(&Int::sub(ctx, &[&prev.pos, &Int::from_i64(ctx, 1)])),
            Arrow::Sibling => cur.pos.lt(&prev.pos),
            _ => unreachable!(),
        };
        solver.assert(&picked.implies(&ordering));
    }
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
    fn simple_compound_automaton_is_nonempty() {
        let chain = CombinatorChain { compounds: vec![elem("div")], combinators: vec![] };
        let aut = build_automaton(&chain);
        assert!(is_nonempty(&aut, DEFAULT_K_MAX).unwrap());
    }

    #[test]
    fn degenerate_shell_is_empty() {
        let aut = Automaton { num_states: 2, q_init: 0, q_final: 1, transitions: vec![] };
        assert!(!is_nonempty(&aut, DEFAULT_K_MAX).unwrap());
    }

    #[test]
    fn first_child_and_last_child_together_is_satisfiable() {
        let mut c = elem("li");
        c.first_child = true;
        c.last_child = true;
        let chain = CombinatorChain { compounds: vec![c], combinators: vec![] };
        let aut = build_automaton(&chain);
        // An only-child satisfies both: pos = 1 = last.
        assert!(is_nonempty(&aut, DEFAULT_K_MAX).unwrap());
    }

    #[test]
    fn nth_child_even_is_satisfiable() {
        use crate::selector::compound::{NthConstraint, NthKind};
        let mut c = elem("tr");
        c.nth.push(NthConstraint { kind: NthKind::Child, a: 2, b: 0, negated: false });
        let chain = CombinatorChain { compounds: vec![c], combinators: vec![] };
        let aut = build_automaton(&chain);
        assert!(is_nonempty(&aut, DEFAULT_K_MAX).unwrap());
    }
}
