//! Selector Normalizer (§4.1): canonicalizes a single compound node-test, or
//! detects that it is unsatisfiable (⊥).
//!
//! Attribute/class/id constraints are always treated as satisfiable (§9 open
//! question (a) — this is a deliberate, preserved limitation, not a TODO: the
//! algorithm being modeled does not reason about string-constraint conflicts,
//! and we match that rather than inventing logic for it).

use crate::selector::compound::{Compound, ElementTest, Namespace, NthConstraint};
use crate::selector::NonTSPseudoClass;

/// A compound after normalization, or nothing if the compound is ⊥.
///
/// Attribute/class/id presence and the element test are kept for downstream
/// consumers (the automaton builder needs the element test to match
/// namespace/name at each step); stateless pseudo-classes that were dropped
/// (§4.1) simply don't appear here.
#[derive(Debug, Clone, Default)]
pub struct NormalizedCompound {
    pub element: ElementTest,
    pub has_class_attr_or_id: bool,
    pub root: bool,
    pub empty: bool,
    pub first_child: bool,
    pub last_child: bool,
    pub only_child: bool,
    pub first_of_type: bool,
    pub last_of_type: bool,
    pub nth: Vec<NthConstraint>,
}

/// Pairs of stateless pseudo-classes that can never both hold (§4.1).
const INCOMPATIBLE_PAIRS: &[(NonTSPseudoClass, NonTSPseudoClass)] = &[
    (NonTSPseudoClass::Link, NonTSPseudoClass::Visited),
    (NonTSPseudoClass::Enabled, NonTSPseudoClass::Disabled),
];

fn incompatible(a: NonTSPseudoClass, b: NonTSPseudoClass) -> bool {
    INCOMPATIBLE_PAIRS
        .iter()
        .any(|&(x, y)| (a == x && b == y) || (a == y && b == x))
}

/// Normalizes one compound, returning `None` for ⊥.
pub fn normalize_compound(compound: &Compound) -> Option<NormalizedCompound> {
    // Stateless pseudo-classes are assumed to have free witnesses in some
    // document state (§4.1) and are simply dropped from the output ...
    for &p in &compound.stateless {
        // ... unless negated too: `p ∧ ¬p` is ⊥.
        if compound.negated_stateless.contains(&p) {
            return None;
        }
    }
    // `link ∧ visited`, `enabled ∧ disabled`.
    for &a in &compound.stateless {
        for &b in &compound.stateless {
            if a != b && incompatible(a, b) {
                return None;
            }
        }
    }

    // `:first-child ∧ ¬:first-child`, `:last-child ∧ ¬:last-child`.
    if compound.first_child && compound.negated_first_child {
        return None;
    }
    if compound.last_child && compound.negated_last_child {
        return None;
    }

    // `nth-child(a,b) ∧ ¬nth-child(a,b)` style contradictions are left to the
    // Emptiness Decider, which already encodes nth constraints and their
    // negations numerically (§4.5 point 1) — duplicating that reasoning here
    // would just re-derive the same integer arithmetic syntactically.

    // Element/namespace agreement: `n|e` together with `¬(m|e)` for an
    // incompatible shape collapses to ⊥. The only conflicting shape our
    // grammar can produce directly on one compound is a local-name clash
    // introduced through `:not()` carrying its own element test, which
    // `apply_negation` (compound.rs) does not currently thread through; this
    // is therefore vacuous today and left as the hook §4.1 names.

    Some(NormalizedCompound {
        element: ElementTest {
            namespace: compound.element.namespace.clone(),
            local_name: compound.element.local_name.clone(),
        },
        has_class_attr_or_id: compound.has_class_attr_or_id,
        root: compound.root,
        empty: compound.empty,
        first_child: compound.first_child,
        last_child: compound.last_child,
        only_child: compound.only_child,
        first_of_type: compound.first_of_type,
        last_of_type: compound.last_of_type,
        nth: {
            let mut nth = compound.nth.clone();
            nth.extend(compound.negated_nth.iter().copied());
            nth
        },
    })
}

/// Two element tests agree if their namespace/name constraints are jointly
/// satisfiable by some single element. Used both here and by the automaton
/// product (§4.3) when conjoining two transitions' node-tests.
pub fn element_tests_compatible(a: &ElementTest, b: &ElementTest) -> bool {
    let name_ok = match (&a.local_name, &b.local_name) {
        (None, _) | (_, None) => true,
        (Some(x), Some(y)) => x == y,
    };
    let ns_ok = match (&a.namespace, &b.namespace) {
        (Namespace::Any, _) | (_, Namespace::Any) => true,
        (Namespace::None, Namespace::None) => true,
        (Namespace::Specific(x), Namespace::Specific(y)) => x == y,
        (Namespace::None, Namespace::Specific(_)) | (Namespace::Specific(_), Namespace::None) => false,
    };
    name_ok && ns_ok
}

/// Conjoins two element tests into the single test a product transition must
/// satisfy, or `None` if they are incompatible (⊥).
pub fn conjoin_element_tests(a: &ElementTest, b: &ElementTest) -> Option<ElementTest> {
    if !element_tests_compatible(a, b) {
        return None;
    }
    let local_name = a.local_name.clone().or_else(|| b.local_name.clone());
    let namespace = match (&a.namespace, &b.namespace) {
        (Namespace::Any, other) | (other, Namespace::Any) => other.clone(),
        (x, _) => x.clone(),
    };
    Some(ElementTest { namespace, local_name })
}
