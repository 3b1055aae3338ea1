//! Overlap Primitive (§4.6): the memoized front door combining syntactic
//! fast paths with the full automaton/emptiness pipeline. Grounded on the
//! Python `_shortcut_selectors_overlap`/`selectors_overlap` pair in
//! `simplecssbuilder.py`, which tries the same cheap shapes before falling
//! through to the heavier machinery.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use selectors::parser::Selector;

use crate::automaton::build::build_automaton;
use crate::automaton::normalize::normalize_automaton;
use crate::automaton::product::product;
use crate::emptiness::{self, DEFAULT_K_MAX};
use crate::error::{EmptinessError, SelectorError};
use crate::selector::compound::{self, CombinatorChain, Compound};
use crate::selector::{self, NonTSPseudoClass, Simple};

thread_local! {
    static OVERLAP_CACHE: RefCell<HashMap<(String, String), bool>> = RefCell::new(HashMap::new());
    static AUTOMATON_CACHE: RefCell<HashMap<String, CombinatorChain>> = RefCell::new(HashMap::new());
    static K_MAX: Cell<u32> = const { Cell::new(DEFAULT_K_MAX) };
}

/// Drops both process-local caches (§5's explicit reset hook).
pub fn reset_caches() {
    OVERLAP_CACHE.with(|c| c.borrow_mut().clear());
    AUTOMATON_CACHE.with(|c| c.borrow_mut().clear());
}

/// Overrides the Emptiness Decider's bounded-search depth for subsequent
/// queries on this thread (§4.10's `--k-max`). Not part of the core engine's
/// own API surface, since the core never needs to change it; exists so the
/// CLI driver has somewhere to plug its flag in.
pub fn set_k_max(k_max: u32) {
    K_MAX.with(|c| c.set(k_max));
}

/// `overlap(s₁, s₂)` over selector source text, memoized on the unordered
/// pair of canonical serializations.
pub fn selectors_overlap_str(text1: &str, text2: &str) -> Result<bool, EmptinessError> {
    let s1 = selector::parse_single_selector(text1)?;
    let s2 = selector::parse_single_selector(text2)?;
    selectors_overlap(&s1, &s2)
}

pub fn selectors_overlap(s1: &Selector<Simple>, s2: &Selector<Simple>) -> Result<bool, EmptinessError> {
    let key1 = cssparser::ToCss::to_css_string(s1);
    let key2 = cssparser::ToCss::to_css_string(s2);
    let cache_key = if key1 <= key2 { (key1.clone(), key2.clone()) } else { (key2.clone(), key1.clone()) };

    if let Some(&cached) = OVERLAP_CACHE.with(|c| c.borrow().get(&cache_key).copied()) {
        return Ok(cached);
    }

    let chain1 = chain_for(&key1, s1)?;
    let chain2 = chain_for(&key2, s2)?;

    let result = if let Some(shortcut) = shortcut_overlap(&chain1, &chain2) {
        shortcut
    } else {
        full_pipeline_overlap(&chain1, &chain2)?
    };

    OVERLAP_CACHE.with(|c| c.borrow_mut().insert(cache_key, result));
    Ok(result)
}

fn chain_for(key: &str, selector: &Selector<Simple>) -> Result<CombinatorChain, SelectorError> {
    if let Some(cached) = AUTOMATON_CACHE.with(|c| c.borrow().get(key).cloned()) {
        return Ok(cached);
    }
    let chain = compound::decompose(selector)?;
    AUTOMATON_CACHE.with(|c| c.borrow_mut().insert(key.to_string(), chain.clone()));
    Ok(AUTOMATON_CACHE.with(|c| c.borrow()[key].clone()))
}

fn full_pipeline_overlap(chain1: &CombinatorChain, chain2: &CombinatorChain) -> Result<bool, EmptinessError> {
    let aut1 = build_automaton(chain1);
    let aut2 = build_automaton(chain2);
    let prod = product(&aut1, &aut2);
    let normalized = normalize_automaton(&prod);
    emptiness::is_nonempty(&normalized, K_MAX.with(|c| c.get()))
}

/// Tries the cheap syntactic shapes of §4.6 before falling through to the
/// full pipeline; `None` means "no shortcut applies".
fn shortcut_overlap(chain1: &CombinatorChain, chain2: &CombinatorChain) -> Option<bool> {
    let (c1, c2) = (single_compound(chain1)?, single_compound(chain2)?);

    if is_pure_universal_class(c1) && is_pure_universal_class(c2) {
        return Some(true);
    }

    if let (Some(id1), Some(id2)) = (sole_id(c1), sole_id(c2)) {
        return Some(id1 == id2);
    }

    if is_pure_element(c1) && is_pure_element(c2) {
        return Some(structurally_equal_element(c1, c2));
    }

    if let (Some(p1), Some(p2)) = (classes_and_trailing_pseudo(c1), classes_and_trailing_pseudo(c2)) {
        return Some(match (p1, p2) {
            (None, _) | (_, None) => true,
            (Some(a), Some(b)) => !incompatible_stateful(a, b),
        });
    }

    None
}

fn single_compound(chain: &CombinatorChain) -> Option<&Compound> {
    if chain.combinators.is_empty() { chain.compounds.first() } else { None }
}

fn is_pure_universal_class(c: &Compound) -> bool {
    c.element.local_name.is_none()
        && c.has_class_attr_or_id
        && c.ids.is_empty()
        && c.stateless.is_empty()
        && !has_structural_constraints(c)
}

fn sole_id(c: &Compound) -> Option<&str> {
    if c.element.local_name.is_none() && c.ids.len() == 1 && c.stateless.is_empty() && !has_structural_constraints(c) {
        Some(c.ids[0].as_str())
    } else {
        None
    }
}

fn is_pure_element(c: &Compound) -> bool {
    !c.has_class_attr_or_id && c.ids.is_empty() && c.stateless.is_empty() && !has_structural_constraints(c)
}

fn structurally_equal_element(a: &Compound, b: &Compound) -> bool {
    a.element.local_name == b.element.local_name
}

/// Classes/ids/attributes plus at most one trailing stateful pseudo, over a
/// universal element. Returns `Some(None)` for no trailing pseudo,
/// `Some(Some(p))` for exactly one, `None` if the shape doesn't match.
fn classes_and_trailing_pseudo(c: &Compound) -> Option<Option<NonTSPseudoClass>> {
    if c.element.local_name.is_some() || has_structural_constraints(c) || !c.negated_stateless.is_empty() {
        return None;
    }
    match c.stateless.len() {
        0 => Some(None),
        1 => Some(Some(c.stateless[0])),
        _ => None,
    }
}

fn has_structural_constraints(c: &Compound) -> bool {
    c.root
        || c.empty
        || c.first_child
        || c.last_child
        || c.only_child
        || c.first_of_type
        || c.last_of_type
        || c.negated_first_child
        || c.negated_last_child
        || !c.nth.is_empty()
        || !c.negated_nth.is_empty()
}

const INCOMPATIBLE_STATEFUL: &[(NonTSPseudoClass, NonTSPseudoClass)] = &[
    (NonTSPseudoClass::Link, NonTSPseudoClass::Visited),
    (NonTSPseudoClass::Enabled, NonTSPseudoClass::Disabled),
];

fn incompatible_stateful(a: NonTSPseudoClass, b: NonTSPseudoClass) -> bool {
    INCOMPATIBLE_STATEFUL.iter().any(|&(x, y)| (a == x && b == y) || (a == y && b == x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_class_selectors_overlap() {
        reset_caches();
        assert!(selectors_overlap_str(".a", ".a").unwrap());
    }

    #[test]
    fn distinct_ids_never_overlap() {
        reset_caches();
        assert!(!selectors_overlap_str("#a", "#b").unwrap());
    }

    #[test]
    fn same_id_overlaps() {
        reset_caches();
        assert!(selectors_overlap_str("#a", "#a").unwrap());
    }

    #[test]
    fn distinct_elements_never_overlap() {
        reset_caches();
        assert!(!selectors_overlap_str("div", "span").unwrap());
    }

    #[test]
    fn link_and_visited_never_overlap() {
        reset_caches();
        assert!(!selectors_overlap_str(".a:link", ".a:visited").unwrap());
    }

    #[test]
    fn hover_alone_overlaps_with_plain_class() {
        reset_caches();
        assert!(selectors_overlap_str(".a:hover", ".a").unwrap());
    }

    #[test]
    fn overlap_is_symmetric() {
        reset_caches();
        let a = selectors_overlap_str("div.a", ".a:hover").unwrap();
        let b = selectors_overlap_str(".a:hover", "div.a").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn memoization_is_stable_and_unaffected_by_reset() {
        reset_caches();
        let first = selectors_overlap_str("li:first-child", "li:last-child").unwrap();
        let second = selectors_overlap_str("li:first-child", "li:last-child").unwrap();
        assert_eq!(first, second);
        reset_caches();
        let third = selectors_overlap_str("li:first-child", "li:last-child").unwrap();
        assert_eq!(first, third);
    }

    #[test]
    fn nth_child_disjoint_residues_do_not_overlap() {
        reset_caches();
        // 3n -> residue 0 mod 3; 6n+1 and 6n+2 -> residues 1, 2 mod 6, neither
        // of which is ever a multiple of 3.
        assert!(!selectors_overlap_str("e:nth-child(3n)", "e:nth-child(6n+1)").unwrap());
        assert!(!selectors_overlap_str("e:nth-child(3n)", "e:nth-child(6n+2)").unwrap());
    }

    #[test]
    fn descendant_combinator_overlaps_when_ancestor_matches() {
        reset_caches();
        assert!(selectors_overlap_str("div p", "div p").unwrap());
    }
}
