//! Cascade-dependency model for a CSS stylesheet, built on a selector
//! automaton engine and an SMT-backed emptiness decider (§1). Two subsystems
//! carry the core: the Selector Automaton Engine (`selector`, `normalize`,
//! `automaton`, `emptiness`) and the Simple-CSS Builder (`ingest`,
//! `builder`), joined by the memoized Overlap Primitive (`overlap`).

pub mod automaton;
pub mod builder;
pub mod emptiness;
pub mod error;
pub mod ingest;
pub mod normalize;
pub mod overlap;
pub mod selector;

pub use builder::{build_simple_css as build_simple_css_from_rules, Edge, Order, SimpleCss};
pub use error::CascadeError;
pub use ingest::SourceRule;
pub use overlap::{reset_caches, set_k_max};

use selectors::parser::Selector;

/// `overlap(s₁, s₂)` over already-parsed selectors (§6).
pub fn selectors_overlap(s1: &Selector<selector::Simple>, s2: &Selector<selector::Simple>) -> Result<bool, CascadeError> {
    overlap::selectors_overlap(s1, s2).map_err(Into::into)
}

/// `overlap(s₁, s₂)` over selector source text (§6).
pub fn selectors_overlap_str(text1: &str, text2: &str) -> Result<bool, CascadeError> {
    overlap::selectors_overlap_str(text1, text2).map_err(Into::into)
}

/// Ingests `css` and builds its cascade-dependency model (§6).
pub fn build_simple_css(css: &str) -> Result<SimpleCss, CascadeError> {
    let rules = ingest::parse_stylesheet(css);
    builder::build_simple_css(rules).map_err(Into::into)
}
