//! Decomposes a parsed `selectors::parser::Selector<Simple>` into the
//! compound/combinator chain the data model (§3) calls `CombinedSelector`.
//!
//! The `selectors` crate stores a selector as a flat, reversed sequence of
//! components with combinators interleaved; `Selector::iter`/`next_sequence`
//! already walks it in the same outward, subject-first order the automaton
//! builder needs (§4.2), so we just re-group it into compounds.

use selectors::parser::{Combinator as SelectorsCombinator, Component, NthSelectorData, NthType};
use selectors::parser::Selector;

use crate::error::SelectorError;
use crate::selector::{NonTSPseudoClass, Simple};

/// One of the four arrows the data model recognizes (§3's `CombinedSelector`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    Adjacent,
    GeneralSibling,
}

fn lower_combinator(c: SelectorsCombinator) -> Result<Combinator, SelectorError> {
    match c {
        SelectorsCombinator::Descendant => Ok(Combinator::Descendant),
        SelectorsCombinator::Child => Ok(Combinator::Child),
        SelectorsCombinator::NextSibling => Ok(Combinator::Adjacent),
        SelectorsCombinator::LaterSibling => Ok(Combinator::GeneralSibling),
        other => Err(SelectorError::Unsupported(format!("combinator {other:?}"))),
    }
}

/// `nth-child(an+b)` and friends, normalized to the four kinds §4.5 encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NthKind {
    Child,
    LastChild,
    OfType,
    LastOfType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NthConstraint {
    pub kind: NthKind,
    pub a: i32,
    pub b: i32,
    /// `true` for a constraint introduced through `:not(nth-child(...))`:
    /// the Emptiness Decider asserts the predicate's complement (§4.5 point 1).
    pub negated: bool,
}

/// Element/namespace constraint on a compound; `None` name means universal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementTest {
    pub namespace: Namespace,
    pub local_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Namespace {
    #[default]
    Any,
    None,
    Specific(String),
}

/// A single compound node-test: everything ANDed together at one tree
/// position, before normalization (§4.1 operates on exactly this shape).
#[derive(Debug, Clone, Default)]
pub struct Compound {
    pub element: ElementTest,
    /// Attribute/class/id constraints: tracked only as "present or absent"
    /// (§9 open question (a) — string-constraint consistency is out of scope).
    pub has_class_attr_or_id: bool,
    pub ids: Vec<String>,
    pub stateless: Vec<NonTSPseudoClass>,
    pub negated_stateless: Vec<NonTSPseudoClass>,
    pub root: bool,
    pub empty: bool,
    pub first_child: bool,
    pub last_child: bool,
    pub only_child: bool,
    pub first_of_type: bool,
    pub last_of_type: bool,
    pub negated_first_child: bool,
    pub negated_last_child: bool,
    pub nth: Vec<NthConstraint>,
    pub negated_nth: Vec<NthConstraint>,
}

/// The compound/combinator chain of a selector, subject first (outward walk
/// order), mirroring how the automaton builder consumes it (§4.2).
#[derive(Debug, Clone)]
pub struct CombinatorChain {
    /// `compounds[0]` is the subject; `combinators[i]` connects
    /// `compounds[i]` to `compounds[i + 1]`.
    pub compounds: Vec<Compound>,
    pub combinators: Vec<Combinator>,
}

pub fn decompose(selector: &Selector<Simple>) -> Result<CombinatorChain, SelectorError> {
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();

    let mut iter = selector.iter();
    loop {
        let mut compound = Compound::default();
        for component in &mut iter {
            apply_component(&mut compound, component)?;
        }
        compounds.push(compound);

        match iter.next_sequence() {
            Some(combinator) => combinators.push(lower_combinator(combinator)?),
            None => break,
        }
    }

    Ok(CombinatorChain { compounds, combinators })
}

fn apply_component(compound: &mut Compound, component: &Component<Simple>) -> Result<(), SelectorError> {
    match component {
        Component::ExplicitUniversalType => {}
        Component::ExplicitAnyNamespace => {
            compound.element.namespace = Namespace::Any;
        }
        Component::ExplicitNoNamespace => {
            compound.element.namespace = Namespace::None;
        }
        Component::DefaultNamespace(ns) | Component::Namespace(_, ns) => {
            compound.element.namespace = Namespace::Specific(ns.0.clone());
        }
        Component::LocalName(local) => {
            compound.element.local_name = Some(local.name.0.clone());
        }
        Component::ID(id) => {
            compound.has_class_attr_or_id = true;
            compound.ids.push(id.0.clone());
        }
        Component::Class(_) => {
            compound.has_class_attr_or_id = true;
        }
        Component::AttributeInNoNamespaceExists { .. }
        | Component::AttributeInNoNamespace { .. }
        | Component::AttributeOther(_) => {
            compound.has_class_attr_or_id = true;
        }
        Component::NonTSPseudoClass(pseudo) => {
            compound.stateless.push(*pseudo);
        }
        Component::Negation(selectors) => {
            apply_negation(compound, selectors)?;
        }
        Component::Root => compound.root = true,
        Component::Empty => compound.empty = true,
        Component::FirstChild => compound.first_child = true,
        Component::LastChild => compound.last_child = true,
        Component::OnlyChild => {
            compound.first_child = true;
            compound.last_child = true;
            compound.only_child = true;
        }
        Component::Nth(data) => {
            compound.nth.push(lower_nth(data, false)?);
        }
        other => {
            return Err(SelectorError::Unsupported(format!("selector component {other:?}")));
        }
    }
    Ok(())
}

fn lower_nth(data: &NthSelectorData, negated: bool) -> Result<NthConstraint, SelectorError> {
    let kind = match data.ty {
        NthType::Child => NthKind::Child,
        NthType::LastChild => NthKind::LastChild,
        NthType::OfType => NthKind::OfType,
        NthType::LastOfType => NthKind::LastOfType,
        other => return Err(SelectorError::Unsupported(format!("nth kind {other:?}"))),
    };
    Ok(NthConstraint { kind, a: data.a, b: data.b, negated })
}

/// `:not(arg)` — the data model treats `arg` as a simple (non-combined)
/// selector (§3). We only reason precisely about negated stateless pseudos
/// and negated `:first-child`/`:last-child` (the pairs §4.1 lists); any other
/// negated shape (e.g. `:not(.foo)`) is structurally inert here for the same
/// reason positive class/id/attribute constraints are (§9 open question (a)).
fn apply_negation(compound: &mut Compound, selectors: &[Selector<Simple>]) -> Result<(), SelectorError> {
    for inner in selectors {
        let mut iter = inner.iter();
        let components: Vec<&Component<Simple>> = iter.by_ref().collect();
        if iter.next_sequence().is_some() {
            return Err(SelectorError::Unsupported(":not() with a combined argument".into()));
        }
        for component in components {
            match component {
                Component::NonTSPseudoClass(pseudo) => compound.negated_stateless.push(*pseudo),
                Component::FirstChild => compound.negated_first_child = true,
                Component::LastChild => compound.negated_last_child = true,
                Component::Nth(data) => compound.negated_nth.push(lower_nth(data, true)?),
                Component::Class(_)
                | Component::ID(_)
                | Component::AttributeInNoNamespaceExists { .. }
                | Component::AttributeInNoNamespace { .. }
                | Component::AttributeOther(_)
                | Component::ExplicitUniversalType
                | Component::LocalName(_) => {}
                other => {
                    return Err(SelectorError::Unsupported(format!(":not() argument {other:?}")));
                }
            }
        }
    }
    Ok(())
}
