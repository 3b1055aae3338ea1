//! Simple-CSS Builder (§4.7) and the stylesheet model it produces (§3's
//! "Simple-CSS model"). Walks ingested rules, groups same-property entries
//! into specificity buckets, and consults the Overlap Primitive to decide
//! which pairs must keep their source order.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::EmptinessError;
use crate::ingest::SourceRule;
use crate::overlap::selectors_overlap;

/// One `(selector, property:value)` pairing pulled out of a source rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub selector_text: String,
    pub property: String,
    pub value: String,
    pub line: u32,
}

/// A strict-order constraint: the edge at `before` must be considered to
/// apply before the edge at `after` (both indices into `SimpleCss::edges`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Order {
    pub before: usize,
    pub after: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SimpleCss {
    pub edges: Vec<Edge>,
    pub order: Vec<Order>,
    pub source_rules: Vec<SourceRule>,
}

/// Builds the ordered cascade-dependency model for an already-ingested
/// stylesheet (§4.7).
pub fn build_simple_css(rules: Vec<SourceRule>) -> Result<SimpleCss, EmptinessError> {
    let mut edges = Vec::new();
    // property -> specificity -> entry indices into `edges`, in the order
    // encountered (source order, since `rules` is walked top to bottom).
    let mut buckets: BTreeMap<String, BTreeMap<u32, Vec<usize>>> = BTreeMap::new();
    // A simple rule is a `(selector-string, "property:value")` pair, equal by
    // string identity (§3); the edge list is a union over entries, so a
    // repeated rule must not produce a repeated edge (§4.7).
    let mut seen: BTreeSet<(String, String, String)> = BTreeSet::new();

    for rule in &rules {
        let specificity = rule.selector.specificity();
        for (property, value) in &rule.declarations {
            let key = (rule.selector_text.clone(), property.clone(), value.clone());
            if !seen.insert(key) {
                continue;
            }
            let index = edges.len();
            edges.push(Edge {
                selector_text: rule.selector_text.clone(),
                property: property.clone(),
                value: value.clone(),
                line: rule.line,
            });
            buckets.entry(property.clone()).or_default().entry(specificity).or_default().push(index);
        }
    }

    let mut order = Vec::new();
    for specificities in buckets.values() {
        for indices in specificities.values() {
            for (a, &i) in indices.iter().enumerate() {
                for &j in &indices[a + 1..] {
                    let (earlier, later) = if edges[i].line <= edges[j].line { (i, j) } else { (j, i) };
                    if edges[earlier].value == edges[later].value {
                        continue;
                    }
                    let s1 = crate::selector::parse_single_selector(&edges[earlier].selector_text)?;
                    let s2 = crate::selector::parse_single_selector(&edges[later].selector_text)?;
                    if selectors_overlap(&s1, &s2)? {
                        order.push(Order { before: earlier, after: later });
                    }
                }
            }
        }
    }
    order.sort();
    order.dedup();

    Ok(SimpleCss { edges, order, source_rules: rules })
}
