//! Selector parse trees.
//!
//! Grammar parsing is an external collaborator: we do not tokenize CSS or
//! implement selector grammar ourselves. This module owns the `SelectorImpl`
//! (`Simple`) that the `selectors` crate parses into, and the newtype wrappers
//! it needs for attribute values, identifiers, and namespaces.

pub mod compound;

use std::borrow::Borrow;
use std::fmt;

use cssparser::{CowRcStr, Parser as CssParser, ParserInput, SourceLocation, serialize_string};
use precomputed_hash::PrecomputedHash;
use selectors::parser::{self, SelectorList, SelectorParseErrorKind};

use crate::error::SelectorError;

/// Selector implementation with no pseudo-elements: the grammar in the spec's
/// data model (§3) never mentions `::before`/`::after`, so `PseudoElement` is
/// left uninhabited rather than speculatively supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simple;

impl parser::SelectorImpl for Simple {
    type AttrValue = CssString;
    type Identifier = CssString;
    type LocalName = CssLocalName;
    type NamespacePrefix = CssLocalName;
    type NamespaceUrl = CssNamespace;
    type BorrowedNamespaceUrl = str;
    type BorrowedLocalName = str;
    type NonTSPseudoClass = NonTSPseudoClass;
    type PseudoElement = PseudoElement;
    type ExtraMatchingData<'a> = ();
}

/// Stateless pseudo-classes from §3's grammar (the ones the normalizer drops
/// or collapses to ⊥ per §4.1). Positional and other stateful pseudos
/// (`:root`, `:empty`, `:first-child`, `:nth-child`, …) are represented by
/// the `selectors` crate's own dedicated `Component` variants, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NonTSPseudoClass {
    Hover,
    Link,
    Visited,
    Active,
    Focus,
    Enabled,
    Disabled,
    Checked,
}

impl NonTSPseudoClass {
    pub fn name(self) -> &'static str {
        match self {
            Self::Hover => "hover",
            Self::Link => "link",
            Self::Visited => "visited",
            Self::Active => "active",
            Self::Focus => "focus",
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Checked => "checked",
        }
    }
}

impl parser::NonTSPseudoClass for NonTSPseudoClass {
    type Impl = Simple;

    fn is_active_or_hover(&self) -> bool {
        matches!(self, Self::Active | Self::Hover)
    }

    fn is_user_action_state(&self) -> bool {
        matches!(self, Self::Active | Self::Hover | Self::Focus)
    }
}

impl cssparser::ToCss for NonTSPseudoClass {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        write!(dest, ":{}", self.name())
    }
}

/// Uninhabited: this engine never produces or consumes pseudo-elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoElement {}

impl parser::PseudoElement for PseudoElement {
    type Impl = Simple;
}

impl cssparser::ToCss for PseudoElement {
    fn to_css<W>(&self, _dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        match *self {}
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SelectorParser;

impl<'i> parser::Parser<'i> for SelectorParser {
    type Impl = Simple;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_is_and_where(&self) -> bool {
        false
    }

    fn parse_has(&self) -> bool {
        false
    }

    fn parse_nth_child_of(&self) -> bool {
        false
    }

    fn parse_non_ts_pseudo_class(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<NonTSPseudoClass, cssparser::ParseError<'i, Self::Error>> {
        use NonTSPseudoClass::*;
        match &*name {
            "hover" => Ok(Hover),
            "link" => Ok(Link),
            "visited" => Ok(Visited),
            "active" => Ok(Active),
            "focus" => Ok(Focus),
            "enabled" => Ok(Enabled),
            "disabled" => Ok(Disabled),
            "checked" => Ok(Checked),
            _ => Err(cssparser::ParseError {
                kind: cssparser::ParseErrorKind::Custom(
                    SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name),
                ),
                location,
            }),
        }
    }

    fn parse_pseudo_element(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<PseudoElement, cssparser::ParseError<'i, Self::Error>> {
        Err(cssparser::ParseError {
            kind: cssparser::ParseErrorKind::Custom(
                SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name),
            ),
            location,
        })
    }
}

/// Parses selector source text (one or more comma-separated selectors) into
/// the parse trees the rest of the engine consumes.
pub fn parse_selector_list(text: &str) -> Result<SelectorList<Simple>, SelectorError> {
    let mut input = ParserInput::new(text);
    let mut parser = CssParser::new(&mut input);
    SelectorList::parse(&SelectorParser, &mut parser, parser::ParseRelative::No)
        .map_err(|err| SelectorError::Parse(format!("{err:?}")))
}

/// Parses exactly one selector, rejecting selector lists with more than one
/// member. Used where the spec's grammar talks about "a selector" singular
/// (e.g. the two sides of an overlap query).
pub fn parse_single_selector(text: &str) -> Result<parser::Selector<Simple>, SelectorError> {
    let list = parse_selector_list(text)?;
    let mut iter = list.slice().iter();
    let first = iter.next().ok_or_else(|| SelectorError::Parse("empty selector list".into()))?;
    if iter.next().is_some() {
        return Err(SelectorError::Parse(
            "expected a single selector, found a comma-separated list".into(),
        ));
    }
    Ok(first.clone())
}

macro_rules! css_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
        pub struct $name(pub String);

        impl<'a> From<&'a str> for $name {
            fn from(value: &'a str) -> Self {
                Self(value.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl PrecomputedHash for $name {
            fn precomputed_hash(&self) -> u32 {
                fnv1a(self.0.as_bytes())
            }
        }
    };
}

css_newtype!(CssString);
css_newtype!(CssLocalName);
css_newtype!(CssNamespace);

impl cssparser::ToCss for CssString {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        serialize_string(&self.0, dest)
    }
}

impl cssparser::ToCss for CssLocalName {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        dest.write_str(&self.0)
    }
}

impl cssparser::ToCss for CssNamespace {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        dest.write_str(&self.0)
    }
}

fn fnv1a(bytes: &[u8]) -> u32 {
    const OFFSET: u32 = 0x811C_9DC5;
    const PRIME: u32 = 0x0100_0193;
    let mut hash = OFFSET;
    for &byte in bytes {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
