//! Stylesheet ingestion (§4.8): a thin layer over `cssparser::StyleSheetParser`
//! that hands the Simple-CSS Builder a flat list of source rules. Modeled on
//! the teacher's `css::parser::StylesheetParser`/`RuleCollector` pair, with
//! the same per-rule error recovery (`CssParseOptions::recover_from_errors`)
//! and declaration-scanning loop, restyled around this engine's narrower
//! "property:value" string pairs instead of a typed `Property` enum.

use cssparser::{CowRcStr, Parser, ParserInput, ParserState, StyleSheetParser, Token};

use crate::selector::{self, Simple};

/// One `selector { prop: value; ... }` rule, with enough bookkeeping for the
/// builder to bucket and order it (§4.7).
#[derive(Debug, Clone)]
pub struct SourceRule {
    pub selector_text: String,
    pub selector: selectors::parser::Selector<Simple>,
    pub declarations: Vec<(String, String)>,
    /// 1-based source line of the rule's selector.
    pub line: u32,
}

/// Parses a stylesheet, skipping (with a logged warning) any rule whose
/// selector fails to parse, rather than aborting the whole sheet — this
/// mirrors the teacher's `recover_from_errors` fallback. `cssparser`'s
/// tokenizer has no unrecoverable-input case of its own (every malformed
/// token has a defined recovery), and every rule-level failure is already
/// caught and skipped here, so this can never fail: there is no genuine
/// error to report to the caller.
pub fn parse_stylesheet(css: &str) -> Vec<SourceRule> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut collector = RuleCollector::default();
    let mut stylesheet = StyleSheetParser::new(&mut parser, &mut collector);

    let mut rules = Vec::new();
    for result in &mut stylesheet {
        match result {
            Ok(rule) => rules.push(rule),
            Err((err, slice)) => {
                tracing::warn!(error = %err, near = %slice.trim(), "skipping unparseable rule");
            }
        }
    }
    rules
}

#[derive(Default)]
struct RuleCollector;

#[derive(Debug)]
enum RuleParseError {
    EmptySelector,
    InvalidSelector(String),
    UnsupportedAtRule(String),
}

impl std::fmt::Display for RuleParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleParseError::EmptySelector => write!(f, "selector cannot be empty"),
            RuleParseError::InvalidSelector(reason) => write!(f, "{reason}"),
            RuleParseError::UnsupportedAtRule(reason) => write!(f, "{reason}"),
        }
    }
}

impl<'i> cssparser::QualifiedRuleParser<'i> for RuleCollector {
    type Prelude = (String, selectors::parser::Selector<Simple>, u32);
    type QualifiedRule = SourceRule;
    type Error = RuleParseError;

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, cssparser::ParseError<'i, Self::Error>> {
        let line = input.current_source_location().line;
        let mut buffer = String::new();
        while let Ok(token) = input.next_including_whitespace_and_comments() {
            match token {
                Token::WhiteSpace(_) => {
                    if !buffer.ends_with(' ') && !buffer.is_empty() {
                        buffer.push(' ');
                    }
                }
                Token::Comment(_) => {}
                _ => buffer.push_str(&token.to_css_string()),
            }
        }

        let selector_text = buffer.trim().to_string();
        if selector_text.is_empty() {
            return Err(input.new_custom_error(RuleParseError::EmptySelector));
        }

        match selector::parse_single_selector(&selector_text) {
            Ok(selector) => Ok((selector_text, selector, line)),
            Err(err) => Err(input.new_custom_error(RuleParseError::InvalidSelector(err.to_string()))),
        }
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, cssparser::ParseError<'i, Self::Error>> {
        let (selector_text, selector, line) = prelude;
        let declarations = parse_declarations(input);
        Ok(SourceRule { selector_text, selector, declarations, line })
    }
}

impl<'i> cssparser::AtRuleParser<'i> for RuleCollector {
    type Prelude = ();
    type AtRule = SourceRule;
    type Error = RuleParseError;

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, cssparser::ParseError<'i, Self::Error>> {
        // `@media`/`@keyframes`/`@font-face` remain non-goals; any at-rule is
        // rejected and recovered from by the caller's per-rule skip.
        Err(input.new_custom_error(RuleParseError::UnsupportedAtRule(format!("unsupported at-rule @{name}"))))
    }

    fn rule_without_block(&mut self, _prelude: Self::Prelude, _start: &ParserState) -> Result<Self::AtRule, ()> {
        Err(())
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, cssparser::ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(RuleParseError::UnsupportedAtRule("unsupported at-rule".into())))
    }
}

/// Scans a declaration block into `"property:value"` pairs without
/// validating the values (§4.8's explicit non-goal); a declaration that
/// can't even be split into a name and a value is skipped.
fn parse_declarations(parser: &mut Parser<'_, '_>) -> Vec<(String, String)> {
    let mut declarations = Vec::new();

    while !parser.is_exhausted() {
        parser.skip_whitespace();
        if parser.is_exhausted() {
            break;
        }

        let name = match parser.try_parse(|input| input.expect_ident().map(|ident| ident.to_string())) {
            Ok(name) => name,
            Err(_) => {
                skip_until_semicolon(parser);
                continue;
            }
        };

        if parser.expect_colon().is_err() {
            skip_until_semicolon(parser);
            continue;
        }

        let value_start = parser.state();
        let mut value_end = None;
        loop {
            let before = parser.state();
            match parser.next_including_whitespace_and_comments() {
                Ok(Token::Semicolon) => {
                    value_end = Some(before);
                    break;
                }
                Ok(_) => {}
                Err(_) => {
                    value_end = Some(parser.state());
                    break;
                }
            }
        }

        let Some(end_state) = value_end else { continue };
        let raw_value = parser.slice(value_start.position()..end_state.position()).trim().to_string();
        if raw_value.is_empty() {
            continue;
        }
        declarations.push((name, raw_value));
    }

    declarations
}

fn skip_until_semicolon(parser: &mut Parser<'_, '_>) {
    while let Ok(token) = parser.next_including_whitespace_and_comments() {
        if matches!(token, Token::Semicolon) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_rule() {
        let rules = parse_stylesheet(".a { color: red; }");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selector_text, ".a");
        assert_eq!(rules[0].declarations, vec![("color".to_string(), "red".to_string())]);
        assert_eq!(rules[0].line, 1);
    }

    #[test]
    fn skips_rule_with_bad_selector_but_keeps_the_rest() {
        let css = ":::broken { color: red; }\n.b { color: blue; }";
        let rules = parse_stylesheet(css);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selector_text, ".b");
    }

    #[test]
    fn records_multiple_declarations_and_line_numbers() {
        let css = ".a { color: red; }\n.b { color: blue; background: white; }";
        let rules = parse_stylesheet(css);
        assert_eq!(rules[0].line, 1);
        assert_eq!(rules[1].line, 2);
        assert_eq!(rules[1].declarations.len(), 2);
    }

    #[test]
    fn skips_at_rules() {
        let css = "@media screen { .a { color: red; } }\n.b { color: blue; }";
        let rules = parse_stylesheet(css);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selector_text, ".b");
    }
}
