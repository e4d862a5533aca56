//! # Selectors
//!
//! Affordance rules address content with a small CSS selector subset:
//!
//! - type selectors (`li`) and the universal selector (`*`)
//! - class (`.skill-card`) and id (`#skills-container`) selectors
//! - negation of a simple compound (`span:not(.add-tag)`)
//! - the descendant combinator (`.skill-card ul`)
//! - comma separated lists (`h1, h2, h3`)
//!
//! Matching runs against an element plus its ancestor chain, so selectors
//! can be evaluated while walking a tree without parent pointers.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use logos::Logos;
use thiserror::Error;

use crate::document::Element;

/// Byte range within the selector source
pub type Span = Range<usize>;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'src> {
    #[token(".")]
    Dot,
    #[token("#")]
    Hash,
    #[token(",")]
    Comma,
    #[token("*")]
    Star,
    #[token(":not(")]
    NotOpen,
    #[token(")")]
    Close,

    // Whitespace is significant: it is the descendant combinator
    #[regex(r"[ \t\r\n]+")]
    Space,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*", |lex| lex.slice())]
    Ident(&'src str),
}

impl Token<'_> {
    fn describe(&self) -> String {
        match self {
            Token::Dot => "'.'".to_string(),
            Token::Hash => "'#'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Star => "'*'".to_string(),
            Token::NotOpen => "':not('".to_string(),
            Token::Close => "')'".to_string(),
            Token::Space => "whitespace".to_string(),
            Token::Ident(name) => format!("identifier '{}'", name),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Invalid character at {span:?} in selector {selector:?}")]
    InvalidCharacter { selector: String, span: Span },

    #[error("Unexpected {found} at {span:?} in selector {selector:?}: expected {expected}")]
    UnexpectedToken {
        selector: String,
        span: Span,
        found: String,
        expected: String,
    },

    #[error("Unexpected end of selector {selector:?}: expected {expected}")]
    UnexpectedEnd { selector: String, expected: String },
}

/// A compound selector: everything that must hold for a single element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    negations: Vec<Compound>,
}

impl Compound {
    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !element.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if let Some(id) = &self.id {
            if element.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }

        if !self.classes.iter().all(|class| element.has_class(class)) {
            return false;
        }

        !self.negations.iter().any(|negation| negation.matches(element))
    }
}

/// Compounds joined by descendant combinators, outermost first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Compound>,
}

impl Selector {
    /// `ancestors` is ordered from the root down to the element's parent.
    pub fn matches(&self, element: &Element, ancestors: &[&Element]) -> bool {
        let Some((subject, outer)) = self.compounds.split_last() else {
            return false;
        };

        if !subject.matches(element) {
            return false;
        }

        // Descendant-only chains can be matched greedily from the nearest ancestor outwards
        let mut remaining = ancestors.len();
        for compound in outer.iter().rev() {
            match ancestors[..remaining]
                .iter()
                .rposition(|ancestor| compound.matches(ancestor))
            {
                Some(position) => remaining = position,
                None => return false,
            }
        }

        true
    }
}

/// A parsed, comma separated selector list
///
/// A blank source parses to an empty list that matches nothing, which lets
/// configuration switch a rule off with `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    source: String,
    selectors: Vec<Selector>,
}

impl SelectorList {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let tokens = lex(source)?;
        if tokens.is_empty() {
            return Ok(Self::empty());
        }

        let mut parser = Parser {
            source,
            tokens,
            pos: 0,
        };
        let selectors = parser.parse_list()?;

        Ok(Self {
            source: source.trim().to_string(),
            selectors,
        })
    }

    pub fn empty() -> Self {
        Self {
            source: String::new(),
            selectors: Vec::new(),
        }
    }

    pub fn matches(&self, element: &Element, ancestors: &[&Element]) -> bool {
        self.selectors
            .iter()
            .any(|selector| selector.matches(element, ancestors))
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn lex(source: &str) -> Result<Vec<(Token<'_>, Span)>, SelectorError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                return Err(SelectorError::InvalidCharacter {
                    selector: source.to_string(),
                    span,
                })
            }
        }
    }
    Ok(drop_insignificant_space(tokens))
}

/// Whitespace only acts as a combinator between two compounds; around
/// commas, inside `:not(...)` and at either end it is padding.
fn drop_insignificant_space(tokens: Vec<(Token<'_>, Span)>) -> Vec<(Token<'_>, Span)> {
    let mut kept: Vec<(Token<'_>, Span)> = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();

    while let Some((token, span)) = iter.next() {
        if token == Token::Space {
            let after_boundary = matches!(
                kept.last(),
                None | Some((Token::Comma | Token::NotOpen, _))
            );
            let before_boundary = matches!(
                iter.peek(),
                None | Some((Token::Comma | Token::Close, _))
            );
            if after_boundary || before_boundary {
                continue;
            }
        }
        kept.push((token, span));
    }

    kept
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(Token<'src>, Span)>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn parse_list(&mut self) -> Result<Vec<Selector>, SelectorError> {
        let mut selectors = vec![self.parse_selector()?];
        while self.eat(Token::Comma) {
            selectors.push(self.parse_selector()?);
        }

        if self.peek().is_some() {
            return Err(self.unexpected("',' or end of selector"));
        }

        Ok(selectors)
    }

    fn parse_selector(&mut self) -> Result<Selector, SelectorError> {
        let mut compounds = vec![self.parse_compound(true)?];
        while self.eat(Token::Space) {
            compounds.push(self.parse_compound(true)?);
        }
        Ok(Selector { compounds })
    }

    fn parse_compound(&mut self, allow_negation: bool) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut consumed = false;

        match self.peek() {
            Some(Token::Ident(name)) => {
                compound.tag = Some(name.to_ascii_lowercase());
                self.pos += 1;
                consumed = true;
            }
            Some(Token::Star) => {
                self.pos += 1;
                consumed = true;
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    compound.classes.push(self.expect_ident("a class name")?);
                }
                Some(Token::Hash) => {
                    self.pos += 1;
                    compound.id = Some(self.expect_ident("an id")?);
                }
                Some(Token::NotOpen) if allow_negation => {
                    self.pos += 1;
                    compound.negations.push(self.parse_compound(false)?);
                    if !self.eat(Token::Close) {
                        return Err(self.unexpected("')'"));
                    }
                }
                _ => break,
            }
            consumed = true;
        }

        if !consumed {
            return Err(self.unexpected("a tag, '*', '.', '#' or ':not('"));
        }

        Ok(compound)
    }

    fn expect_ident(&mut self, expected: &str) -> Result<String, SelectorError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok(name.to_string())
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).map(|(token, _)| *token)
    }

    fn eat(&mut self, expected: Token<'src>) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> SelectorError {
        match self.tokens.get(self.pos) {
            Some((token, span)) => SelectorError::UnexpectedToken {
                selector: self.source.to_string(),
                span: span.clone(),
                found: token.describe(),
                expected: expected.to_string(),
            },
            None => SelectorError::UnexpectedEnd {
                selector: self.source.to_string(),
                expected: expected.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tag: &str, classes: &[&str]) -> Element {
        let mut element = Element::new(tag);
        for class in classes {
            element = element.with_class(*class);
        }
        element
    }

    #[test]
    fn test_parse_type_class_and_id() {
        let list = SelectorList::parse("li.skill#first").unwrap();
        let element = el("li", &["skill"]).with_id("first");
        assert!(list.matches(&element, &[]));
        assert!(!list.matches(&el("li", &["skill"]), &[]));
    }

    #[test]
    fn test_tag_matching_is_case_insensitive() {
        let list = SelectorList::parse("LI").unwrap();
        assert!(list.matches(&el("li", &[]), &[]));
    }

    #[test]
    fn test_negation() {
        let list = SelectorList::parse("span:not(.add-tag)").unwrap();
        assert!(list.matches(&el("span", &[]), &[]));
        assert!(!list.matches(&el("span", &["add-tag"]), &[]));
    }

    #[test]
    fn test_chained_negations() {
        let list = SelectorList::parse("li:not(.add-skill-item):not(.add-resp-item)").unwrap();
        assert!(list.matches(&el("li", &[]), &[]));
        assert!(!list.matches(&el("li", &["add-skill-item"]), &[]));
        assert!(!list.matches(&el("li", &["add-resp-item"]), &[]));
    }

    #[test]
    fn test_descendant_combinator() {
        let list = SelectorList::parse(".skill-card ul").unwrap();
        let card = el("div", &["skill-card"]);
        let wrapper = el("div", &["body"]);
        let ul = el("ul", &[]);

        assert!(list.matches(&ul, &[&card]));
        assert!(list.matches(&ul, &[&card, &wrapper]));
        assert!(!list.matches(&ul, &[&wrapper]));
        assert!(!list.matches(&ul, &[]));
    }

    #[test]
    fn test_descendant_chain_respects_order() {
        let list = SelectorList::parse("section .card p").unwrap();
        let section = el("section", &[]);
        let card = el("div", &["card"]);
        let p = el("p", &[]);

        assert!(list.matches(&p, &[&section, &card]));
        assert!(!list.matches(&p, &[&card, &section]));
    }

    #[test]
    fn test_comma_list_with_padding() {
        let list = SelectorList::parse("  h1 ,h2,  .cert-item  ").unwrap();
        assert_eq!(list.as_str(), "h1 ,h2,  .cert-item");
        assert!(list.matches(&el("h1", &[]), &[]));
        assert!(list.matches(&el("h2", &[]), &[]));
        assert!(list.matches(&el("div", &["cert-item"]), &[]));
        assert!(!list.matches(&el("h3", &[]), &[]));
    }

    #[test]
    fn test_universal_selector() {
        let list = SelectorList::parse(".project-tags *").unwrap();
        let tags = el("div", &["project-tags"]);
        assert!(list.matches(&el("span", &[]), &[&tags]));
    }

    #[test]
    fn test_blank_selector_matches_nothing() {
        let list = SelectorList::parse("   ").unwrap();
        assert!(list.is_empty());
        assert!(!list.matches(&el("p", &[]), &[]));
    }

    #[test]
    fn test_invalid_character() {
        let err = SelectorList::parse("li > a").unwrap_err();
        assert!(matches!(err, SelectorError::InvalidCharacter { span, .. } if span == (3..4)));
    }

    #[test]
    fn test_trailing_comma_is_rejected() {
        let err = SelectorList::parse("h1,").unwrap_err();
        assert!(matches!(err, SelectorError::UnexpectedEnd { .. }));
    }

    #[test]
    fn test_unclosed_negation_is_rejected() {
        let err = SelectorList::parse("span:not(.x").unwrap_err();
        assert!(matches!(err, SelectorError::UnexpectedEnd { ref expected, .. } if expected == "')'"));
    }

    #[test]
    fn test_dangling_dot_is_rejected() {
        let err = SelectorList::parse("li..x").unwrap_err();
        assert!(matches!(err, SelectorError::UnexpectedToken { ref found, .. } if found == "'.'"));
    }
}
