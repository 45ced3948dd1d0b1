//! Syntax support for the line-oriented grammar file.
//!
//! ```text
//! # comment
//! expr   ---> expr PLUS term | term
//! term   ---> NUM
//! opt    ---> *
//! ```
//!
//! Nonterminals are written in lowercase letters and terminals in uppercase
//! letters. A lone `*` denotes the empty production.

use crate::grammar::EPSILON;

pub(crate) const ARROW: &str = "--->";
pub(crate) const CHOICE: &str = "|";

/// A rule line, `left ---> alt1 | alt2 | ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDesc {
    /// 1-based line number.
    pub line: usize,
    pub left: String,
    pub productions: Vec<Vec<ProductionElem>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductionElem {
    Terminal(String),
    Nonterminal(String),
    Epsilon,
}

#[derive(Debug, thiserror::Error)]
#[error("line {}: {}", line, kind)]
pub struct SyntaxError {
    line: usize,
    kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub(crate) fn new(line: usize, kind: SyntaxErrorKind) -> Self {
        Self { line, kind }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn kind(&self) -> &SyntaxErrorKind {
        &self.kind
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SyntaxErrorKind {
    #[error("malformed production rule")]
    Malformed,

    #[error("`{}' is an invalid nonterminal on the left-hand side", _0)]
    InvalidLeft(String),

    #[error("expected `{}' after the left-hand side, found `{}'", ARROW, _0)]
    MissingArrow(String),

    #[error("`{}' is an invalid symbol on the right-hand side", _0)]
    InvalidSymbol(String),

    #[error("empty alternative on the right-hand side")]
    EmptyAlternative,

    #[error("`{}' must be the only symbol of an alternative", EPSILON)]
    MisplacedEpsilon,

    #[error("the nonterminal `{}' has no production rule", _0)]
    UndefinedNonterminal(String),
}

pub fn parse(source: &str) -> Result<Vec<RuleDesc>, SyntaxError> {
    let span = tracing::trace_span!("parse");
    let _entered = span.enter();

    let mut rules = vec![];
    for (i, line) in source.lines().enumerate() {
        let line_no = i + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let rule = parse_rule(trimmed, line_no).map_err(|kind| SyntaxError::new(line_no, kind))?;
        tracing::trace!("rule at line {}: {:?}", line_no, rule);
        rules.push(rule);
    }

    Ok(rules)
}

fn parse_rule(line: &str, line_no: usize) -> Result<RuleDesc, SyntaxErrorKind> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (left, arrow, rest) = match &tokens[..] {
        [left, arrow, rest @ ..] if !rest.is_empty() => (*left, *arrow, rest),
        _ => return Err(SyntaxErrorKind::Malformed),
    };
    if !is_nonterminal(left) {
        return Err(SyntaxErrorKind::InvalidLeft(left.to_owned()));
    }
    if arrow != ARROW {
        return Err(SyntaxErrorKind::MissingArrow(arrow.to_owned()));
    }

    let mut productions = vec![];
    let mut elems = vec![];
    for token in rest.iter().copied().chain(Some(CHOICE)) {
        if token == CHOICE {
            if elems.is_empty() {
                return Err(SyntaxErrorKind::EmptyAlternative);
            }
            if elems.len() > 1 && elems.contains(&ProductionElem::Epsilon) {
                return Err(SyntaxErrorKind::MisplacedEpsilon);
            }
            productions.push(std::mem::take(&mut elems));
            continue;
        }

        let elem = if token == EPSILON {
            ProductionElem::Epsilon
        } else if is_nonterminal(token) {
            ProductionElem::Nonterminal(token.to_owned())
        } else if is_terminal(token) {
            ProductionElem::Terminal(token.to_owned())
        } else {
            return Err(SyntaxErrorKind::InvalidSymbol(token.to_owned()));
        };
        elems.push(elem);
    }

    Ok(RuleDesc {
        line: line_no,
        left: left.to_owned(),
        productions,
    })
}

fn is_nonterminal(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_lowercase())
}

fn is_terminal(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_uppercase())
}
