//! Grammar types.

use crate::{
    syntax::{self as s, SyntaxError, SyntaxErrorKind},
    types::{Map, Set},
    util::display_fn,
};
use serde::{ser::Serializer, Serialize};
use std::{
    fmt, fs,
    hash::{Hash, Hasher},
    io,
    marker::PhantomData,
    path::Path,
};

/// Reserved terminal name that means the end of input.
pub const EOI: &str = "$";

/// Reserved name of the epsilon marker on a right-hand side.
pub const EPSILON: &str = "*";

/// A grammar symbol.
///
/// Symbols are compared and hashed by their name only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    name: String,
    is_terminal: bool,
}

impl Symbol {
    pub fn terminal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_terminal: true,
        }
    }

    pub fn nonterminal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_terminal: false,
        }
    }

    /// The epsilon marker, which is treated as a terminal symbol.
    pub fn epsilon() -> Self {
        Self::terminal(EPSILON)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    pub fn is_epsilon(&self) -> bool {
        self.name == EPSILON
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionID {
    raw: u32,
}

impl ProductionID {
    /// The synthetic production `S' -> S` of the augmented grammar.
    pub const ACCEPT: Self = Self::new(0);

    #[inline]
    const fn new(raw: u32) -> Self {
        Self { raw }
    }

    #[inline]
    fn index(self) -> usize {
        self.raw as usize
    }
}

/// The type that represents a production rule in grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Production {
    #[serde(rename = "leftHandSide")]
    left: Symbol,
    #[serde(rename = "rightHandSide")]
    right: Vec<Symbol>,
}

impl Production {
    pub fn new(left: Symbol, right: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            left,
            right: right.into_iter().collect(),
        }
    }

    /// Return the left-hand side of this production.
    pub fn left(&self) -> &Symbol {
        &self.left
    }

    /// Return the right-hand side of this production.
    pub fn right(&self) -> &[Symbol] {
        &self.right[..]
    }

    /// Whether the right-hand side is exactly the epsilon marker.
    pub fn is_epsilon(&self) -> bool {
        matches!(&self.right[..], [symbol] if symbol.is_epsilon())
    }
}

impl fmt::Display for Production {
    // `"LHS -> R1 R2 R3"`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.left)?;
        for symbol in &self.right {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

/// The augmented grammar used to derive the automaton.
///
/// The production list always starts with the synthetic rule `S' -> S`,
/// followed by the user-supplied productions in their original order.
#[derive(Debug)]
#[non_exhaustive]
pub struct Grammar {
    productions: Vec<Production>,
    by_left: Map<String, Vec<ProductionID>>,
    terminals: Set<Symbol>,
    nonterminals: Set<Symbol>,
}

impl Grammar {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Grammar, GrammarDefError> {
        let source = fs::read_to_string(path).map_err(GrammarDefError::IO)?;
        Self::from_str(&source)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(source: &str) -> Result<Grammar, GrammarDefError> {
        let rules = s::parse(source)?;
        Grammar::define(|g| define_grammar_from_syntax(g, rules))
    }

    /// Build a grammar from an ordered list of productions.
    ///
    /// The left-hand side of the first production becomes the start symbol.
    pub fn from_productions<I>(productions: I) -> Result<Grammar, GrammarDefError>
    where
        I: IntoIterator<Item = Production>,
    {
        Grammar::define(|g| {
            for production in productions {
                g.rule(production.left, production.right)?;
            }
            Ok(())
        })
    }

    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef<'_>) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef {
            terminals: Set::default(),
            nonterminals: Set::default(),
            productions: vec![],
            _marker: PhantomData,
        };

        f(&mut def)?;

        def.end()
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[id.index()]
    }

    /// Iterate over all productions, including the synthetic `S' -> S`.
    pub fn productions(&self) -> impl Iterator<Item = (ProductionID, &Production)> + '_ {
        self.productions
            .iter()
            .enumerate()
            .map(|(i, p)| (ProductionID::new(i as u32), p))
    }

    /// Iterate over the productions whose left-hand side is `name`, in grammar order.
    pub fn productions_of<'g>(
        &'g self,
        name: &str,
    ) -> impl Iterator<Item = (ProductionID, &'g Production)> + 'g {
        self.by_left
            .get(name)
            .map(|ids| &ids[..])
            .unwrap_or(&[])
            .iter()
            .map(move |id| (*id, self.production(*id)))
    }

    /// The left-hand side of the first user-supplied production.
    pub fn start_symbol(&self) -> &Symbol {
        &self.production(ProductionID::ACCEPT).right[0]
    }

    /// The synthetic start symbol `S'`.
    pub fn accept_symbol(&self) -> &Symbol {
        &self.production(ProductionID::ACCEPT).left
    }

    pub fn terminals(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.terminals.iter()
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.nonterminals.iter()
    }

    pub fn display(&self) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            writeln!(f, "## terminals:")?;
            for terminal in &self.terminals {
                writeln!(f, "{}", terminal)?;
            }

            writeln!(f, "\n## nonterminals:")?;
            for nonterminal in &self.nonterminals {
                write!(f, "{}", nonterminal)?;
                if nonterminal == self.start_symbol() {
                    write!(f, " (start)")?;
                }
                writeln!(f)?;
            }

            writeln!(f, "\n## rules:")?;
            for (_, production) in self.productions().skip(1) {
                writeln!(f, "{}", production)?;
            }

            Ok(())
        })
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.display(), f)
    }
}

// Only the user-supplied productions are exported.
impl Serialize for Grammar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.productions.iter().skip(1))
    }
}

fn define_grammar_from_syntax(
    g: &mut GrammarDef<'_>,
    rules: Vec<s::RuleDesc>,
) -> Result<(), GrammarDefError> {
    let defined: Set<&str> = rules.iter().map(|rule| rule.left.as_str()).collect();
    for rule in &rules {
        for elem in rule.productions.iter().flatten() {
            if let s::ProductionElem::Nonterminal(name) = elem {
                if !defined.contains(name.as_str()) {
                    return Err(SyntaxError::new(
                        rule.line,
                        SyntaxErrorKind::UndefinedNonterminal(name.clone()),
                    )
                    .into());
                }
            }
        }
    }

    for rule in rules {
        let left = Symbol::nonterminal(rule.left);
        for production in rule.productions {
            let right = production.into_iter().map(|elem| match elem {
                s::ProductionElem::Terminal(name) => Symbol::terminal(name),
                s::ProductionElem::Nonterminal(name) => Symbol::nonterminal(name),
                s::ProductionElem::Epsilon => Symbol::epsilon(),
            });
            g.rule(left.clone(), right)?;
        }
    }

    Ok(())
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef<'def> {
    terminals: Set<Symbol>,
    nonterminals: Set<Symbol>,
    productions: Vec<Production>,
    _marker: PhantomData<&'def mut ()>,
}

impl<'def> GrammarDef<'def> {
    /// Declare a terminal symbol used in this grammar.
    pub fn terminal(&mut self, name: &str) -> Result<Symbol, GrammarDefError> {
        let symbol = Symbol::terminal(name);
        if self.terminals.contains(&symbol) {
            return Err(format!("The terminal `{}' has already been declared", name).into());
        }
        self.register(&symbol)?;
        Ok(symbol)
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(&mut self, name: &str) -> Result<Symbol, GrammarDefError> {
        let symbol = Symbol::nonterminal(name);
        if self.nonterminals.contains(&symbol) {
            return Err(format!("The nonterminal `{}' has already been declared", name).into());
        }
        self.register(&symbol)?;
        Ok(symbol)
    }

    /// Return the epsilon marker, for use as the sole symbol of a right-hand side.
    pub fn epsilon(&self) -> Symbol {
        Symbol::epsilon()
    }

    /// Specify a production rule into this grammer.
    ///
    /// Symbols that have not been declared yet are registered implicitly.
    pub fn rule<I>(&mut self, left: Symbol, right: I) -> Result<(), GrammarDefError>
    where
        I: IntoIterator<Item = Symbol>,
    {
        if left.is_terminal() {
            return Err(format!("The terminal `{}' cannot be used as a left-hand side", left).into());
        }

        let right: Vec<Symbol> = right.into_iter().collect();
        if right.is_empty() {
            return Err(format!(
                "The production of `{}' has an empty right-hand side; use `{}' for epsilon",
                left, EPSILON
            )
            .into());
        }
        if right.len() > 1 && right.iter().any(Symbol::is_epsilon) {
            return Err(format!(
                "The epsilon marker `{}' must be the only symbol in a production of `{}'",
                EPSILON, left
            )
            .into());
        }

        self.register(&left)?;
        for symbol in right.iter().filter(|symbol| !symbol.is_epsilon()) {
            self.register(symbol)?;
        }

        let production = Production { left, right };
        if self.productions.contains(&production) {
            return Err(format!("Duplicate production rule detected: {}", production).into());
        }
        if u32::try_from(self.productions.len() + 1).is_err() {
            return Err("too many production rules".into());
        }
        self.productions.push(production);

        Ok(())
    }

    fn register(&mut self, symbol: &Symbol) -> Result<(), GrammarDefError> {
        if !verify_ident(symbol.name()) {
            return Err(format!("incorrect symbol name: `{}'", symbol.name()).into());
        }

        let (same, other) = if symbol.is_terminal() {
            (&mut self.terminals, &self.nonterminals)
        } else {
            (&mut self.nonterminals, &self.terminals)
        };
        if other.contains(symbol) {
            return Err(format!(
                "The symbol `{}' is used both as a terminal and as a nonterminal",
                symbol.name()
            )
            .into());
        }
        same.insert(symbol.clone());

        Ok(())
    }

    fn end(self) -> Result<Grammar, GrammarDefError> {
        let start = match self.productions.first() {
            Some(production) => production.left.clone(),
            None => return Err("empty production rules".into()),
        };

        let mut by_left: Map<String, Vec<ProductionID>> = Map::default();
        let accept = Production {
            left: Symbol::nonterminal(format!("{}'", start.name())),
            right: vec![start],
        };
        let productions: Vec<Production> = Some(accept).into_iter().chain(self.productions).collect();
        for (i, production) in productions.iter().enumerate() {
            by_left
                .entry(production.left.name.clone())
                .or_default()
                .push(ProductionID::new(i as u32));
        }

        // 右辺に現れる非終端記号はすべて導出規則を持っていなければならない
        for nonterminal in &self.nonterminals {
            if !by_left.contains_key(nonterminal.name()) {
                return Err(format!(
                    "The nonterminal `{}' has no associated production rule",
                    nonterminal
                )
                .into());
            }
        }

        Ok(Grammar {
            productions,
            by_left,
            terminals: self.terminals,
            nonterminals: self.nonterminals,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("IO error: {}", _0)]
    IO(io::Error),

    #[error("Syntax error: {}", _0)]
    Syntax(#[from] SyntaxError),

    #[error("Other error: {}", msg)]
    Other { msg: String },
}
impl From<&str> for GrammarDefError {
    fn from(msg: &str) -> Self {
        Self::Other { msg: msg.into() }
    }
}
impl From<String> for GrammarDefError {
    fn from(msg: String) -> Self {
        Self::Other { msg }
    }
}

fn verify_ident(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    if matches!(name, EOI | EPSILON | s::ARROW | s::CHOICE) {
        // reserved by the grammar format.
        return false;
    }
    // `'` is used for naming the augmented start symbol.
    !name.chars().any(|ch| ch.is_whitespace() || ch == '\'')
}
