//! Calculation of first set function.

use crate::{
    grammar::{Grammar, Production, ProductionID, EPSILON},
    types::{Map, Set},
};

/// FIRST sets of every nonterminal, keyed by name.
///
/// The sets contain terminal names and possibly the epsilon marker `*`,
/// kept in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstSets {
    map: Map<String, Set<String>>,
}

impl FirstSets {
    #[tracing::instrument(skip_all)]
    pub fn new(grammar: &Grammar) -> Self {
        let mut map = init(grammar);

        // 値が更新されなくなるまで繰り返す
        let mut passes = 1;
        while update(grammar, &mut map) {
            passes += 1;
        }
        tracing::trace!("FIRST sets converged after {} passes", passes);

        Self { map }
    }

    pub fn get(&self, nonterminal: &str) -> Option<&Set<String>> {
        self.map.get(nonterminal)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Set<String>)> + '_ {
        self.map.iter().map(|(name, set)| (name.as_str(), set))
    }
}

/// Allocate an empty set for each nonterminal, in order of first appearance
/// on a left-hand side.
fn init(grammar: &Grammar) -> Map<String, Set<String>> {
    let mut map = Map::default();
    for (_, production) in user_productions(grammar) {
        map.entry(production.left().name().to_owned())
            .or_insert_with(Set::default);
    }
    map
}

/// Perform one full pass over the productions.
///
/// Returns `true` if any set has grown.
fn update(grammar: &Grammar, map: &mut Map<String, Set<String>>) -> bool {
    let mut changed = false;

    for (_, production) in user_productions(grammar) {
        let left = production.left().name();

        if production.is_epsilon() {
            changed |= insert(map, left, EPSILON);
            continue;
        }

        for symbol in production.right() {
            if symbol.is_terminal() {
                changed |= insert(map, left, symbol.name());
                break;
            }

            // First(X) \supseteq First(Y) - {*}
            let added: Vec<String> = match map.get(symbol.name()) {
                Some(first) => first.iter().filter(|t| *t != EPSILON).cloned().collect(),
                None => vec![],
            };
            for terminal in &added {
                changed |= insert(map, left, terminal);
            }

            let nullable = map
                .get(symbol.name())
                .map_or(false, |first| first.contains(EPSILON));
            if !nullable {
                break;
            }
        }
    }

    changed
}

fn insert(map: &mut Map<String, Set<String>>, left: &str, terminal: &str) -> bool {
    match map.get_mut(left) {
        Some(set) if !set.contains(terminal) => set.insert(terminal.to_owned()),
        _ => false,
    }
}

// The synthetic `S' -> S` never takes part in FIRST computation.
fn user_productions(
    grammar: &Grammar,
) -> impl Iterator<Item = (ProductionID, &Production)> + '_ {
    grammar
        .productions()
        .filter(|(id, _)| *id != ProductionID::ACCEPT)
}
