//! The implementation of LR(1) automaton.

use crate::{
    first_sets::FirstSets,
    grammar::{Grammar, ProductionID, Symbol, EOI},
    types::{Map, Set},
    util::display_fn,
};
use serde::Serialize;
use std::{collections::VecDeque, fmt};

#[derive(Debug, Clone)]
pub struct Config {
    merge_states: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub const fn new() -> Self {
        Self { merge_states: true }
    }

    /// Keep the automaton exactly as discovered by the goto expansion.
    ///
    /// The result may contain states with several transitions labeled
    /// with the same symbol.
    pub fn skip_merge(&mut self) -> &mut Self {
        self.merge_states = false;
        self
    }

    /// Construct the LR(1) automaton of the specified grammar.
    #[tracing::instrument(skip_all)]
    pub fn generate<'g>(&self, grammar: &'g Grammar) -> Automaton<'g> {
        let first_sets = FirstSets::new(grammar);

        // [S' -> @ S] {$}
        let seed = Item::new(ProductionID::ACCEPT, 0, EOI);
        let start = closure(grammar, &first_sets, seed);

        let states = expand(grammar, &first_sets, start)
            .into_iter()
            .enumerate()
            .map(|(i, state)| (StateID::from_index(i), state))
            .collect();
        let mut automaton = Automaton { grammar, states };
        tracing::debug!("discovered {} states", automaton.states.len());

        if self.merge_states {
            automaton.merge_states();
        }

        automaton
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct StateID {
    raw: u32,
}

impl StateID {
    /// The closure of the augmented start item.
    pub const START: Self = Self::from_raw(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    pub const fn raw(self) -> u32 {
        self.raw
    }

    fn from_index(index: usize) -> Self {
        Self::from_raw(u32::try_from(index).expect("too many states"))
    }
}

impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.raw)
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// LR(1) item.
///
/// A production with a marker position and a single lookahead symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item {
    production: ProductionID,
    dot: usize,
    lookahead: String,
}

impl Item {
    pub fn new(production: ProductionID, dot: usize, lookahead: impl Into<String>) -> Self {
        Self {
            production,
            dot,
            lookahead: lookahead.into(),
        }
    }

    pub fn production(&self) -> ProductionID {
        self.production
    }

    pub fn dot(&self) -> usize {
        self.dot
    }

    pub fn lookahead(&self) -> &str {
        &self.lookahead
    }

    /// The symbol right after the marker, if any.
    pub fn next_symbol<'g>(&self, g: &'g Grammar) -> Option<&'g Symbol> {
        g.production(self.production).right().get(self.dot)
    }

    pub fn is_complete(&self, g: &Grammar) -> bool {
        self.dot >= g.production(self.production).right().len()
    }

    fn advance(&self) -> Self {
        Self {
            dot: self.dot + 1,
            ..self.clone()
        }
    }

    /// Compare two items by their left-hand side name, marker position,
    /// right-hand side names and lookahead.
    pub fn same_as(&self, other: &Item, g: &Grammar) -> bool {
        let (p1, p2) = (g.production(self.production), g.production(other.production));
        p1.left().name() == p2.left().name()
            && self.dot == other.dot
            && p1.right().len() == p2.right().len()
            && p1
                .right()
                .iter()
                .zip(p2.right())
                .all(|(s1, s2)| s1.name() == s2.name())
            && self.lookahead == other.lookahead
    }

    // `"LHS ---> R1 . R2    la"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let production = g.production(self.production);
            write!(f, "{} --->", production.left())?;
            for (i, symbol) in production.right().iter().enumerate() {
                if i == self.dot {
                    f.write_str(" .")?;
                }
                write!(f, " {}", symbol)?;
            }
            if self.dot >= production.right().len() {
                f.write_str(" .")?;
            }
            write!(f, "    {}", self.lookahead)
        })
    }
}

/// A labeled edge between two states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    symbol: Symbol,
    target: StateID,
}

impl Transition {
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn target(&self) -> StateID {
        self.target
    }
}

/// A node of the automaton.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    rules: Vec<Item>,
    transitions: Vec<Transition>,
}

impl State {
    pub fn rules(&self) -> &[Item] {
        &self.rules[..]
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions[..]
    }
}

#[derive(Debug)]
pub struct Automaton<'g> {
    grammar: &'g Grammar,
    // Indices are never renumbered; merged states leave holes.
    states: Map<StateID, State>,
}

impl<'g> Automaton<'g> {
    pub fn generate(grammar: &'g Grammar) -> Self {
        Config::new().generate(grammar)
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// Iterate over the surviving states in ascending index order.
    pub fn states(&self) -> impl Iterator<Item = (StateID, &State)> + '_ {
        self.states.iter().map(|(id, state)| (*id, state))
    }

    pub fn state(&self, id: StateID) -> Option<&State> {
        self.states.get(&id)
    }

    pub fn start_state(&self) -> &State {
        &self.states[&StateID::START]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Repeat merge passes until a pass performs no merge.
    #[tracing::instrument(skip_all)]
    fn merge_states(&mut self) {
        let mut passes = 1;
        while self.merge_pass() {
            passes += 1;
        }
        tracing::debug!(
            "merging converged after {} passes, {} states remain",
            passes,
            self.states.len()
        );
    }

    /// Resolve the transitions sharing a label within each state.
    ///
    /// Returns `true` if at least one pair of states has been merged.
    fn merge_pass(&mut self) -> bool {
        let mut merged = false;

        let ids: Vec<StateID> = self.states.keys().copied().collect();
        for id in ids {
            // label -> first target seen in this state
            let mut seen: Map<String, StateID> = Map::default();
            let mut index = 0;
            loop {
                // The current state may have been absorbed into another one.
                let Some(state) = self.states.get(&id) else { break };
                let Some(transition) = state.transitions.get(index) else { break };
                let target = transition.target;

                let survivor = match seen.get(transition.symbol.name()) {
                    Some(survivor) => *survivor,
                    None => {
                        seen.insert(transition.symbol.name().to_owned(), target);
                        index += 1;
                        continue;
                    }
                };

                if survivor != target {
                    tracing::trace!(
                        "state {}: merge {} into {} on {}",
                        id,
                        target,
                        survivor,
                        transition.symbol
                    );
                    self.merge_into(survivor, target);
                    for seen_target in seen.values_mut() {
                        if *seen_target == target {
                            *seen_target = survivor;
                        }
                    }
                    merged = true;
                }

                if let Some(state) = self.states.get_mut(&id) {
                    state.transitions.remove(index);
                }
            }
        }

        merged
    }

    /// Append the rules and transitions of `loser` to `survivor`, redirect
    /// every edge to `loser` and drop it.
    fn merge_into(&mut self, survivor: StateID, loser: StateID) {
        let Some(removed) = self.states.shift_remove(&loser) else { return };

        if let Some(state) = self.states.get_mut(&survivor) {
            state.rules.extend(removed.rules);
            state.transitions.extend(removed.transitions);
        }

        for state in self.states.values_mut() {
            for transition in &mut state.transitions {
                if transition.target == loser {
                    transition.target = survivor;
                }
            }
        }
    }

    pub fn display(&self) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            for (id, state) in &self.states {
                writeln!(f, "- id: {:02}", id)?;
                writeln!(f, "  items:")?;
                for item in &state.rules {
                    writeln!(f, "  - {}", item.display(self.grammar))?;
                }
                if !state.transitions.is_empty() {
                    writeln!(f, "  edges:")?;
                    for transition in &state.transitions {
                        writeln!(f, "  - {} -> {:02}", transition.symbol, transition.target)?;
                    }
                }
            }
            Ok(())
        })
    }
}

impl fmt::Display for Automaton<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.display(), f)
    }
}

/// クロージャ展開
///
/// Expand a seed item into its closure. The lookaheads of an added item are
/// derived from the single symbol following the nonterminal being expanded.
fn closure(g: &Grammar, first_sets: &FirstSets, seed: Item) -> State {
    let mut rules = vec![seed.clone()];
    if seed.is_complete(g) {
        return State {
            rules,
            transitions: vec![],
        };
    }

    // nonterminal -> lookaheads already used to expand it
    let mut expanded: Map<&str, Set<String>> = Map::default();
    let mut queue = VecDeque::from([seed]);

    while let Some(item) = queue.pop_front() {
        let right = g.production(item.production).right();

        // [X -> ... @ Y beta]
        let y_symbol = match right.get(item.dot) {
            Some(symbol) if !symbol.is_terminal() => symbol,
            _ => continue,
        };

        let lookaheads: Vec<&str> = match right.get(item.dot + 1) {
            None => vec![item.lookahead()],
            Some(next) if !next.is_terminal() => first_sets
                .get(next.name())
                .map(|first| first.iter().map(String::as_str).collect())
                .unwrap_or_default(),
            Some(next) => vec![next.name()],
        };

        let done = expanded.entry(y_symbol.name()).or_default();
        for (id, _) in g.productions_of(y_symbol.name()) {
            for lookahead in &lookaheads {
                if !done.contains(*lookahead) {
                    let new_item = Item::new(id, 0, *lookahead);
                    rules.push(new_item.clone());
                    queue.push_back(new_item);
                }
            }
        }
        done.extend(lookaheads.iter().map(|l| l.to_string()));
    }

    State {
        rules,
        transitions: vec![],
    }
}

/// Discover every state reachable from `start` by goto transitions.
#[tracing::instrument(skip_all)]
fn expand(g: &Grammar, first_sets: &FirstSets, start: State) -> Vec<State> {
    let mut states = vec![start];

    // 新規に状態が生成されなくなるまで繰り返す
    let mut current = 0;
    while current < states.len() {
        let mut transitions = vec![];

        for i in 0..states[current].rules.len() {
            let item = &states[current].rules[i];
            let symbol = match item.next_symbol(g) {
                Some(symbol) => symbol.clone(),
                None => continue,
            };
            let successor = item.advance();

            // Only the first item of each state is compared.
            let found = states.iter().position(|state| {
                state
                    .rules
                    .first()
                    .map_or(false, |first| first.same_as(&successor, g))
            });
            let target = match found {
                Some(index) => index,
                None => {
                    states.push(closure(g, first_sets, successor));
                    states.len() - 1
                }
            };

            transitions.push(Transition {
                symbol,
                target: StateID::from_index(target),
            });
        }

        tracing::trace!(
            "state {}: {} items, {} transitions",
            current,
            states[current].rules.len(),
            transitions.len()
        );
        states[current].transitions = transitions;
        current += 1;
    }

    states
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textbook() -> Grammar {
        Grammar::define(|g| {
            let s = g.nonterminal("S")?;
            let c = g.nonterminal("C")?;
            let tc = g.terminal("c")?;
            let td = g.terminal("d")?;
            g.rule(s, [c.clone(), c.clone()])?;
            g.rule(c.clone(), [tc, c.clone()])?;
            g.rule(c, [td])?;
            Ok(())
        })
        .unwrap()
    }

    fn items(automaton: &Automaton<'_>, id: u32) -> Vec<String> {
        automaton
            .state(StateID::from_raw(id))
            .unwrap()
            .rules()
            .iter()
            .map(|item| item.display(automaton.grammar()).to_string())
            .collect()
    }

    fn edges(automaton: &Automaton<'_>, id: u32) -> Vec<(String, u32)> {
        automaton
            .state(StateID::from_raw(id))
            .unwrap()
            .transitions()
            .iter()
            .map(|t| (t.symbol().name().to_owned(), t.target().raw()))
            .collect()
    }

    fn edge(name: &str, target: u32) -> (String, u32) {
        (name.to_owned(), target)
    }

    fn ids(automaton: &Automaton<'_>) -> Vec<u32> {
        automaton.states().map(|(id, _)| id.raw()).collect()
    }

    #[test]
    fn closure_of_start_item() {
        let grammar = textbook();
        let first_sets = FirstSets::new(&grammar);
        let state = closure(&grammar, &first_sets, Item::new(ProductionID::ACCEPT, 0, EOI));
        let rules: Vec<String> = state
            .rules()
            .iter()
            .map(|item| item.display(&grammar).to_string())
            .collect();
        assert_eq!(
            rules,
            [
                "S' ---> . S    $",
                "S ---> . C C    $",
                "C ---> . c C    c",
                "C ---> . c C    d",
                "C ---> . d    c",
                "C ---> . d    d",
            ]
        );
        assert!(state.transitions().is_empty());
    }

    #[test]
    fn closure_of_complete_item_is_the_item_itself() {
        let grammar = textbook();
        let first_sets = FirstSets::new(&grammar);
        let seed = Item::new(ProductionID::ACCEPT, 1, EOI);
        let state = closure(&grammar, &first_sets, seed.clone());
        assert_eq!(state.rules(), &[seed]);
    }

    #[test]
    fn closure_takes_first_set_of_following_symbol_only() {
        // The lookaheads of `b` come from FIRST(o) alone, even though `o` is nullable.
        let grammar = Grammar::from_str(
            "\
s ---> b o END
b ---> B
o ---> * | O
",
        )
        .unwrap();
        let first_sets = FirstSets::new(&grammar);
        let state = closure(&grammar, &first_sets, Item::new(ProductionID::ACCEPT, 0, EOI));
        let rules: Vec<String> = state
            .rules()
            .iter()
            .map(|item| item.display(&grammar).to_string())
            .collect();
        assert_eq!(
            rules,
            [
                "s' ---> . s    $",
                "s ---> . b o END    $",
                "b ---> . B    *",
                "b ---> . B    O",
            ]
        );
    }

    #[test]
    fn raw_automaton_textbook() {
        let grammar = textbook();
        let automaton = Config::new().skip_merge().generate(&grammar);
        eprintln!("{}", automaton);

        assert_eq!(ids(&automaton), (0..13).collect::<Vec<_>>());
        assert_eq!(
            edges(&automaton, 0),
            [
                edge("S", 1),
                edge("C", 2),
                edge("c", 3),
                edge("c", 4),
                edge("d", 5),
                edge("d", 6),
            ]
        );
        assert_eq!(
            items(&automaton, 3),
            ["C ---> c . C    c", "C ---> . c C    c", "C ---> . d    c"]
        );
        assert_eq!(edges(&automaton, 3), [edge("C", 10), edge("c", 3), edge("d", 5)]);
        assert_eq!(edges(&automaton, 4), [edge("C", 11), edge("c", 4), edge("d", 6)]);
    }

    #[test]
    fn merged_automaton_textbook() {
        let grammar = textbook();
        let automaton = Automaton::generate(&grammar);
        eprintln!("{}", automaton);

        assert_eq!(ids(&automaton), [0, 1, 2, 3, 5, 7, 8, 9, 10, 12]);

        assert_eq!(
            items(&automaton, 0),
            [
                "S' ---> . S    $",
                "S ---> . C C    $",
                "C ---> . c C    c",
                "C ---> . c C    d",
                "C ---> . d    c",
                "C ---> . d    d",
            ]
        );
        assert_eq!(
            edges(&automaton, 0),
            [edge("S", 1), edge("C", 2), edge("c", 3), edge("d", 5)]
        );

        assert_eq!(items(&automaton, 1), ["S' ---> S .    $"]);
        assert!(edges(&automaton, 1).is_empty());

        assert_eq!(
            items(&automaton, 2),
            ["S ---> C . C    $", "C ---> . c C    $", "C ---> . d    $"]
        );
        assert_eq!(edges(&automaton, 2), [edge("C", 7), edge("c", 8), edge("d", 9)]);

        assert_eq!(
            items(&automaton, 3),
            [
                "C ---> c . C    c",
                "C ---> . c C    c",
                "C ---> . d    c",
                "C ---> c . C    d",
                "C ---> . c C    d",
                "C ---> . d    d",
            ]
        );
        assert_eq!(edges(&automaton, 3), [edge("C", 10), edge("c", 3), edge("d", 5)]);

        assert_eq!(items(&automaton, 5), ["C ---> d .    c", "C ---> d .    d"]);

        // the `c` loop for the last `C`
        assert_eq!(
            items(&automaton, 8),
            ["C ---> c . C    $", "C ---> . c C    $", "C ---> . d    $"]
        );
        assert_eq!(edges(&automaton, 8), [edge("C", 12), edge("c", 8), edge("d", 9)]);

        assert_eq!(items(&automaton, 10), ["C ---> c C .    c", "C ---> c C .    d"]);
        assert_eq!(items(&automaton, 12), ["C ---> c C .    $"]);
    }

    #[test]
    fn merge_removes_ambiguous_transitions() {
        let grammar = Grammar::from_str(
            "\
e ---> e PLUS t | t
t ---> t STAR f | f
f ---> LPAREN e RPAREN | NUM
",
        )
        .unwrap();

        let raw = Config::new().skip_merge().generate(&grammar);
        let has_ambiguity = raw.states().any(|(_, state)| {
            let mut seen = Map::<&str, StateID>::default();
            state.transitions().iter().any(|t| {
                *seen.entry(t.symbol().name()).or_insert(t.target()) != t.target()
            })
        });
        assert!(has_ambiguity);

        let automaton = Automaton::generate(&grammar);
        assert!(automaton.len() < raw.len());
        for (id, state) in automaton.states() {
            let mut seen = Map::<&str, StateID>::default();
            for t in state.transitions() {
                let first = *seen.entry(t.symbol().name()).or_insert(t.target());
                assert_eq!(first, t.target(), "state {} on {}", id, t.symbol());
                assert!(automaton.state(t.target()).is_some(), "dangling edge");
            }
        }
    }

    // Each state holds a single `S' -> S` item with the given marker position.
    fn hand_built<'g>(
        grammar: &'g Grammar,
        states: Vec<(u32, usize, Vec<(&str, u32)>)>,
    ) -> Automaton<'g> {
        Automaton {
            grammar,
            states: states
                .into_iter()
                .map(|(id, dot, transitions)| {
                    let state = State {
                        rules: vec![Item::new(ProductionID::ACCEPT, dot, EOI)],
                        transitions: transitions
                            .into_iter()
                            .map(|(name, target)| Transition {
                                symbol: Symbol::terminal(name),
                                target: StateID::from_raw(target),
                            })
                            .collect(),
                    };
                    (StateID::from_raw(id), state)
                })
                .collect(),
        }
    }

    fn assert_no_dangling_edges(automaton: &Automaton<'_>) {
        for (id, state) in automaton.states() {
            for t in state.transitions() {
                assert!(
                    automaton.state(t.target()).is_some(),
                    "state {} on {} -> {}",
                    id,
                    t.symbol(),
                    t.target()
                );
            }
        }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn merge_redirects_edges_to_absorbed_state() {
        init_tracing();
        let grammar = textbook();

        // 0 --x--> 2, 0 --x--> 1 ; state 1 loops on `y` and also reaches 2 on `y`.
        let mut automaton = hand_built(
            &grammar,
            vec![
                (0, 0, vec![("x", 2), ("x", 1)]),
                (1, 1, vec![("y", 1), ("y", 2)]),
                (2, 1, vec![]),
            ],
        );

        assert!(automaton.merge_pass());
        assert_eq!(ids(&automaton), [0, 2]);
        assert_eq!(edges(&automaton, 0), [edge("x", 2)]);
        // state 1 was absorbed into state 2; its edges now point at 2 and
        // the resulting duplicate is dropped when state 2 is scanned.
        assert_eq!(edges(&automaton, 2), [edge("y", 2)]);
        assert_eq!(automaton.state(StateID::from_raw(2)).unwrap().rules().len(), 2);

        assert!(!automaton.merge_pass());
        assert_eq!(ids(&automaton), [0, 2]);
        assert_no_dangling_edges(&automaton);
    }

    #[test]
    fn merge_stops_scanning_a_state_absorbed_into_another() {
        init_tracing();
        let grammar = textbook();

        // While scanning state 1, its second `y` edge points at itself, so
        // state 1 is the one folded into state 2.
        let mut automaton = hand_built(
            &grammar,
            vec![
                (0, 0, vec![("x", 1)]),
                (1, 1, vec![("y", 2), ("y", 1), ("z", 0)]),
                (2, 1, vec![]),
            ],
        );

        assert!(automaton.merge_pass());
        assert_eq!(ids(&automaton), [0, 2]);
        assert_eq!(edges(&automaton, 0), [edge("x", 2)]);
        assert_eq!(edges(&automaton, 2), [edge("y", 2), edge("z", 0)]);
        assert_eq!(automaton.state(StateID::from_raw(2)).unwrap().rules().len(), 2);
        assert_no_dangling_edges(&automaton);

        assert!(!automaton.merge_pass());
        assert_eq!(ids(&automaton), [0, 2]);
    }

    #[test]
    fn merge_checks_the_transition_after_a_removed_duplicate() {
        init_tracing();
        let grammar = textbook();

        // The repeated `a -> 1` is dropped; the following `a -> 2` must still
        // be seen in the same pass and folded into state 1.
        let mut automaton = hand_built(
            &grammar,
            vec![
                (0, 0, vec![("a", 1), ("a", 1), ("a", 2)]),
                (1, 1, vec![]),
                (2, 1, vec![]),
            ],
        );

        assert!(automaton.merge_pass());
        assert_eq!(ids(&automaton), [0, 1]);
        assert_eq!(edges(&automaton, 0), [edge("a", 1)]);
        assert_eq!(automaton.state(StateID::from_raw(1)).unwrap().rules().len(), 2);
        assert_no_dangling_edges(&automaton);

        assert!(!automaton.merge_pass());
    }

    #[test]
    fn merge_leaves_no_ambiguous_edges() {
        init_tracing();
        for source in [
            include_str!("../tests/arithmetic.grammar"),
            include_str!("../tests/ambiguous.grammar"),
        ] {
            let grammar = Grammar::from_str(source).unwrap();
            let automaton = Automaton::generate(&grammar);
            for (id, state) in automaton.states() {
                let mut seen = Map::<&str, StateID>::default();
                for t in state.transitions() {
                    let first = *seen.entry(t.symbol().name()).or_insert(t.target());
                    assert_eq!(first, t.target(), "{}: state {} on {}", source, id, t.symbol());
                }
            }
            assert_no_dangling_edges(&automaton);
        }
    }

    #[test]
    fn start_state_shape() {
        for source in [
            "s ---> c c\nc ---> C c | D",
            "e ---> e PLUS t | t\nt ---> NUM | LPAREN e RPAREN",
            "a ---> b a | *\nb ---> B",
        ] {
            let grammar = Grammar::from_str(source).unwrap();
            let automaton = Automaton::generate(&grammar);
            let start = automaton.start_state();
            let accept_items: Vec<&Item> = start
                .rules()
                .iter()
                .filter(|item| item.production() == ProductionID::ACCEPT)
                .collect();
            assert_eq!(accept_items.len(), 1, "{}", source);
            assert_eq!(accept_items[0].dot(), 0);
            assert_eq!(accept_items[0].lookahead(), EOI);
            assert_eq!(&start.rules()[0], accept_items[0]);
        }
    }

    #[test]
    fn closure_completeness() {
        for source in [
            "s ---> c c\nc ---> C c | D",
            "e ---> e PLUS t | t\nt ---> t STAR f | f\nf ---> LPAREN e RPAREN | NUM",
            "s ---> a b END\na ---> A | *\nb ---> a B | C",
        ] {
            let grammar = Grammar::from_str(source).unwrap();
            for automaton in [
                Automaton::generate(&grammar),
                Config::new().skip_merge().generate(&grammar),
            ] {
                for (id, state) in automaton.states() {
                    for item in state.rules() {
                        let symbol = match item.next_symbol(&grammar) {
                            Some(symbol) if !symbol.is_terminal() => symbol,
                            _ => continue,
                        };
                        for (production, _) in grammar.productions_of(symbol.name()) {
                            assert!(
                                state
                                    .rules()
                                    .iter()
                                    .any(|i| i.production() == production && i.dot() == 0),
                                "state {} is not closed under {}",
                                id,
                                symbol
                            );
                        }
                    }
                }
            }
        }
    }
}
