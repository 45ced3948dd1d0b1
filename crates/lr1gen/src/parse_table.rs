use crate::{
    automaton::{Automaton, StateID},
    grammar::EOI,
    types::Map,
    util::display_fn,
};
use serde::Serialize;
use std::fmt;

/// A parse action at a state/symbol pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    Shift {
        state: StateID,
    },
    Goto {
        state: StateID,
    },
    #[serde(rename_all = "camelCase")]
    Reduce {
        left_hand_side: String,
        right_hand_side: Vec<String>,
    },
    Accept,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift { state } => write!(f, "shift {}", state),
            Self::Goto { state } => write!(f, "goto {}", state),
            Self::Reduce {
                left_hand_side,
                right_hand_side,
            } => {
                write!(f, "reduce {} ->", left_hand_side)?;
                for symbol in right_hand_side {
                    write!(f, " {}", symbol)?;
                }
                Ok(())
            }
            Self::Accept => f.write_str("accept"),
        }
    }
}

/// The action table keyed by state and symbol name.
///
/// State indices follow the automaton and may be non-contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParseTable {
    map: Map<StateID, Map<String, Action>>,
}

impl ParseTable {
    /// Translate the automaton into its action table.
    ///
    /// Transitions are written before completed items, and a later write to
    /// the same state/symbol pair replaces the earlier one.
    #[tracing::instrument(skip_all)]
    pub fn generate(automaton: &Automaton<'_>) -> Self {
        let grammar = automaton.grammar();
        let accept = grammar.accept_symbol();
        let mut map = Map::default();

        for (id, state) in automaton.states() {
            let mut actions = Map::<String, Action>::default();

            // shift, goto
            for transition in state.transitions() {
                let target = transition.target();
                let action = if transition.symbol().is_terminal() {
                    Action::Shift { state: target }
                } else {
                    Action::Goto { state: target }
                };
                overwrite(&mut actions, id, transition.symbol().name(), action);
            }

            // reduce, accept
            for item in state.rules() {
                if !item.is_complete(grammar) {
                    continue;
                }
                let production = grammar.production(item.production());
                let action = if production.left() == accept && item.lookahead() == EOI {
                    Action::Accept
                } else {
                    Action::Reduce {
                        left_hand_side: production.left().name().to_owned(),
                        right_hand_side: production
                            .right()
                            .iter()
                            .map(|symbol| symbol.name().to_owned())
                            .collect(),
                    }
                };
                overwrite(&mut actions, id, item.lookahead(), action);
            }

            map.insert(id, actions);
        }

        Self { map }
    }

    pub fn get(&self, state: StateID, symbol: &str) -> Option<&Action> {
        self.map.get(&state)?.get(symbol)
    }

    /// The actions of a state, keyed by symbol name.
    pub fn actions(&self, state: StateID) -> Option<&Map<String, Action>> {
        self.map.get(&state)
    }

    pub fn states(&self) -> impl Iterator<Item = (StateID, &Map<String, Action>)> + '_ {
        self.map.iter().map(|(id, actions)| (*id, actions))
    }

    pub fn display(&self) -> impl fmt::Display + '_ {
        display_fn(move |f| {
            for (id, actions) in &self.map {
                writeln!(f, "state {}:", id)?;
                for (symbol, action) in actions {
                    writeln!(f, "  {} => {}", symbol, action)?;
                }
            }
            Ok(())
        })
    }
}

impl fmt::Display for ParseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.display(), f)
    }
}

fn overwrite(actions: &mut Map<String, Action>, id: StateID, symbol: &str, action: Action) {
    if let Some(previous) = actions.insert(symbol.to_owned(), action) {
        tracing::trace!(
            "state {}: `{}' on {} is overwritten by `{}'",
            id,
            previous,
            symbol,
            actions[symbol]
        );
    }
}
