//! Graphviz rendering of an automaton.

use crate::{automaton::Automaton, util::display_fn};
use std::fmt::{self, Write as _};

/// Render the automaton as a `digraph`, one box per state and one edge per
/// transition.
pub fn render<'a>(automaton: &'a Automaton<'_>) -> impl fmt::Display + 'a {
    display_fn(move |f| {
        writeln!(f, "digraph G {{")?;
        writeln!(f, "    rankdir=\"LR\"")?;
        writeln!(f, "    node [ shape=box ]")?;
        for (id, state) in automaton.states() {
            let mut label = format!("[{}]\\n", id);
            for item in state.rules() {
                label.push_str("\\n");
                write!(label, "{}", item.display(automaton.grammar()))?;
            }
            writeln!(f, "    {} [ label=\"{}\" ]", id, escape(&label))?;
            for transition in state.transitions() {
                writeln!(
                    f,
                    "    {} -> {} [ label=\"{}\" ]",
                    id,
                    transition.target(),
                    escape(transition.symbol().name())
                )?;
            }
        }
        write!(f, "}}")
    })
}

// Only double quotes need escaping; `\n` in labels is emitted on purpose.
fn escape(s: &str) -> String {
    s.replace('"', "\\\"")
}
