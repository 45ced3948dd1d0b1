//! Canonical LR(1) automaton and parse table construction.
//!
//! ```
//! use lr1gen::{automaton::Automaton, grammar::Grammar, parse_table::ParseTable};
//!
//! let grammar = Grammar::from_str("s ---> c c\nc ---> C c | D").unwrap();
//! let automaton = Automaton::generate(&grammar);
//! let table = ParseTable::generate(&automaton);
//! println!("{}", table);
//! ```

pub mod automaton;
pub mod dot;
pub mod first_sets;
pub mod grammar;
pub mod parse_table;
pub mod syntax;
pub mod types;
mod util;
