//! Grammar language compiler
//!
//! Turns grammar source such as `go to [the | a] (house | barn)` into a
//! [`Sequence`] of [`GrammarNode`]s, resolving `$name` references against a
//! [`Definitions`] context, and lowers sequences into [`Matcher`]s for the
//! recognition engine.

mod definitions;
mod lexer;
mod matcher;
mod node;
mod parser;

pub use definitions::Definitions;
pub use matcher::Matcher;
pub use node::{render, GrammarNode, Repeat, Sequence, GROUP_REPEAT_MAX, UNBOUNDED};
pub use parser::{parse, GrammarError};
