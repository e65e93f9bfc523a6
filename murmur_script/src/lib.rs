//! Script language for murmur branching narratives.
//!
//! Turns story text into an immutable [`Script`] tree that the engine replays
//! turn by turn, and offers a lint pass for authors.

pub mod ast;
pub mod parser;
pub mod validate;

pub use ast::{Branch, Choice, CompareOp, Guard, IfChain, Jump, Node, Script, Section, SetVar};
pub use parser::{ParseError, ParseErrorKind, count_section_markers, parse_script};
pub use validate::{ValidationIssue, validate_script};
