//! A tiny line-oriented script interpreter.
//!
//! This crate interprets short automation scripts where each non-empty line is
//! one command headed by a keyword (`let`, `invoke`, `#`). Values are strings
//! or flat lists of strings; a small placeholder mini-language substitutes
//! variables, environment lookups, list elements and native function results
//! into value expressions, and `invoke` dispatches calls to external
//! processes, curated native modules, host-registered functions or built-ins.
//!
//! The main entry point is [`Interpreter`], which can run a script file, a
//! sequence of in-memory lines, or an interactive session. Diagnostics go
//! through the pluggable [`DiagnosticSink`]; [`ConsoleSink`] is the colored
//! console implementation used by the `pirat` binary.

mod builtin;
mod diag;
mod env;
mod external;
mod functions;
mod interpreter;
mod parser;
mod subst;
mod value;

pub use diag::{ConsoleSink, DiagnosticSink, Severity};
pub use env::Environment;
pub use interpreter::Interpreter;
pub use value::{Scope, Value};
