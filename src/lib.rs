//! Core library for the TinyTalk language: a small dynamically-typed
//! language whose mutating operations are transactional against declared
//! invariants. A forge call's field writes become observable only if every
//! law on the receiver's blueprint still holds afterwards; otherwise the
//! whole call is rolled back.

pub mod ast;
pub mod diagnostics;
pub mod environment;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod value;

pub use diagnostics::{Diagnostic, DiagnosticKind, Position, TinyTalkError};
pub use repl::Repl;
pub use runtime::{run, run_with_limits, ExecutionLimits, Interpreter, RunOutcome};
pub use value::Value;
