//! An interactive command-line interpreter with command chaining.
//!
//! A line is split into sub-commands joined by `;`, `&&` and `||`, each
//! sub-command is tokenized with shell-like quoting rules, and the result is
//! either handled by a built-in or spawned as an external program. The
//! [`completion`] module supplies inline hints and tab completion for
//! [`rustyline`], drawing on the command and file lists kept by [`index`].
//!
//! The main entry point is [`Interpreter`], which owns the [`env::Environment`]
//! and the shared [`index::PathIndex`].

mod builtin;
pub mod command;
pub mod completion;
pub mod config;
pub mod env;
mod external;
pub mod index;
mod interpreter;
pub mod lexer;
pub mod parser;

pub use builtin::BUILTIN_NAMES;
pub use external::ExecError;
pub use interpreter::{Flow, Interpreter};
