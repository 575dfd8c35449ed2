//! Operator command interface
//!
//! A single line of text is split on whitespace; the first token selects a
//! command by unambiguous prefix (`pl` → `play`) and the rest are its
//! arguments. The same interpreter serves the operator console and the
//! remote controller's `cliCommand`, except that only the console can shut
//! the server down.

pub mod exec;
pub mod table;

pub use exec::{execute, CommandOutput};
pub use table::{Command, CommandTable, Invocation, ParseError};
