//! Interactive shell grammar.

mod args;

pub use args::{Command, Line, parse_line};
