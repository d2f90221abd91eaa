//! Interactive terminal front end.

mod command;
mod formatter;
mod prompt;
mod runner;

pub use command::{InputCommand, InputError, parse_input};
pub use formatter::MessageFormatter;
pub use runner::run_client;
