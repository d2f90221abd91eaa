//! Utilities shared by the Roomlink packages: logging setup and clocks.

pub mod logger;
pub mod time;
