// library crate for lifecourse
// the condition engine lives in `logic`; the rest backs the CLI

pub mod cli;
pub mod config;
pub mod logging;
pub mod logic;
pub mod subject;
