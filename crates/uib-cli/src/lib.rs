//! Library side of the `uib` command: document loading, command runners,
//! terminal rendering and logging setup.

pub mod commands;
pub mod config;
pub mod logging;
pub mod render;
