//! The `indexwatch` command line front end: configuration, terminal
//! rendering and the command runners.
pub mod cli;
pub mod config;
pub mod platform;
pub mod render;
