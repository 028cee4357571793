//! Drive an external manga translation engine from Rust.
//!
//! [`command`] turns settings into the engine's command line, [`runner`] runs
//! it as a child process and streams its output, and [`session`] ties both to
//! persisted settings for a front end.

pub mod banner;
pub mod command;
pub mod config;
pub mod consts;
pub mod events;
pub mod library;
pub mod paths;
pub mod runner;
pub mod session;
