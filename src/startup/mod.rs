//! Launcher support: prerequisite checks, browser opening and running the
//! server binary as a child process.

pub mod browser;
pub mod preflight;
pub mod server;
