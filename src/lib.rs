// Crate root library declaration and module exports.
pub mod board;
pub mod calendar;
pub mod cli;
pub mod client;
pub mod color_utils;
pub mod config;
pub mod context;
pub mod logging;
pub mod model;
pub mod session;
pub mod storage;
pub mod tasks;

#[cfg(feature = "tui")]
pub mod tui;
