//! Command handlers for the coinscript binary

pub mod commands;

pub use commands::*;
