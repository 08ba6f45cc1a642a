// Utility functions module
pub mod config;
pub mod discord;
pub mod formatters;
pub mod parse;
