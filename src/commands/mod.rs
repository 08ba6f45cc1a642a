// Text commands
pub mod dashboard;
pub mod help;
pub mod panel;
pub mod ping;
pub mod settings;
pub mod types;
