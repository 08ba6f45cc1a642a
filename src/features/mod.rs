// Interactive flows driven by buttons, selects and modals
pub mod dashboard;
pub mod interactions;
pub mod tickets;
