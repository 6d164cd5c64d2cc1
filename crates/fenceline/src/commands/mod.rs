//! Command handlers: one module per device family plus config management.

pub mod config_cmd;
pub mod console;
pub mod panel;
