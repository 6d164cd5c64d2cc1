//! Interactive-console transport (Fujitsu-Siemens RSB family).
//!
//! The device is driven through a menu-based text protocol over telnet
//! or ssh: send a menu selection, block until the command prompt (or an
//! intermediate confirmation) appears, repeat. Every wait is bounded by
//! one of two timeout tiers — a short command-acknowledgement timeout
//! and a longer power-action timeout.

pub mod agent;
pub mod expect;
pub mod ssh;
pub mod telnet;

pub use agent::{ConsoleAgent, ConsoleConfig};
pub use expect::{Pattern, Session};
