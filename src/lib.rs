//! Simple cli for keeping your active keyboard and mouse time under a daily budget.
//! Raw input events are debounced into an active-time counter, the counter is
//! checked against a configured limit with an escalating alert policy, and a
//! progress bar tracks the remaining budget right in the terminal.
//!

pub mod cli;
pub mod input_api;
pub mod monitor;
pub mod utils;
