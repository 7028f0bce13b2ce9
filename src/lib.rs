//! Small cli for tracking how much time goes into each task during the day.
//! Clock into a task, clock out or switch to another one, and ask for the breakdown whenever.
//! Every day is stored as a plain text record that is easy to read and fix by hand.
//!

pub mod cli;
pub mod ledger;
pub mod storage;
pub mod utils;
