//! The day-transition state machine.
//!
//! A day is a list of [action::Action]s that alternate between clocking into a task and
//! clocking out of it. [day::DayLedger] owns that list and is the only thing that mutates it,
//! [validator::validate] decides what a legal history looks like and
//! [aggregator::aggregate] turns a legal history into durations.

pub mod action;
pub mod aggregator;
pub mod day;
pub mod error;
pub mod validator;
