//! famhub - family task board with difficulty-based point scoring.
//!
//! Families share a task pool; completing a task splits its point value
//! across the assignees. The interesting parts are the scoring tables
//! ([`scoring`]), the completion/settlement state machine (backed by
//! [`store`]), the board ordering ([`schedule`]) and reminder eligibility
//! ([`reminder`]). Everything else is CRUD plumbing around them.

pub mod api;
pub mod coach;
pub mod config;
pub mod family;
pub mod notify;
pub mod reminder;
pub mod schedule;
pub mod scoring;
pub mod store;
pub mod task;
