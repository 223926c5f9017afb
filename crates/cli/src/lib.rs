//! Terminal front end of the finance dashboard.

pub mod config;
pub mod reports;
