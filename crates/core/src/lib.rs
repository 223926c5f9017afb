//! Domain layer of the finance dashboard: row types, money formatting,
//! calendar helpers, aggregation, input forms and the session context.
//!
//! Nothing in this crate performs I/O.

pub mod aggregation;
pub mod calendar;
pub mod error;
pub mod forms;
pub mod money;
pub mod session;
pub mod types;
