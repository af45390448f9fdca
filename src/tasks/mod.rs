//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Report: sweeps the cache back under capacity and logs its state

mod report;

pub use report::spawn_report_task;
