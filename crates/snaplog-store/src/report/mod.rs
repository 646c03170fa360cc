//! Change-log sinks: CSV report and console lines.

pub mod console;
pub mod csv;
