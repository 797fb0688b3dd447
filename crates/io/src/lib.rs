// File I/O operations

pub mod archive;
pub mod csv;
pub mod format;
pub mod json;
pub mod output;
pub mod report;
