//! Export of filtered report rows.

mod report;

pub use report::*;
