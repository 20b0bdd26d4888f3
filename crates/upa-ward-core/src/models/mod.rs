//! Domain models for the pediatric ward.

mod antibiotics;
mod bed;
mod digitizer;
mod patient;
mod query;

pub use antibiotics::*;
pub use bed::*;
pub use digitizer::*;
pub use patient::*;
pub use query::*;
