//! Report queries over the full patient set.

mod census;
mod filter;

pub use census::*;
pub use filter::*;
