//! Open opportunities offered to users in digests.

pub mod model;

pub use model::Opportunity;
