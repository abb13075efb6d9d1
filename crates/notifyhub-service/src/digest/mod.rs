//! Weekly digest generation.

pub mod generator;
pub mod matcher;
pub mod model;

pub use generator::DigestGenerator;
pub use matcher::match_opportunities;
pub use model::{OpportunityMatch, WeeklyDigest};
