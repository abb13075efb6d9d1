//! Opportunity entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use notifyhub_core::types::id::OpportunityId;

/// An open job posting a user may be matched with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Opportunity identifier.
    pub id: OpportunityId,
    /// Posting title.
    pub title: String,
    /// Posting description.
    pub description: String,
    /// When the posting went live.
    pub posted_at: DateTime<Utc>,
}
