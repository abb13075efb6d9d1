//! Weekly digest output.

use std::collections::HashMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use notifyhub_core::types::id::UserId;
use notifyhub_entity::{NotificationKind, Opportunity};

/// An opportunity with its relevance score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunityMatch {
    /// The matched opportunity.
    pub opportunity: Opportunity,
    /// Number of distinct skills found in the posting.
    pub score: u32,
    /// The skills that matched, lowercased.
    pub matched_skills: Vec<String>,
}

/// Structured weekly summary handed to the email sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyDigest {
    /// Who the digest is for.
    pub recipient_id: UserId,
    /// Window start (inclusive).
    pub period_start: DateTime<Utc>,
    /// Window end (exclusive).
    pub period_end: DateTime<Utc>,
    /// Newly digested notifications per kind.
    pub counts: HashMap<NotificationKind, u32>,
    /// Sum of `counts`.
    pub total: u32,
    /// Ranked opportunity matches.
    pub matches: Vec<OpportunityMatch>,
}

impl WeeklyDigest {
    /// Count for one kind.
    pub fn count(&self, kind: NotificationKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Nothing new and nothing matched.
    pub fn is_empty(&self) -> bool {
        self.total == 0 && self.matches.is_empty()
    }

    /// Email subject line.
    pub fn subject(&self) -> String {
        format!("Your weekly summary: {} new notifications", self.total)
    }

    /// Plain-text rendering of the digest.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Weekly summary {} to {}",
            self.period_start.format("%Y-%m-%d"),
            self.period_end.format("%Y-%m-%d")
        );
        let _ = writeln!(out);

        if self.total == 0 {
            let _ = writeln!(out, "No new notifications this week.");
        } else {
            let _ = writeln!(out, "{} new notifications:", self.total);
            for kind in NotificationKind::ALL {
                let count = self.count(kind);
                if count > 0 {
                    let _ = writeln!(out, "  {}: {count}", kind.label());
                }
            }
        }

        if !self.matches.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Opportunities matching your skills:");
            for m in &self.matches {
                let _ = writeln!(
                    out,
                    "  {} ({}) /jobs/{}",
                    m.opportunity.title,
                    m.matched_skills.join(", "),
                    m.opportunity.id
                );
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use notifyhub_core::types::id::OpportunityId;

    use super::*;

    #[test]
    fn test_render_lists_counts_and_matches() {
        let now = Utc::now();
        let opportunity = Opportunity {
            id: OpportunityId::new(),
            title: "Statistics tutor".to_string(),
            description: String::new(),
            posted_at: now,
        };
        let digest = WeeklyDigest {
            recipient_id: UserId::new(),
            period_start: now - chrono::Duration::days(7),
            period_end: now,
            counts: HashMap::from([(NotificationKind::PaymentReceived, 2)]),
            total: 2,
            matches: vec![OpportunityMatch {
                opportunity,
                score: 1,
                matched_skills: vec!["statistics".to_string()],
            }],
        };

        let text = digest.render_text();
        assert!(text.contains("2 new notifications"));
        assert!(text.contains(&format!("{}: 2", NotificationKind::PaymentReceived.label())));
        assert!(text.contains("Statistics tutor (statistics)"));
        assert!(!digest.is_empty());
    }
}
