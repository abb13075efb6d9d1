//! Typed notification payloads.
//!
//! Each variant carries only the entity references its action handler
//! needs. Stored as a JSON object tagged by `type`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use notifyhub_core::types::id::{OpportunityId, UserId};

/// Entity references attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// No entity reference.
    #[default]
    None,
    /// A newly posted or offered job.
    Job {
        /// The job posting.
        job_id: OpportunityId,
        /// The client who posted it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_id: Option<UserId>,
    },
    /// An application to one of the user's jobs.
    Application {
        /// The job applied to.
        job_id: OpportunityId,
        /// The applicant.
        applicant_id: UserId,
    },
    /// A payment event.
    Payment {
        /// Payment processor reference.
        payment_id: String,
        /// Amount in minor units.
        amount_cents: i64,
        /// ISO currency code.
        currency: String,
    },
    /// A consultation meeting.
    Meeting {
        /// The booked consultation.
        consultation_id: Uuid,
        /// Video call link, if already issued.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meeting_link: Option<String>,
        /// Scheduled start.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        starts_at: Option<DateTime<Utc>>,
    },
    /// A direct message.
    Message {
        /// The conversation thread.
        conversation_id: Uuid,
        /// Who sent it.
        sender_id: UserId,
    },
    /// A collaboration invite.
    Collaboration {
        /// The research project.
        project_id: Uuid,
        /// Who sent the invite.
        inviter_id: UserId,
    },
    /// A delivery or response deadline.
    Deadline {
        /// The job the deadline belongs to.
        job_id: OpportunityId,
        /// When delivery or a response is due.
        due_at: DateTime<Utc>,
    },
    /// A platform announcement.
    System {
        /// Explicit urgency hint from the producer.
        #[serde(default)]
        urgent: bool,
    },
}

/// How close a deadline must be to count as a deadline situation.
pub const DEADLINE_HORIZON_HOURS: i64 = 48;

/// How close a meeting must be to count as imminent.
pub const IMMINENT_MEETING_HOURS: i64 = 24;

impl NotificationPayload {
    /// Whether this payload announces a brand-new opportunity.
    pub fn is_new_opportunity(&self) -> bool {
        matches!(self, Self::Job { .. })
    }

    /// Whether a delivery/response deadline falls within the horizon.
    ///
    /// Deadlines that already passed still count.
    pub fn has_pressing_deadline(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Deadline { due_at, .. } => {
                *due_at - now <= Duration::hours(DEADLINE_HORIZON_HOURS)
            }
            _ => false,
        }
    }

    /// Whether the payload carries an urgency hint: an explicit flag or a
    /// meeting that starts soon.
    pub fn is_urgent(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::System { urgent } => *urgent,
            Self::Meeting {
                starts_at: Some(start),
                ..
            } => *start >= now && *start - now <= Duration::hours(IMMINENT_MEETING_HOURS),
            _ => false,
        }
    }

    /// Stable key for the referenced entity, used to suppress repeated
    /// toasts about the same thing.
    pub fn entity_key(&self) -> Option<String> {
        match self {
            Self::None | Self::System { .. } => None,
            Self::Job { job_id, .. } => Some(format!("job:{job_id}")),
            Self::Application {
                job_id,
                applicant_id,
            } => Some(format!("application:{job_id}:{applicant_id}")),
            Self::Payment { payment_id, .. } => Some(format!("payment:{payment_id}")),
            Self::Meeting {
                consultation_id, ..
            } => Some(format!("consultation:{consultation_id}")),
            Self::Message {
                conversation_id, ..
            } => Some(format!("conversation:{conversation_id}")),
            Self::Collaboration { project_id, .. } => Some(format!("project:{project_id}")),
            Self::Deadline { job_id, .. } => Some(format!("deadline:{job_id}")),
        }
    }

    /// Navigation target used when the notification carries no explicit
    /// action URL.
    pub fn default_action_url(&self) -> Option<String> {
        match self {
            Self::None | Self::System { .. } => None,
            Self::Job { job_id, .. } | Self::Deadline { job_id, .. } => {
                Some(format!("/jobs/{job_id}"))
            }
            Self::Application { job_id, .. } => Some(format!("/jobs/{job_id}/applications")),
            Self::Payment { .. } => Some("/dashboard?tab=payments".to_string()),
            Self::Meeting {
                meeting_link: Some(link),
                ..
            } => Some(link.clone()),
            Self::Meeting { .. } => Some("/dashboard?tab=upcoming".to_string()),
            Self::Message {
                conversation_id, ..
            } => Some(format!("/messages/{conversation_id}")),
            Self::Collaboration { project_id, .. } => Some(format!("/collaborations/{project_id}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_with_type_tag() {
        let payload = NotificationPayload::System { urgent: true };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"type": "system", "urgent": true}));
    }

    #[test]
    fn test_deadline_horizon() {
        let now = Utc::now();
        let job_id = OpportunityId::new();
        let soon = NotificationPayload::Deadline {
            job_id,
            due_at: now + Duration::hours(12),
        };
        let later = NotificationPayload::Deadline {
            job_id,
            due_at: now + Duration::days(5),
        };
        assert!(soon.has_pressing_deadline(now));
        assert!(!later.has_pressing_deadline(now));
    }

    #[test]
    fn test_meeting_urgency() {
        let now = Utc::now();
        let meeting = |starts_at| NotificationPayload::Meeting {
            consultation_id: Uuid::new_v4(),
            meeting_link: None,
            starts_at: Some(starts_at),
        };
        assert!(meeting(now + Duration::hours(2)).is_urgent(now));
        assert!(!meeting(now + Duration::days(3)).is_urgent(now));
        assert!(!meeting(now - Duration::hours(2)).is_urgent(now));
    }

    #[test]
    fn test_meeting_link_is_default_action() {
        let payload = NotificationPayload::Meeting {
            consultation_id: Uuid::new_v4(),
            meeting_link: Some("https://meet.example.com/abc".to_string()),
            starts_at: None,
        };
        assert_eq!(
            payload.default_action_url().as_deref(),
            Some("https://meet.example.com/abc")
        );
    }
}
