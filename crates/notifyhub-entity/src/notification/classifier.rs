//! Notification classification.
//!
//! Maps raw producer signals (severity, domain category, payload) to the
//! semantic [`NotificationKind`] and the [`Priority`] tier. Every reader of a
//! notification relies on the values derived here, so this module is the
//! only place that decides what a category means.
//!
//! Both functions are total: every input combination yields exactly one
//! classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::{NotificationCategory, RawType};
use super::kind::{NotificationKind, Priority};
use super::payload::NotificationPayload;

/// Derived kind and priority of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    /// Semantic UI-facing kind.
    pub kind: NotificationKind,
    /// Urgency tier.
    pub priority: Priority,
}

/// Classify from the producer's severity and category alone.
///
/// `category` is the primary signal. Without one, `raw_type` decides between
/// a system alert and a plain message.
pub fn classify(
    raw_type: Option<RawType>,
    category: Option<NotificationCategory>,
) -> Classification {
    let raw_type = raw_type.unwrap_or_default();

    let kind = match category {
        Some(NotificationCategory::Job) => NotificationKind::JobInvitation,
        Some(NotificationCategory::Application) => NotificationKind::ApplicationUpdate,
        Some(NotificationCategory::Payment) if raw_type == RawType::Error => {
            NotificationKind::PaymentFailed
        }
        Some(NotificationCategory::Payment) => NotificationKind::PaymentReceived,
        Some(NotificationCategory::Consultation) => NotificationKind::AppointmentReminder,
        Some(NotificationCategory::Collaboration) => NotificationKind::CollaborationInvite,
        Some(NotificationCategory::Message) => NotificationKind::MessageReceived,
        Some(NotificationCategory::System) if raw_type.is_problem() => {
            NotificationKind::SystemAlert
        }
        Some(NotificationCategory::System) => NotificationKind::SystemNotice,
        None if raw_type.is_problem() => NotificationKind::SystemAlert,
        None => NotificationKind::MessageReceived,
    };

    Classification {
        kind,
        priority: base_priority(kind),
    }
}

/// Classify with payload hints applied on top of [`classify`].
///
/// - a brand-new opportunity is always `High`;
/// - a pressing delivery/response deadline becomes a `DeadlineReminder`
///   at `High`;
/// - an urgency hint upgrades `Medium` to `High`.
pub fn classify_with_payload(
    raw_type: Option<RawType>,
    category: Option<NotificationCategory>,
    payload: &NotificationPayload,
    now: DateTime<Utc>,
) -> Classification {
    let mut classification = classify(raw_type, category);

    if payload.has_pressing_deadline(now) {
        classification.kind = NotificationKind::DeadlineReminder;
        classification.priority = Priority::High;
    }

    if payload.is_new_opportunity() {
        classification.priority = Priority::High;
    }

    if classification.priority == Priority::Medium && payload.is_urgent(now) {
        classification.priority = Priority::High;
    }

    classification
}

/// Priority policy, keyed by kind.
pub fn base_priority(kind: NotificationKind) -> Priority {
    match kind {
        NotificationKind::JobInvitation | NotificationKind::DeadlineReminder => Priority::High,
        NotificationKind::PaymentReceived
        | NotificationKind::PaymentFailed
        | NotificationKind::SystemAlert
        | NotificationKind::SystemNotice
        | NotificationKind::MessageReceived
        | NotificationKind::AppointmentReminder => Priority::Medium,
        NotificationKind::CollaborationInvite | NotificationKind::ApplicationUpdate => {
            Priority::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use notifyhub_core::types::id::{OpportunityId, UserId};

    use super::*;

    fn raw_types() -> Vec<Option<RawType>> {
        let mut all: Vec<_> = RawType::ALL.into_iter().map(Some).collect();
        all.push(None);
        all
    }

    fn categories() -> Vec<Option<NotificationCategory>> {
        let mut all: Vec<_> = NotificationCategory::ALL.into_iter().map(Some).collect();
        all.push(None);
        all
    }

    #[test]
    fn test_classify_is_total_and_deterministic() {
        let mut seen = 0;
        for raw in raw_types() {
            for category in categories() {
                let first = classify(raw, category);
                let second = classify(raw, category);
                assert_eq!(first, second);
                assert_eq!(first.priority, base_priority(first.kind));
                seen += 1;
            }
        }
        assert_eq!(seen, 5 * 8);
    }

    #[test]
    fn test_job_category_is_high_for_every_raw_type() {
        for raw in raw_types() {
            let c = classify(raw, Some(NotificationCategory::Job));
            assert_eq!(c.kind, NotificationKind::JobInvitation);
            assert_eq!(c.priority, Priority::High);
        }
    }

    #[test]
    fn test_payment_error_is_distinct_from_success() {
        let failed = classify(Some(RawType::Error), Some(NotificationCategory::Payment));
        let received = classify(Some(RawType::Success), Some(NotificationCategory::Payment));
        assert_eq!(failed.kind, NotificationKind::PaymentFailed);
        assert_eq!(received.kind, NotificationKind::PaymentReceived);
        assert_ne!(failed.kind, received.kind);
        assert_eq!(failed.priority, Priority::Medium);
    }

    #[test]
    fn test_category_mapping() {
        let c = classify(Some(RawType::Success), Some(NotificationCategory::Consultation));
        assert_eq!(c.kind, NotificationKind::AppointmentReminder);
        assert_eq!(c.priority, Priority::Medium);

        let c = classify(None, Some(NotificationCategory::Message));
        assert_eq!(c.kind, NotificationKind::MessageReceived);
        assert_eq!(c.priority, Priority::Medium);

        let c = classify(Some(RawType::Info), Some(NotificationCategory::Collaboration));
        assert_eq!(c.kind, NotificationKind::CollaborationInvite);
        assert_eq!(c.priority, Priority::Low);

        let c = classify(Some(RawType::Warning), Some(NotificationCategory::System));
        assert_eq!(c.kind, NotificationKind::SystemAlert);
        let c = classify(Some(RawType::Info), Some(NotificationCategory::System));
        assert_eq!(c.kind, NotificationKind::SystemNotice);
    }

    #[test]
    fn test_fallback_without_category() {
        assert_eq!(
            classify(Some(RawType::Error), None).kind,
            NotificationKind::SystemAlert
        );
        assert_eq!(
            classify(Some(RawType::Success), None).kind,
            NotificationKind::MessageReceived
        );
        assert_eq!(classify(None, None).kind, NotificationKind::MessageReceived);
    }

    #[test]
    fn test_urgency_upgrades_medium_only() {
        let now = Utc::now();
        let urgent = NotificationPayload::System { urgent: true };

        let c = classify_with_payload(None, Some(NotificationCategory::System), &urgent, now);
        assert_eq!(c.priority, Priority::High);

        let c = classify_with_payload(
            None,
            Some(NotificationCategory::Collaboration),
            &urgent,
            now,
        );
        assert_eq!(c.priority, Priority::Low);
    }

    #[test]
    fn test_imminent_meeting_is_high() {
        let now = Utc::now();
        let payload = NotificationPayload::Meeting {
            consultation_id: Uuid::new_v4(),
            meeting_link: None,
            starts_at: Some(now + Duration::hours(1)),
        };
        let c = classify_with_payload(
            Some(RawType::Info),
            Some(NotificationCategory::Consultation),
            &payload,
            now,
        );
        assert_eq!(c.kind, NotificationKind::AppointmentReminder);
        assert_eq!(c.priority, Priority::High);
    }

    #[test]
    fn test_pressing_deadline_becomes_deadline_reminder() {
        let now = Utc::now();
        let payload = NotificationPayload::Deadline {
            job_id: OpportunityId::new(),
            due_at: now + Duration::hours(6),
        };
        let c = classify_with_payload(
            Some(RawType::Warning),
            Some(NotificationCategory::Application),
            &payload,
            now,
        );
        assert_eq!(c.kind, NotificationKind::DeadlineReminder);
        assert_eq!(c.priority, Priority::High);
    }

    #[test]
    fn test_new_opportunity_is_high_in_any_category() {
        let now = Utc::now();
        let payload = NotificationPayload::Job {
            job_id: OpportunityId::new(),
            client_id: Some(UserId::new()),
        };
        let c = classify_with_payload(
            None,
            Some(NotificationCategory::Collaboration),
            &payload,
            now,
        );
        assert_eq!(c.priority, Priority::High);
    }
}
