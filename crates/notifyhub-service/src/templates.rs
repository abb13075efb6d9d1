//! Domain notification templates.
//!
//! Thin wrappers that fix the category, severity and payload for common
//! marketplace events and compose the title and message. They carry no
//! logic beyond templating; classification happens at dispatch.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use notifyhub_core::types::id::{OpportunityId, UserId};
use notifyhub_entity::{NotificationCategory, NotificationPayload, RawType};

use crate::dispatch::NotificationDraft;

/// Builds drafts for common marketplace events.
pub struct NotificationTemplates;

impl NotificationTemplates {
    /// A new job matching the recipient was posted.
    pub fn job_posted(job_title: &str, job_id: OpportunityId, client_id: UserId) -> NotificationDraft {
        NotificationDraft::new(
            "New Job Opportunity",
            format!("A new job was posted: '{job_title}'"),
        )
        .with_raw_type(RawType::Info)
        .with_category(NotificationCategory::Job)
        .with_action(format!("/jobs/{job_id}"), Some("View job"))
        .with_payload(NotificationPayload::Job {
            job_id,
            client_id: Some(client_id),
        })
    }

    /// Someone applied to one of the recipient's jobs.
    pub fn application_received(
        applicant_name: &str,
        job_title: &str,
        job_id: OpportunityId,
        applicant_id: UserId,
    ) -> NotificationDraft {
        NotificationDraft::new(
            "New Application",
            format!("{applicant_name} applied to '{job_title}'"),
        )
        .with_raw_type(RawType::Info)
        .with_category(NotificationCategory::Application)
        .with_action(format!("/jobs/{job_id}/applications"), Some("Review"))
        .with_payload(NotificationPayload::Application {
            job_id,
            applicant_id,
        })
    }

    /// A payment reached the recipient.
    pub fn payment_received(payment_id: &str, amount_cents: i64, currency: &str) -> NotificationDraft {
        NotificationDraft::new(
            "Payment Received",
            format!("You received {}", format_amount(amount_cents, currency)),
        )
        .with_raw_type(RawType::Success)
        .with_category(NotificationCategory::Payment)
        .with_action("/dashboard?tab=payments", Some("View payments"))
        .with_payload(NotificationPayload::Payment {
            payment_id: payment_id.to_string(),
            amount_cents,
            currency: currency.to_string(),
        })
    }

    /// A payment by or to the recipient failed.
    pub fn payment_failed(
        payment_id: &str,
        amount_cents: i64,
        currency: &str,
        reason: &str,
    ) -> NotificationDraft {
        NotificationDraft::new(
            "Payment Failed",
            format!(
                "Payment of {} failed: {reason}",
                format_amount(amount_cents, currency)
            ),
        )
        .with_raw_type(RawType::Error)
        .with_category(NotificationCategory::Payment)
        .with_action("/dashboard?tab=payments", Some("Review payment"))
        .with_payload(NotificationPayload::Payment {
            payment_id: payment_id.to_string(),
            amount_cents,
            currency: currency.to_string(),
        })
    }

    /// A consultation booking was confirmed.
    pub fn consultation_confirmed(
        counterpart_name: &str,
        consultation_id: Uuid,
        starts_at: DateTime<Utc>,
    ) -> NotificationDraft {
        NotificationDraft::new(
            "Booking Confirmed",
            format!(
                "Your consultation with {counterpart_name} is confirmed for {}",
                starts_at.format("%Y-%m-%d %H:%M UTC")
            ),
        )
        .with_raw_type(RawType::Success)
        .with_category(NotificationCategory::Consultation)
        .with_action("/dashboard?tab=upcoming", Some("View booking"))
        .with_payload(NotificationPayload::Meeting {
            consultation_id,
            meeting_link: None,
            starts_at: Some(starts_at),
        })
    }

    /// A consultation is about to start.
    pub fn consultation_reminder(
        counterpart_name: &str,
        consultation_id: Uuid,
        starts_at: DateTime<Utc>,
        meeting_link: Option<&str>,
    ) -> NotificationDraft {
        NotificationDraft::new(
            "Upcoming Consultation",
            format!(
                "Your consultation with {counterpart_name} starts at {}",
                starts_at.format("%H:%M UTC")
            ),
        )
        .with_raw_type(RawType::Info)
        .with_category(NotificationCategory::Consultation)
        .with_payload(NotificationPayload::Meeting {
            consultation_id,
            meeting_link: meeting_link.map(str::to_string),
            starts_at: Some(starts_at),
        })
    }

    /// The recipient was invited to a research project.
    pub fn collaboration_invite(
        inviter_name: &str,
        project_title: &str,
        project_id: Uuid,
        inviter_id: UserId,
    ) -> NotificationDraft {
        NotificationDraft::new(
            "Collaboration Invite",
            format!("{inviter_name} invited you to collaborate on '{project_title}'"),
        )
        .with_raw_type(RawType::Info)
        .with_category(NotificationCategory::Collaboration)
        .with_payload(NotificationPayload::Collaboration {
            project_id,
            inviter_id,
        })
    }

    /// A new direct message arrived.
    pub fn message_received(
        sender_name: &str,
        preview: &str,
        conversation_id: Uuid,
        sender_id: UserId,
    ) -> NotificationDraft {
        NotificationDraft::new(
            format!("Message from {sender_name}"),
            truncate(preview, 140),
        )
        .with_raw_type(RawType::Info)
        .with_category(NotificationCategory::Message)
        .with_payload(NotificationPayload::Message {
            conversation_id,
            sender_id,
        })
    }

    /// A delivery or response deadline is approaching.
    pub fn deadline_approaching(
        job_title: &str,
        job_id: OpportunityId,
        due_at: DateTime<Utc>,
    ) -> NotificationDraft {
        NotificationDraft::new(
            "Deadline Approaching",
            format!(
                "'{job_title}' is due {}",
                due_at.format("%Y-%m-%d %H:%M UTC")
            ),
        )
        .with_raw_type(RawType::Warning)
        .with_category(NotificationCategory::Job)
        .with_payload(NotificationPayload::Deadline { job_id, due_at })
    }

    /// A platform-wide announcement.
    pub fn system_announcement(title: &str, message: &str, urgent: bool) -> NotificationDraft {
        NotificationDraft::new(title, message)
            .with_raw_type(if urgent { RawType::Warning } else { RawType::Info })
            .with_category(NotificationCategory::System)
            .with_payload(NotificationPayload::System { urgent })
    }
}

fn format_amount(amount_cents: i64, currency: &str) -> String {
    let sign = if amount_cents < 0 { "-" } else { "" };
    let abs = amount_cents.unsigned_abs();
    format!("{sign}{}.{:02} {currency}", abs / 100, abs % 100)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
