//! Weekly digest deduplication across runs.

use std::sync::Arc;

use chrono::{Duration, Utc};

use notifyhub_core::config::DigestConfig;
use notifyhub_core::types::id::{OpportunityId, UserId};
use notifyhub_database::MemoryNotificationRepository;
use notifyhub_entity::{NotificationKind, Opportunity};
use notifyhub_service::{DigestGenerator, NotificationDispatcher, NotificationTemplates};

#[tokio::test]
async fn test_rerun_over_unchanged_window_counts_nothing_twice() {
    let repo = Arc::new(MemoryNotificationRepository::default());
    let dispatcher = NotificationDispatcher::new(repo.clone());
    let generator = DigestGenerator::new(repo.clone(), DigestConfig::default());
    let user = UserId::new();

    for i in 0..3 {
        dispatcher
            .notify(NotificationTemplates::payment_received(&format!("pi_{i}"), 2_500, "USD").to(user))
            .await
            .unwrap();
    }
    dispatcher
        .notify(NotificationTemplates::system_announcement("Maintenance", "Sunday 02:00 UTC", false).to(user))
        .await
        .unwrap();

    let now = Utc::now() + Duration::seconds(1);
    let first = generator.generate(user, &[], &[], now).await.unwrap();
    let second = generator.generate(user, &[], &[], now).await.unwrap();

    assert_eq!(first.total, 4);
    assert_eq!(first.count(NotificationKind::PaymentReceived), 3);
    assert_eq!(first.count(NotificationKind::SystemNotice), 1);
    assert_eq!(second.total, 0);
    assert_eq!(first.total + second.total, 4);
}

#[tokio::test]
async fn test_matches_capped_and_ranked() {
    let repo = Arc::new(MemoryNotificationRepository::default());
    let generator = DigestGenerator::new(
        repo,
        DigestConfig {
            max_matches: 2,
            ..DigestConfig::default()
        },
    );
    let now = Utc::now();
    let opportunity = |title: &str| Opportunity {
        id: OpportunityId::new(),
        title: title.to_string(),
        description: String::new(),
        posted_at: now - Duration::days(1),
    };
    let candidates = vec![
        opportunity("Qualitative interviews"),
        opportunity("Survey statistics in Python"),
        opportunity("Statistics review"),
        opportunity("Python scripting"),
    ];
    let skills = vec!["python".to_string(), "statistics".to_string()];

    let digest = generator
        .generate(UserId::new(), &skills, &candidates, now)
        .await
        .unwrap();

    let titles: Vec<&str> = digest.matches.iter().map(|m| m.opportunity.title.as_str()).collect();
    assert_eq!(titles, vec!["Survey statistics in Python", "Statistics review"]);
    assert!(digest.render_text().contains("Survey statistics in Python"));
}
