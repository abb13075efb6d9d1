//! Notification action resolution.
//!
//! Every surface resolves a clicked notification through [`resolve_action`]
//! so the badge dropdown, the full page, and toasts behave identically.

use serde::{Deserialize, Serialize};

use notifyhub_core::traits::Navigator;
use notifyhub_entity::NotificationPayload;

/// Query parameter that selects a tab on an in-app page.
const TAB_PARAM: &str = "tab";

/// Where a notification click leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionTarget {
    /// Absolute URL opened in a new browsing context.
    External {
        /// The URL.
        url: String,
    },
    /// In-app navigation to a page and tab.
    InApp {
        /// Page path without the query string.
        path: String,
        /// Tab to select.
        tab: String,
    },
    /// Plain internal redirect.
    Redirect {
        /// Path, query string included.
        path: String,
    },
}

impl ActionTarget {
    /// Hand the target to the navigation collaborator.
    pub fn perform(&self, navigator: &dyn Navigator) {
        match self {
            Self::External { url } => navigator.open_external(url),
            Self::InApp { path, tab } => navigator.navigate(path, Some(tab)),
            Self::Redirect { path } => navigator.redirect(path),
        }
    }
}

/// Resolve the target for a notification.
///
/// The explicit action URL wins; without one the payload's default action
/// is used. Returns `None` when neither exists.
pub fn resolve_action(action_url: Option<&str>, payload: &NotificationPayload) -> Option<ActionTarget> {
    let url = action_url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .or_else(|| payload.default_action_url())?;
    Some(classify_url(&url))
}

fn classify_url(url: &str) -> ActionTarget {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return ActionTarget::External {
            url: url.to_string(),
        };
    }

    let without_fragment = url.split('#').next().unwrap_or(url);
    if let Some((path, query)) = without_fragment.split_once('?') {
        let tab = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, value)| *key == TAB_PARAM && !value.is_empty())
            .map(|(_, value)| value.to_string());

        if let Some(tab) = tab {
            let path = if path.is_empty() { "/" } else { path };
            return ActionTarget::InApp {
                path: path.to_string(),
                tab,
            };
        }
    }

    ActionTarget::Redirect {
        path: url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use notifyhub_core::types::id::OpportunityId;

    use super::*;

    #[test]
    fn test_external_urls() {
        assert_eq!(
            resolve_action(Some("https://meet.example.com/abc"), &NotificationPayload::None),
            Some(ActionTarget::External {
                url: "https://meet.example.com/abc".to_string()
            })
        );
        assert!(matches!(
            resolve_action(Some("HTTP://example.com"), &NotificationPayload::None),
            Some(ActionTarget::External { .. })
        ));
    }

    #[test]
    fn test_tab_parameter_becomes_in_app_navigation() {
        assert_eq!(
            resolve_action(Some("/dashboard?tab=upcoming"), &NotificationPayload::None),
            Some(ActionTarget::InApp {
                path: "/dashboard".to_string(),
                tab: "upcoming".to_string()
            })
        );
        assert_eq!(
            resolve_action(Some("/dashboard?sort=new&tab=payments#top"), &NotificationPayload::None),
            Some(ActionTarget::InApp {
                path: "/dashboard".to_string(),
                tab: "payments".to_string()
            })
        );
    }

    #[test]
    fn test_other_internal_urls_redirect() {
        assert_eq!(
            resolve_action(Some("/messages?page=2"), &NotificationPayload::None),
            Some(ActionTarget::Redirect {
                path: "/messages?page=2".to_string()
            })
        );
        assert_eq!(
            resolve_action(Some("/dashboard?tab="), &NotificationPayload::None),
            Some(ActionTarget::Redirect {
                path: "/dashboard?tab=".to_string()
            })
        );
    }

    #[test]
    fn test_payload_default_when_url_missing() {
        let job_id = OpportunityId::new();
        let payload = NotificationPayload::Job {
            job_id,
            client_id: None,
        };
        assert_eq!(
            resolve_action(None, &payload),
            Some(ActionTarget::Redirect {
                path: format!("/jobs/{job_id}")
            })
        );
        assert_eq!(resolve_action(Some("  "), &NotificationPayload::None), None);
    }
}
