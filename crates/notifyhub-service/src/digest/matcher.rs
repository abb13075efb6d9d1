//! Keyword relevance scoring of open opportunities.

use notifyhub_entity::Opportunity;

use super::model::OpportunityMatch;

/// Score each opportunity by how many of `skills` occur in its title or
/// description, ignoring case.
///
/// Only opportunities with a non-zero score are returned, highest first.
/// Equal scores keep the input order.
pub fn match_opportunities(skills: &[String], opportunities: &[Opportunity]) -> Vec<OpportunityMatch> {
    let mut keywords: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let keyword = skill.trim().to_lowercase();
        if !keyword.is_empty() && !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
    }
    if keywords.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<OpportunityMatch> = opportunities
        .iter()
        .filter_map(|opportunity| {
            let haystack = format!("{} {}", opportunity.title, opportunity.description).to_lowercase();
            let matched: Vec<String> = keywords
                .iter()
                .filter(|k| haystack.contains(k.as_str()))
                .cloned()
                .collect();
            (!matched.is_empty()).then(|| OpportunityMatch {
                opportunity: opportunity.clone(),
                score: matched.len() as u32,
                matched_skills: matched,
            })
        })
        .collect();

    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}
