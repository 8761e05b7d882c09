//! Deterministic keep/drop filtering for job listings.
//!
//! All checks are independent AND-conditions over listing fields and
//! static configuration; order only matters for short-circuiting cost.
//! The static checks never touch the network, so the pipeline runs them
//! before paying for a detail fetch. The keyword check needs the full
//! description and therefore runs after detail enrichment.

use std::collections::HashSet;
use std::fmt;

use crate::config::{FilterConfig, SalaryRange};
use crate::models::JobListing;

/// Why a listing was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    AlreadyApplied,
    BlacklistedCompany,
    Headhunter,
    InactiveHr { hours: u32 },
    SalaryBelowRange,
    BlacklistedKeyword(String),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::AlreadyApplied => write!(f, "already applied"),
            DropReason::BlacklistedCompany => write!(f, "blacklisted company"),
            DropReason::Headhunter => write!(f, "headhunter posting"),
            DropReason::InactiveHr { hours } => write!(f, "HR inactive for {hours}h"),
            DropReason::SalaryBelowRange => write!(f, "salary below range"),
            DropReason::BlacklistedKeyword(kw) => write!(f, "blacklisted keyword '{kw}'"),
        }
    }
}

/// Keep/drop decision for one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Keep,
    Drop(DropReason),
}

impl FilterDecision {
    pub fn is_keep(&self) -> bool {
        matches!(self, FilterDecision::Keep)
    }
}

/// Run every check that needs no network call.
///
/// Pure over the listing, the filter configuration, the blacklist
/// snapshot, and the already-applied snapshot. HR activity recency is
/// computed from the listing's own activity text, never from the wall
/// clock.
pub fn static_filter(
    listing: &JobListing,
    cfg: &FilterConfig,
    salary: &SalaryRange,
    blacklisted: &HashSet<String>,
    applied: &HashSet<String>,
) -> FilterDecision {
    if cfg.exclude_applied && applied.contains(&listing.id) {
        return FilterDecision::Drop(DropReason::AlreadyApplied);
    }

    if blacklisted.contains(&listing.company) {
        return FilterDecision::Drop(DropReason::BlacklistedCompany);
    }

    if cfg.exclude_headhunter {
        let hr_title = listing.hr_title.to_lowercase();
        if cfg
            .headhunter_titles
            .iter()
            .any(|marker| hr_title.contains(&marker.to_lowercase()))
        {
            return FilterDecision::Drop(DropReason::Headhunter);
        }
    }

    if cfg.hr_activity_threshold_hours > 0 {
        if let Some(hours) = parse_activity_hours(&listing.hr_activity) {
            if hours > cfg.hr_activity_threshold_hours {
                return FilterDecision::Drop(DropReason::InactiveHr { hours });
            }
        }
    }

    if salary.min > 0 {
        if let Some((_, upper)) = parse_salary_k(&listing.salary_text) {
            if upper < salary.min {
                return FilterDecision::Drop(DropReason::SalaryBelowRange);
            }
        }
    }

    FilterDecision::Keep
}

/// Check the enriched description against the keyword deny-list.
pub fn keyword_filter(description: &str, cfg: &FilterConfig) -> FilterDecision {
    for keyword in &cfg.blacklist_keywords {
        if !keyword.is_empty() && description.contains(keyword.as_str()) {
            return FilterDecision::Drop(DropReason::BlacklistedKeyword(keyword.clone()));
        }
    }
    FilterDecision::Keep
}

/// Parse HR activity text into hours since last seen.
///
/// Recognizes the phrasing recruiting sites use ("刚刚活跃", "3小时前",
/// "2天前", and their English equivalents). Returns `None` for text it
/// cannot interpret; the caller keeps the listing in that case.
pub fn parse_activity_hours(text: &str) -> Option<u32> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }
    if text.contains("刚刚") || text.contains("just now") || text.contains("online") {
        return Some(0);
    }
    if text.contains("分钟") || text.contains("minute") {
        return Some(0);
    }
    if text.contains("半年") {
        return Some(24 * 180);
    }
    let number = first_number(&text);
    if text.contains("小时") || text.contains("hour") {
        return number;
    }
    if text.contains("天") || text.contains("day") {
        return number.map(|d| d * 24);
    }
    if text.contains("周") || text.contains("week") {
        return number.map(|w| w * 24 * 7);
    }
    if text.contains("月") || text.contains("month") {
        return number.map(|m| m * 24 * 30);
    }
    None
}

/// Parse a salary band like "25-50K" or "20k-35k" into thousands.
///
/// Returns `(lower, upper)`. Single values ("30K") yield the same bound
/// twice. Negotiable or free-form text yields `None`.
pub fn parse_salary_k(text: &str) -> Option<(u32, u32)> {
    let text = text.trim().to_lowercase();
    if !text.contains('k') {
        return None;
    }
    let numeric: String = text
        .chars()
        .map(|c| if c.is_ascii_digit() || c == '-' { c } else { ' ' })
        .collect();
    let mut bounds = numeric
        .split(['-', ' '])
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<u32>().ok());
    let lower = bounds.next()?;
    let upper = bounds.next().unwrap_or(lower);
    Some((lower, upper.max(lower)))
}

// The number may sit anywhere in the phrase ("3小时前", "active 4 hours
// ago"), so scan to the first digit run rather than anchoring at the start.
fn first_number(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use chrono::Utc;

    fn listing() -> JobListing {
        JobListing {
            id: "j-100".into(),
            title: "Backend Engineer".into(),
            company: "Initech".into(),
            salary_text: "25-50K".into(),
            city: "Beijing".into(),
            hr_name: "Sam".into(),
            hr_title: "Recruiter".into(),
            hr_activity: "3小时前".into(),
            url: "https://example.com/j-100".into(),
            platform: "zhipin".into(),
            discovered_at: Utc::now(),
            description: None,
            score: None,
        }
    }

    fn cfg() -> FilterConfig {
        FilterConfig {
            blacklist_keywords: vec!["outsourcing".into()],
            ..Default::default()
        }
    }

    #[test]
    fn keeps_a_clean_listing() {
        let decision = static_filter(
            &listing(),
            &cfg(),
            &SalaryRange::default(),
            &HashSet::new(),
            &HashSet::new(),
        );
        assert!(decision.is_keep());
    }

    #[test]
    fn drops_already_applied() {
        let applied: HashSet<String> = ["j-100".to_string()].into();
        let decision = static_filter(
            &listing(),
            &cfg(),
            &SalaryRange::default(),
            &HashSet::new(),
            &applied,
        );
        assert_eq!(decision, FilterDecision::Drop(DropReason::AlreadyApplied));
    }

    #[test]
    fn exclude_applied_false_keeps_applied_listing() {
        let applied: HashSet<String> = ["j-100".to_string()].into();
        let config = FilterConfig {
            exclude_applied: false,
            ..cfg()
        };
        let decision = static_filter(
            &listing(),
            &config,
            &SalaryRange::default(),
            &HashSet::new(),
            &applied,
        );
        assert!(decision.is_keep());
    }

    #[test]
    fn drops_blacklisted_company() {
        let blacklisted: HashSet<String> = ["Initech".to_string()].into();
        let decision = static_filter(
            &listing(),
            &cfg(),
            &SalaryRange::default(),
            &blacklisted,
            &HashSet::new(),
        );
        assert_eq!(decision, FilterDecision::Drop(DropReason::BlacklistedCompany));
    }

    #[test]
    fn drops_headhunter_title() {
        let mut job = listing();
        job.hr_title = "Senior Headhunter".into();
        let decision = static_filter(
            &job,
            &cfg(),
            &SalaryRange::default(),
            &HashSet::new(),
            &HashSet::new(),
        );
        assert_eq!(decision, FilterDecision::Drop(DropReason::Headhunter));
    }

    #[test]
    fn drops_inactive_hr_past_threshold() {
        let mut job = listing();
        job.hr_activity = "3天前".into();
        let decision = static_filter(
            &job,
            &cfg(),
            &SalaryRange::default(),
            &HashSet::new(),
            &HashSet::new(),
        );
        assert_eq!(decision, FilterDecision::Drop(DropReason::InactiveHr { hours: 72 }));
    }

    #[test]
    fn keeps_unparsable_activity_text() {
        let mut job = listing();
        job.hr_activity = "recently".into();
        let decision = static_filter(
            &job,
            &cfg(),
            &SalaryRange::default(),
            &HashSet::new(),
            &HashSet::new(),
        );
        assert!(decision.is_keep());
    }

    #[test]
    fn drops_salary_below_floor() {
        let mut job = listing();
        job.salary_text = "8-12K".into();
        let salary = SalaryRange { min: 20, max: 50 };
        let decision = static_filter(&job, &cfg(), &salary, &HashSet::new(), &HashSet::new());
        assert_eq!(decision, FilterDecision::Drop(DropReason::SalaryBelowRange));
    }

    #[test]
    fn keeps_negotiable_salary_text() {
        let mut job = listing();
        job.salary_text = "negotiable".into();
        let salary = SalaryRange { min: 20, max: 50 };
        let decision = static_filter(&job, &cfg(), &salary, &HashSet::new(), &HashSet::new());
        assert!(decision.is_keep());
    }

    #[test]
    fn keyword_filter_drops_on_match() {
        let decision = keyword_filter("Large outsourcing team, on-site", &cfg());
        assert_eq!(
            decision,
            FilterDecision::Drop(DropReason::BlacklistedKeyword("outsourcing".into()))
        );
        assert!(keyword_filter("Small product team", &cfg()).is_keep());
    }

    #[test]
    fn filter_is_deterministic() {
        let job = listing();
        let config = cfg();
        let salary = SalaryRange { min: 20, max: 50 };
        let blacklisted = HashSet::new();
        let applied = HashSet::new();
        let first = static_filter(&job, &config, &salary, &blacklisted, &applied);
        for _ in 0..10 {
            assert_eq!(
                first,
                static_filter(&job, &config, &salary, &blacklisted, &applied)
            );
        }
    }

    #[test]
    fn activity_parsing_table() {
        assert_eq!(parse_activity_hours("刚刚活跃"), Some(0));
        assert_eq!(parse_activity_hours("5分钟前"), Some(0));
        assert_eq!(parse_activity_hours("3小时前"), Some(3));
        assert_eq!(parse_activity_hours("2天前"), Some(48));
        assert_eq!(parse_activity_hours("1周前"), Some(168));
        assert_eq!(parse_activity_hours("active 4 hours ago"), Some(4));
        assert_eq!(parse_activity_hours("active 3 days ago"), Some(72));
        assert_eq!(parse_activity_hours("last seen 2 weeks ago"), Some(336));
        assert_eq!(parse_activity_hours(""), None);
        assert_eq!(parse_activity_hours("unknown"), None);
        // Unit word without a number stays unparsable.
        assert_eq!(parse_activity_hours("days ago"), None);
    }

    #[test]
    fn salary_parsing_table() {
        assert_eq!(parse_salary_k("25-50K"), Some((25, 50)));
        assert_eq!(parse_salary_k("20k-35k"), Some((20, 35)));
        assert_eq!(parse_salary_k("30K"), Some((30, 30)));
        assert_eq!(parse_salary_k("面议"), None);
        assert_eq!(parse_salary_k(""), None);
    }
}
