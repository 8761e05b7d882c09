use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A job listing discovered by a platform search.
///
/// Immutable once fetched, except for `description` and `score` which are
/// appended by the detail-fetch and scoring pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListing {
    /// Platform-scoped identifier, unique per platform.
    pub id: String,
    pub title: String,
    pub company: String,
    /// Raw salary text as shown by the platform, e.g. "25-50K".
    pub salary_text: String,
    pub city: String,
    /// Name of the HR contact, if exposed by the listing.
    pub hr_name: String,
    /// Title of the HR contact, used for headhunter detection.
    pub hr_title: String,
    /// Raw activity text for the HR contact, e.g. "active 3 hours ago".
    pub hr_activity: String,
    pub url: String,
    /// Source platform tag, e.g. "zhipin".
    pub platform: String,
    pub discovered_at: DateTime<Utc>,
    /// Full job description, populated by the detail-fetch stage.
    #[serde(default)]
    pub description: Option<String>,
    /// Relevance report attached by the scoring stage.
    #[serde(default)]
    pub score: Option<RelevanceReport>,
}

impl JobListing {
    /// Total relevance score, or 0 if the listing was never scored.
    pub fn total_score(&self) -> u8 {
        self.score.as_ref().map(|s| s.total_score).unwrap_or(0)
    }
}

/// Detail payload for one listing, fetched lazily.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobDetail {
    pub description: String,
    #[serde(default)]
    pub company_scale: Option<String>,
    #[serde(default)]
    pub company_industry: Option<String>,
}

/// One entry in the candidate's work history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkExperience {
    pub company: String,
    pub position: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub description: String,
}

/// One entry in the candidate's education history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Education {
    pub school: String,
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub degree: String,
}

/// Structured resume data for the candidate, plus a rendered text form.
///
/// Loaded once per platform run and read-only afterwards. May be cached
/// across runs through the ledger's profile store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    #[serde(default)]
    pub years_of_experience: Option<u32>,
    #[serde(default)]
    pub work_history: Vec<WorkExperience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl CandidateProfile {
    /// Render the profile as free text for scoring and greeting generation.
    pub fn to_profile_text(&self) -> String {
        let mut text = String::from("## Candidate profile\n");
        text.push_str(&format!("- Name: {}\n", self.name));
        if let Some(years) = self.years_of_experience {
            text.push_str(&format!("- Years of experience: {years}\n"));
        }
        if !self.work_history.is_empty() {
            text.push_str("\n### Work history\n");
            for exp in &self.work_history {
                text.push_str(&format!(
                    "- {} | {} | {} - {}\n",
                    exp.company, exp.position, exp.start_date, exp.end_date
                ));
                if !exp.description.is_empty() {
                    text.push_str(&format!("  {}\n", exp.description));
                }
            }
        }
        if !self.education.is_empty() {
            text.push_str("\n### Education\n");
            for edu in &self.education {
                text.push_str(&format!("- {} | {} | {}\n", edu.school, edu.major, edu.degree));
            }
        }
        if !self.skills.is_empty() {
            text.push_str("\n### Skills\n");
            for skill in &self.skills {
                text.push_str(&format!("- {skill}\n"));
            }
        }
        text
    }
}

/// Outcome of one application attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Applied,
    Failed,
    Skipped,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Failed => "failed",
            ApplicationStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "applied" => Ok(ApplicationStatus::Applied),
            "failed" => Ok(ApplicationStatus::Failed),
            "skipped" => Ok(ApplicationStatus::Skipped),
            _ => Err(format!("Unknown application status: {s}")),
        }
    }
}

/// Durable record of one application attempt.
///
/// Append-only; `(platform, job_id)` is the dedup key. At most one
/// record with status `applied` ever exists for a given key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub platform: String,
    pub job_id: String,
    pub job_title: String,
    pub company: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

impl ApplicationRecord {
    /// Date bucket used for daily-quota accounting.
    pub fn applied_on(&self) -> NaiveDate {
        self.applied_at.date_naive()
    }
}

/// Durable blacklist entry for a company.
///
/// Reasons accumulate in order; updating an existing entry appends a
/// reason rather than creating a second entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub company: String,
    pub reasons: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Relevance report for one job description against the candidate profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceReport {
    pub total_score: u8,
    pub skill_score: u8,
    pub experience_score: u8,
    pub education_score: u8,
    pub industry_score: u8,
    /// Short rationale, at most 200 characters.
    pub analysis: String,
    pub recommend: bool,
}

impl RelevanceReport {
    /// Fixed neutral report returned when the scoring service is
    /// unreachable or its response cannot be parsed.
    ///
    /// Deterministic on purpose: the pipeline treats it as valid
    /// low-confidence input, never as an error.
    pub fn fallback() -> Self {
        Self {
            total_score: 50,
            skill_score: 50,
            experience_score: 50,
            education_score: 50,
            industry_score: 50,
            analysis: "Scoring unavailable; neutral score assigned.".to_string(),
            recommend: false,
        }
    }
}

/// Per-platform result of one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlatformRunReport {
    pub platform: String,
    pub success: bool,
    pub searched: usize,
    pub deduped: usize,
    pub filtered: usize,
    pub scored: usize,
    pub applied: usize,
    pub failed: usize,
    /// Set when the platform run ended early (invalid session, quota
    /// exhausted), with a human-readable reason.
    pub skipped_reason: Option<String>,
}

impl PlatformRunReport {
    pub fn skipped(platform: &str, reason: impl Into<String>) -> Self {
        Self {
            platform: platform.to_string(),
            success: false,
            skipped_reason: Some(reason.into()),
            ..Default::default()
        }
    }

    /// One-paragraph notification body for this platform run.
    pub fn summary_text(&self) -> String {
        match &self.skipped_reason {
            Some(reason) => format!("Platform: {}\nSkipped: {}", self.platform, reason),
            None => format!(
                "Platform: {}\nSearched: {}\nUnique: {}\nFiltered: {}\nMatched: {}\nApplied: {}\nFailed: {}",
                self.platform,
                self.searched,
                self.deduped,
                self.filtered,
                self.scored,
                self.applied,
                self.failed
            ),
        }
    }
}

/// Aggregate of all platform runs in one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub platforms: usize,
    pub successes: usize,
    pub total_applied: usize,
    pub reports: Vec<PlatformRunReport>,
}

impl RunSummary {
    pub fn aggregate(
        run_id: String,
        started_at: DateTime<Utc>,
        reports: Vec<PlatformRunReport>,
    ) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            platforms: reports.len(),
            successes: reports.iter().filter(|r| r.success).count(),
            total_applied: reports.iter().map(|r| r.applied).sum(),
            reports,
        }
    }

    /// Notification body aggregating all platform runs.
    pub fn summary_text(&self) -> String {
        format!(
            "Run {}\nPlatforms: {}\nSucceeded: {}\nTotal applied: {}\nFinished: {}",
            self.run_id,
            self.platforms,
            self.successes,
            self.total_applied,
            self.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}
