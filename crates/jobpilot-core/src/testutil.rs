//! Test utilities: mock implementations of all capability traits.
//!
//! Handwritten mocks for dependency injection in unit tests. All mocks
//! use `Arc<Mutex<_>>` for interior mutability, allowing assertions on
//! recorded calls.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};

use crate::error::AppError;
use crate::models::{
    ApplicationRecord, ApplicationStatus, BlacklistEntry, CandidateProfile, JobDetail, JobListing,
    RelevanceReport,
};
use crate::traits::{GreetingComposer, JobPlatform, Ledger, Notifier, RelevanceScorer};

/// Build a listing with sensible defaults for tests.
pub fn make_listing(id: &str, company: &str) -> JobListing {
    JobListing {
        id: id.to_string(),
        title: format!("Engineer {id}"),
        company: company.to_string(),
        salary_text: "25-50K".to_string(),
        city: "Beijing".to_string(),
        hr_name: "Sam".to_string(),
        hr_title: "Recruiter".to_string(),
        hr_activity: "just now".to_string(),
        url: format!("https://example.com/{id}"),
        platform: "mock".to_string(),
        discovered_at: Utc::now(),
        description: None,
        score: None,
    }
}

/// Build an application record for tests.
pub fn make_record(platform: &str, job_id: &str, status: ApplicationStatus) -> ApplicationRecord {
    ApplicationRecord {
        platform: platform.to_string(),
        job_id: job_id.to_string(),
        job_title: format!("Engineer {job_id}"),
        company: "Initech".to_string(),
        status,
        applied_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// MockPlatform
// ---------------------------------------------------------------------------

/// Mock platform adapter with scripted responses.
#[derive(Clone)]
pub struct MockPlatform {
    name: String,
    session_ok: Arc<Mutex<bool>>,
    profile: Arc<Mutex<Option<CandidateProfile>>>,
    /// Each `search_jobs` call pops the front page; exhausted queue
    /// yields an empty page (the pagination stop signal).
    search_pages: Arc<Mutex<VecDeque<Vec<JobListing>>>>,
    /// Detail text per job id. Missing ids get a default description.
    details: Arc<Mutex<HashMap<String, JobDetail>>>,
    /// Job ids whose detail fetch fails with a transport error.
    detail_failures: Arc<Mutex<HashSet<String>>>,
    /// Job ids whose apply call is rejected.
    apply_failures: Arc<Mutex<HashSet<String>>>,
    pub apply_calls: Arc<Mutex<Vec<String>>>,
    pub search_calls: Arc<Mutex<Vec<(String, String, u32)>>>,
}

impl MockPlatform {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            session_ok: Arc::new(Mutex::new(true)),
            profile: Arc::new(Mutex::new(Some(CandidateProfile {
                name: "Jane Doe".into(),
                skills: vec!["Rust".into()],
                ..Default::default()
            }))),
            search_pages: Arc::new(Mutex::new(VecDeque::new())),
            details: Arc::new(Mutex::new(HashMap::new())),
            detail_failures: Arc::new(Mutex::new(HashSet::new())),
            apply_failures: Arc::new(Mutex::new(HashSet::new())),
            apply_calls: Arc::new(Mutex::new(Vec::new())),
            search_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_session_invalid(self) -> Self {
        *self.session_ok.lock().unwrap() = false;
        self
    }

    pub fn with_no_profile(self) -> Self {
        *self.profile.lock().unwrap() = None;
        self
    }

    pub fn with_page(self, listings: Vec<JobListing>) -> Self {
        self.search_pages.lock().unwrap().push_back(listings);
        self
    }

    pub fn with_detail(self, job_id: &str, description: &str) -> Self {
        self.details.lock().unwrap().insert(
            job_id.to_string(),
            JobDetail {
                description: description.to_string(),
                ..Default::default()
            },
        );
        self
    }

    pub fn with_detail_failure(self, job_id: &str) -> Self {
        self.detail_failures.lock().unwrap().insert(job_id.to_string());
        self
    }

    pub fn with_apply_failure(self, job_id: &str) -> Self {
        self.apply_failures.lock().unwrap().insert(job_id.to_string());
        self
    }

    pub fn apply_count(&self) -> usize {
        self.apply_calls.lock().unwrap().len()
    }
}

impl JobPlatform for MockPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check_session(&self) -> bool {
        *self.session_ok.lock().unwrap()
    }

    async fn fetch_profile(&self) -> Option<CandidateProfile> {
        self.profile.lock().unwrap().clone()
    }

    async fn search_jobs(
        &self,
        keyword: &str,
        city: &str,
        page: u32,
    ) -> Result<Vec<JobListing>, AppError> {
        self.search_calls
            .lock()
            .unwrap()
            .push((keyword.to_string(), city.to_string(), page));
        Ok(self.search_pages.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn fetch_detail(&self, job_id: &str) -> Result<JobDetail, AppError> {
        if self.detail_failures.lock().unwrap().contains(job_id) {
            return Err(AppError::NetworkError(format!("connection reset for {job_id}")));
        }
        Ok(self
            .details
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .unwrap_or_else(|| JobDetail {
                description: format!("Default description for {job_id}"),
                ..Default::default()
            }))
    }

    async fn apply(&self, listing: &JobListing, _greeting: &str) -> Result<(), AppError> {
        self.apply_calls.lock().unwrap().push(listing.id.clone());
        if self.apply_failures.lock().unwrap().contains(&listing.id) {
            return Err(AppError::ApplyRejected(format!("rejected {}", listing.id)));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockScorer
// ---------------------------------------------------------------------------

/// Scorer that matches substrings of the job description to fixed
/// scores, with a configurable default.
#[derive(Clone)]
pub struct MockScorer {
    by_substring: Arc<Mutex<Vec<(String, u8)>>>,
    default_score: u8,
    pub calls: Arc<Mutex<usize>>,
}

impl MockScorer {
    pub fn constant(score: u8) -> Self {
        Self {
            by_substring: Arc::new(Mutex::new(Vec::new())),
            default_score: score,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_score(self, substring: &str, score: u8) -> Self {
        self.by_substring
            .lock()
            .unwrap()
            .push((substring.to_string(), score));
        self
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl RelevanceScorer for MockScorer {
    async fn score(&self, job_description: &str, _profile_text: &str) -> RelevanceReport {
        *self.calls.lock().unwrap() += 1;
        let total = self
            .by_substring
            .lock()
            .unwrap()
            .iter()
            .find(|(sub, _)| job_description.contains(sub.as_str()))
            .map(|(_, score)| *score)
            .unwrap_or(self.default_score);
        RelevanceReport {
            total_score: total,
            skill_score: total,
            experience_score: total,
            education_score: total,
            industry_score: total,
            analysis: "mock".to_string(),
            recommend: total >= 70,
        }
    }
}

/// Scorer that always returns the fixed fallback report, simulating an
/// unreachable scoring service.
#[derive(Clone, Copy, Default)]
pub struct FallbackScorer;

impl RelevanceScorer for FallbackScorer {
    async fn score(&self, _job_description: &str, _profile_text: &str) -> RelevanceReport {
        RelevanceReport::fallback()
    }
}

// ---------------------------------------------------------------------------
// MockLedger
// ---------------------------------------------------------------------------

/// In-memory ledger with the same dedup semantics as the durable one.
#[derive(Clone, Default)]
pub struct MockLedger {
    pub applications: Arc<Mutex<Vec<ApplicationRecord>>>,
    pub blacklist_entries: Arc<Mutex<Vec<BlacklistEntry>>>,
    profiles: Arc<Mutex<HashMap<String, CandidateProfile>>>,
    record_error: Arc<Mutex<Option<AppError>>>,
}

impl MockLedger {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ApplicationRecord>) -> Self {
        Self {
            applications: Arc::new(Mutex::new(records)),
            ..Default::default()
        }
    }

    pub fn with_record_error(error: AppError) -> Self {
        Self {
            record_error: Arc::new(Mutex::new(Some(error))),
            ..Default::default()
        }
    }

    pub fn applied_records(&self, platform: &str) -> Vec<ApplicationRecord> {
        self.applications
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.platform == platform && r.status == ApplicationStatus::Applied)
            .cloned()
            .collect()
    }
}

impl Ledger for MockLedger {
    async fn record_application(&self, record: &ApplicationRecord) -> Result<bool, AppError> {
        let mut err = self.record_error.lock().unwrap();
        if let Some(e) = err.take() {
            return Err(e);
        }
        drop(err);

        let mut applications = self.applications.lock().unwrap();
        if record.status == ApplicationStatus::Applied {
            let duplicate = applications.iter().any(|r| {
                r.platform == record.platform
                    && r.job_id == record.job_id
                    && r.status == ApplicationStatus::Applied
            });
            if duplicate {
                return Ok(false);
            }
        }
        applications.push(record.clone());
        Ok(true)
    }

    async fn is_applied(&self, platform: &str, job_id: &str) -> Result<bool, AppError> {
        Ok(self.applications.lock().unwrap().iter().any(|r| {
            r.platform == platform
                && r.job_id == job_id
                && r.status == ApplicationStatus::Applied
        }))
    }

    async fn applied_job_ids(&self, platform: &str) -> Result<HashSet<String>, AppError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.platform == platform && r.status == ApplicationStatus::Applied)
            .map(|r| r.job_id.clone())
            .collect())
    }

    async fn applied_count_on(&self, platform: &str, date: NaiveDate) -> Result<usize, AppError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.platform == platform
                    && r.status == ApplicationStatus::Applied
                    && r.applied_on() == date
            })
            .count())
    }

    async fn add_blacklist_reason(&self, company: &str, reason: &str) -> Result<(), AppError> {
        let mut entries = self.blacklist_entries.lock().unwrap();
        if let Some(entry) = entries.iter_mut().find(|e| e.company == company) {
            entry.reasons.push(reason.to_string());
            entry.updated_at = Utc::now();
        } else {
            entries.push(BlacklistEntry {
                company: company.to_string(),
                reasons: vec![reason.to_string()],
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
        }
        Ok(())
    }

    async fn blacklist(&self) -> Result<Vec<BlacklistEntry>, AppError> {
        Ok(self.blacklist_entries.lock().unwrap().clone())
    }

    async fn cached_profile(&self, platform: &str) -> Result<Option<CandidateProfile>, AppError> {
        Ok(self.profiles.lock().unwrap().get(platform).cloned())
    }

    async fn cache_profile(
        &self,
        platform: &str,
        profile: &CandidateProfile,
    ) -> Result<(), AppError> {
        self.profiles
            .lock()
            .unwrap()
            .insert(platform.to_string(), profile.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockNotifier
// ---------------------------------------------------------------------------

/// Notifier that records every message.
#[derive(Clone, Default)]
pub struct MockNotifier {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }
}

impl Notifier for MockNotifier {
    async fn notify(&self, title: &str, body: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }
}

// ---------------------------------------------------------------------------
// MockGreeter
// ---------------------------------------------------------------------------

/// Greeter that returns a fixed message and records calls.
#[derive(Clone)]
pub struct MockGreeter {
    message: String,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockGreeter {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl GreetingComposer for MockGreeter {
    async fn compose(&self, listing: &JobListing, _profile_text: &str) -> String {
        self.calls.lock().unwrap().push(listing.id.clone());
        self.message.clone()
    }
}
