use std::collections::HashSet;
use std::future::Future;

use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::{
    ApplicationRecord, BlacklistEntry, CandidateProfile, JobDetail, JobListing, RelevanceReport,
};

/// Capability contract implemented once per recruiting platform.
///
/// Platform-specific knowledge (endpoints, payload shapes, city codes)
/// lives entirely behind this trait; the pipeline drives every platform
/// through the same stages.
pub trait JobPlatform: Send + Sync + Clone {
    /// Stable platform tag, e.g. "zhipin". Used as the ledger key prefix.
    fn name(&self) -> &str;

    /// Check whether the configured session credential is still valid.
    ///
    /// Fails closed: any transport or parse error yields `false`.
    fn check_session(&self) -> impl Future<Output = bool> + Send;

    /// Fetch the candidate profile from the platform.
    ///
    /// Returns `None` on any failure; the caller degrades to template
    /// greetings instead of aborting.
    fn fetch_profile(&self) -> impl Future<Output = Option<CandidateProfile>> + Send;

    /// Search one page of listings for a keyword in a city.
    ///
    /// An empty page is the sole pagination stop signal, not an error.
    fn search_jobs(
        &self,
        keyword: &str,
        city: &str,
        page: u32,
    ) -> impl Future<Output = Result<Vec<JobListing>, AppError>> + Send;

    /// Fetch the detail payload for one listing. Idempotent.
    fn fetch_detail(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<JobDetail, AppError>> + Send;

    /// Submit an application with the given greeting message.
    ///
    /// Side-effecting and not transactional across platform state: a
    /// partially delivered greeting is tolerated, any step failure makes
    /// the whole attempt `failed`.
    fn apply(
        &self,
        listing: &JobListing,
        greeting: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Scores a job description against the candidate profile.
///
/// Infallible by contract: implementations map transport and parse
/// failures to [`RelevanceReport::fallback`].
pub trait RelevanceScorer: Send + Sync + Clone {
    fn score(
        &self,
        job_description: &str,
        profile_text: &str,
    ) -> impl Future<Output = RelevanceReport> + Send;
}

/// Produces the greeting message sent with an application.
///
/// Infallible: implementations fall back to a plain template when
/// personalization is unavailable.
pub trait GreetingComposer: Send + Sync + Clone {
    fn compose(
        &self,
        listing: &JobListing,
        profile_text: &str,
    ) -> impl Future<Output = String> + Send;
}

/// Durable store of application records, the company blacklist, and
/// cached candidate profiles.
///
/// Single-writer access is assumed; every mutation is flushed before the
/// call returns so that a crash after N applications leaves exactly N
/// durable records.
pub trait Ledger: Send + Sync + Clone {
    /// Append an application record.
    ///
    /// Enforces the dedup invariant: if an `applied` record already
    /// exists for `(platform, job_id)`, a second `applied` record is not
    /// written and `Ok(false)` is returned.
    fn record_application(
        &self,
        record: &ApplicationRecord,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Whether an `applied` record exists for `(platform, job_id)`.
    fn is_applied(
        &self,
        platform: &str,
        job_id: &str,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// All job ids with an `applied` record on this platform.
    fn applied_job_ids(
        &self,
        platform: &str,
    ) -> impl Future<Output = Result<HashSet<String>, AppError>> + Send;

    /// Count of `applied` records for a platform on a given date.
    /// Derived from history on demand so the quota cannot drift.
    fn applied_count_on(
        &self,
        platform: &str,
        date: NaiveDate,
    ) -> impl Future<Output = Result<usize, AppError>> + Send;

    /// Append a reason to a company's blacklist entry, creating the
    /// entry if the company is not yet listed.
    fn add_blacklist_reason(
        &self,
        company: &str,
        reason: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// All blacklist entries.
    fn blacklist(&self) -> impl Future<Output = Result<Vec<BlacklistEntry>, AppError>> + Send;

    /// Cached candidate profile for a platform, if any.
    fn cached_profile(
        &self,
        platform: &str,
    ) -> impl Future<Output = Result<Option<CandidateProfile>, AppError>> + Send;

    /// Cache the candidate profile for a platform.
    fn cache_profile(
        &self,
        platform: &str,
        profile: &CandidateProfile,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Fire-and-forget notification side-channel.
///
/// Failures are logged by the implementation and never surface to the
/// pipeline.
pub trait Notifier: Send + Sync + Clone {
    fn notify(&self, title: &str, body: &str) -> impl Future<Output = ()> + Send;
}

/// Notifier that drops every message. Used when notifications are
/// disabled in configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    async fn notify(&self, _title: &str, _body: &str) {}
}

/// Greeting composer that always uses the plain template.
///
/// Also the degraded path for personalized composers when the profile or
/// the generation service is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGreeting;

impl TemplateGreeting {
    /// Deterministic template referencing the job title.
    pub fn render(listing: &JobListing) -> String {
        format!(
            "Hello, I am very interested in your {} position. My background \
             and skills are a close match and I would welcome the chance to \
             talk further.",
            listing.title
        )
    }
}

impl GreetingComposer for TemplateGreeting {
    async fn compose(&self, listing: &JobListing, _profile_text: &str) -> String {
        Self::render(listing)
    }
}

/// Ids of companies currently blacklisted, merging the static
/// configuration list with durable ledger entries.
pub async fn blacklisted_companies<L: Ledger>(
    ledger: &L,
    configured: &[String],
) -> Result<HashSet<String>, AppError> {
    let mut companies: HashSet<String> = configured.iter().cloned().collect();
    for entry in ledger.blacklist().await? {
        companies.insert(entry.company);
    }
    Ok(companies)
}
