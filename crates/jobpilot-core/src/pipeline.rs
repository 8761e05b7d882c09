//! The per-platform application pipeline.
//!
//! Drives one platform through search → dedupe → filter → score →
//! apply-gate → apply → summarize. Generic over all external
//! dependencies via traits, enabling dependency injection and
//! testability without real HTTP, LLM, or disk access.
//!
//! Every stage failure is absorbed at the stage boundary: a platform run
//! always reaches its terminal state and returns a report, never a
//! panic or propagated error. Sibling platforms are unaffected.

use std::collections::HashSet;

use chrono::Utc;

use crate::config::{AppConfig, FilterConfig, SalaryRange};
use crate::error::AppError;
use crate::filter::{self, FilterDecision};
use crate::models::{ApplicationRecord, ApplicationStatus, JobListing, PlatformRunReport};
use crate::pacing::JitterDelay;
use crate::traits::{
    GreetingComposer, JobPlatform, Ledger, Notifier, RelevanceScorer, blacklisted_companies,
};

const PROFILE_UNAVAILABLE: &str = "Candidate profile unavailable.";

/// Pipeline-level knobs for one platform run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub daily_limit: usize,
    pub job_intentions: Vec<String>,
    pub target_cities: Vec<String>,
    pub max_results_per_query: usize,
    pub filter: FilterConfig,
    pub salary: SalaryRange,
    /// Listings scoring below this never reach the apply gate.
    pub score_threshold: u8,
    pub filter_jitter: JitterDelay,
    pub apply_jitter: JitterDelay,
}

impl PipelineConfig {
    /// Build the pipeline configuration for one platform from the
    /// application config.
    pub fn for_platform(config: &AppConfig, platform: &str) -> Result<Self, AppError> {
        let platform_cfg = config
            .platforms
            .get(platform)
            .ok_or_else(|| AppError::Config(format!("unknown platform {platform}")))?;
        Ok(Self {
            daily_limit: platform_cfg.daily_limit,
            job_intentions: config.search.job_intentions.clone(),
            target_cities: config.search.target_cities.clone(),
            max_results_per_query: config.search.max_results_per_query,
            filter: config.filter.clone(),
            salary: config.search.salary_range,
            score_threshold: config.scorer.score_threshold,
            filter_jitter: JitterDelay::for_filtering(&config.pacing),
            apply_jitter: JitterDelay::for_applying(&config.pacing),
        })
    }
}

/// Orchestrates the application pipeline for one platform.
pub struct PipelineService<P, R, G, L, N>
where
    P: JobPlatform,
    R: RelevanceScorer,
    G: GreetingComposer,
    L: Ledger,
    N: Notifier,
{
    platform: P,
    scorer: R,
    greeter: G,
    ledger: L,
    notifier: N,
    config: PipelineConfig,
}

impl<P, R, G, L, N> PipelineService<P, R, G, L, N>
where
    P: JobPlatform,
    R: RelevanceScorer,
    G: GreetingComposer,
    L: Ledger,
    N: Notifier,
{
    pub fn new(
        platform: P,
        scorer: R,
        greeter: G,
        ledger: L,
        notifier: N,
        config: PipelineConfig,
    ) -> Self {
        Self {
            platform,
            scorer,
            greeter,
            ledger,
            notifier,
            config,
        }
    }

    /// Run the full pipeline for this platform. Infallible by design:
    /// any failure is folded into the returned report.
    pub async fn run_platform(&self) -> PlatformRunReport {
        let name = self.platform.name().to_string();
        tracing::info!(platform = %name, "Starting platform run");

        // CheckingSession — fails the run for this platform only.
        if !self.platform.check_session().await {
            tracing::warn!(platform = %name, "Session invalid, skipping platform");
            self.notifier
                .notify(
                    "Session invalid",
                    &format!("{name}: session credential rejected, refresh it and rerun"),
                )
                .await;
            return PlatformRunReport::skipped(&name, "session invalid");
        }

        // FetchingProfile — degrades to template text, never aborts.
        let profile_text = self.load_profile_text(&name).await;

        // Searching
        let all_listings = self.search_stage().await;
        let searched = all_listings.len();

        // Deduping — first occurrence wins, order preserved.
        let unique = dedupe_listings(all_listings);
        let deduped = unique.len();
        tracing::info!(platform = %name, searched, unique = deduped, "Search complete");

        // Filtering
        let filtered = self.filter_stage(&name, unique).await;
        let filtered_count = filtered.len();

        // Scoring
        let scored = self.score_stage(filtered, &profile_text).await;
        let scored_count = scored.len();
        tracing::info!(
            platform = %name,
            filtered = filtered_count,
            above_threshold = scored_count,
            "Scoring complete"
        );

        // ApplyGate — quota is derived from the ledger, never cached.
        let today = Utc::now().date_naive();
        let applied_today = match self.ledger.applied_count_on(&name, today).await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(platform = %name, error = %e, "Quota lookup failed");
                return PlatformRunReport::skipped(&name, "ledger unavailable");
            }
        };
        let remaining = self.config.daily_limit.saturating_sub(applied_today);
        if remaining == 0 {
            tracing::warn!(
                platform = %name,
                daily_limit = self.config.daily_limit,
                "Daily quota reached, skipping platform"
            );
            self.notifier
                .notify(
                    "Daily quota reached",
                    &format!(
                        "{name}: already submitted {applied_today} of {} applications today",
                        self.config.daily_limit
                    ),
                )
                .await;
            return PlatformRunReport {
                platform: name,
                success: true,
                searched,
                deduped,
                filtered: filtered_count,
                scored: scored_count,
                skipped_reason: Some("daily quota reached".into()),
                ..Default::default()
            };
        }

        let mut gated = scored;
        gated.truncate(remaining);

        // Applying
        let (applied, failed, ledger_ok) = self.apply_stage(&name, &gated, &profile_text).await;

        // Summarizing
        let report = PlatformRunReport {
            platform: name.clone(),
            success: ledger_ok,
            searched,
            deduped,
            filtered: filtered_count,
            scored: scored_count,
            applied,
            failed,
            skipped_reason: None,
        };
        tracing::info!(platform = %name, applied, failed, "Platform run finished");
        self.notifier
            .notify(&format!("{name} run summary"), &report.summary_text())
            .await;
        report
    }

    /// Load the profile text, preferring the ledger cache, then the
    /// platform, then the degraded placeholder.
    async fn load_profile_text(&self, name: &str) -> String {
        match self.ledger.cached_profile(name).await {
            Ok(Some(profile)) => {
                tracing::debug!(platform = %name, "Using cached profile");
                return profile.to_profile_text();
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(platform = %name, error = %e, "Profile cache read failed");
            }
        }

        match self.platform.fetch_profile().await {
            Some(profile) => {
                if let Err(e) = self.ledger.cache_profile(name, &profile).await {
                    tracing::warn!(platform = %name, error = %e, "Profile cache write failed");
                }
                profile.to_profile_text()
            }
            None => {
                tracing::warn!(
                    platform = %name,
                    "Profile unavailable, continuing with template greetings"
                );
                PROFILE_UNAVAILABLE.to_string()
            }
        }
    }

    /// Iterate (intention, city) combinations, paginating each until an
    /// empty page or the per-query cap. Search errors end the current
    /// query's pagination, not the run.
    async fn search_stage(&self) -> Vec<JobListing> {
        let mut all = Vec::new();
        for intention in &self.config.job_intentions {
            for city in &self.config.target_cities {
                let mut collected = 0usize;
                let mut page = 1u32;
                loop {
                    match self.platform.search_jobs(intention, city, page).await {
                        Ok(listings) if listings.is_empty() => break,
                        Ok(listings) => {
                            collected += listings.len();
                            all.extend(listings);
                            if collected >= self.config.max_results_per_query {
                                break;
                            }
                            page += 1;
                        }
                        Err(e) => {
                            tracing::warn!(
                                keyword = %intention,
                                city = %city,
                                page,
                                error = %e,
                                "Search failed, ending query"
                            );
                            break;
                        }
                    }
                }
                self.config.filter_jitter.pause().await;
            }
        }
        all
    }

    /// Static checks first, then detail fetch + keyword check for the
    /// survivors. A failed detail fetch drops the listing.
    async fn filter_stage(&self, name: &str, listings: Vec<JobListing>) -> Vec<JobListing> {
        let applied: HashSet<String> = if self.config.filter.exclude_applied {
            match self.ledger.applied_job_ids(name).await {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!(platform = %name, error = %e, "Applied-id lookup failed");
                    HashSet::new()
                }
            }
        } else {
            HashSet::new()
        };
        let blacklisted = match blacklisted_companies(
            &self.ledger,
            &self.config.filter.blacklist_companies,
        )
        .await
        {
            Ok(companies) => companies,
            Err(e) => {
                tracing::warn!(platform = %name, error = %e, "Blacklist read failed");
                self.config.filter.blacklist_companies.iter().cloned().collect()
            }
        };

        let mut kept = Vec::new();
        for mut listing in listings {
            match filter::static_filter(
                &listing,
                &self.config.filter,
                &self.config.salary,
                &blacklisted,
                &applied,
            ) {
                FilterDecision::Keep => {}
                FilterDecision::Drop(reason) => {
                    tracing::debug!(job_id = %listing.id, %reason, "Dropped listing");
                    continue;
                }
            }

            // Network-dependent part: enrich, then keyword check.
            let detail = match self.platform.fetch_detail(&listing.id).await {
                Ok(detail) => detail,
                Err(e) => {
                    tracing::warn!(job_id = %listing.id, error = %e, "Detail fetch failed, dropping");
                    self.config.filter_jitter.pause().await;
                    continue;
                }
            };
            self.config.filter_jitter.pause().await;

            match filter::keyword_filter(&detail.description, &self.config.filter) {
                FilterDecision::Keep => {
                    listing.description = Some(detail.description);
                    kept.push(listing);
                }
                FilterDecision::Drop(reason) => {
                    tracing::debug!(job_id = %listing.id, %reason, "Dropped listing");
                }
            }
        }
        kept
    }

    /// Score every survivor, keep those at or above the threshold, and
    /// stable-sort descending so ties keep filtering order.
    async fn score_stage(
        &self,
        listings: Vec<JobListing>,
        profile_text: &str,
    ) -> Vec<JobListing> {
        let mut scored = Vec::with_capacity(listings.len());
        for mut listing in listings {
            let description = listing.description.clone().unwrap_or_default();
            let report = self.scorer.score(&description, profile_text).await;
            tracing::debug!(job_id = %listing.id, score = report.total_score, "Scored listing");
            listing.score = Some(report);
            scored.push(listing);
        }
        scored.retain(|l| l.total_score() >= self.config.score_threshold);
        scored.sort_by(|a, b| b.total_score().cmp(&a.total_score()));
        scored
    }

    /// Apply to each gated listing, writing the ledger record before
    /// advancing to the next. Returns `(applied, failed, ledger_ok)`;
    /// a ledger write failure aborts the stage since continuing would
    /// lose quota accounting.
    async fn apply_stage(
        &self,
        name: &str,
        listings: &[JobListing],
        profile_text: &str,
    ) -> (usize, usize, bool) {
        let mut applied = 0usize;
        let mut failed = 0usize;
        for listing in listings {
            let greeting = self.greeter.compose(listing, profile_text).await;
            let status = match self.platform.apply(listing, &greeting).await {
                Ok(()) => {
                    applied += 1;
                    tracing::info!(job_id = %listing.id, company = %listing.company, "Applied");
                    ApplicationStatus::Applied
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(job_id = %listing.id, error = %e, "Apply failed");
                    ApplicationStatus::Failed
                }
            };

            let record = ApplicationRecord {
                platform: name.to_string(),
                job_id: listing.id.clone(),
                job_title: listing.title.clone(),
                company: listing.company.clone(),
                status,
                applied_at: Utc::now(),
            };
            if let Err(e) = self.ledger.record_application(&record).await {
                tracing::error!(job_id = %listing.id, error = %e, "Ledger write failed, aborting applies");
                return (applied, failed, false);
            }

            self.config.apply_jitter.pause().await;
        }
        (applied, failed, true)
    }
}

/// Collapse listings by platform-scoped id; first occurrence wins,
/// order preserved.
pub fn dedupe_listings(listings: Vec<JobListing>) -> Vec<JobListing> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(listings.len());
    for listing in listings {
        if seen.insert(listing.id.clone()) {
            unique.push(listing);
        }
    }
    unique
}
