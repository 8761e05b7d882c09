use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Per-platform settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Daily cap on submitted applications for this platform.
    #[serde(default = "default_daily_limit")]
    pub daily_limit: usize,
    /// Opaque session credential obtained out of band. Expiry is only
    /// detected by the session check failing.
    #[serde(default)]
    pub session_token: String,
    /// Override for the platform's API base URL.
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_daily_limit() -> usize {
    50
}

/// Search preferences: what to look for and where.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    pub job_intentions: Vec<String>,
    pub target_cities: Vec<String>,
    #[serde(default)]
    pub salary_range: SalaryRange,
    /// Cap on accumulated results per (intention, city) query.
    #[serde(default = "default_max_results")]
    pub max_results_per_query: usize,
}

fn default_max_results() -> usize {
    30
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SalaryRange {
    /// Minimum expected salary, in thousands per month.
    pub min: u32,
    pub max: u32,
}

impl Default for SalaryRange {
    fn default() -> Self {
        Self { min: 0, max: u32::MAX }
    }
}

/// Static configuration for the deterministic filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Companies never applied to, in addition to the durable blacklist.
    #[serde(default)]
    pub blacklist_companies: Vec<String>,
    /// Listings whose description contains any of these are dropped.
    #[serde(default)]
    pub blacklist_keywords: Vec<String>,
    /// Drop listings whose HR contact was last active more than this
    /// many hours ago. 0 disables the check.
    #[serde(default = "default_hr_threshold")]
    pub hr_activity_threshold_hours: u32,
    /// HR title markers that identify headhunters.
    #[serde(default = "default_headhunter_titles")]
    pub headhunter_titles: Vec<String>,
    #[serde(default = "default_true")]
    pub exclude_headhunter: bool,
    #[serde(default = "default_true")]
    pub exclude_applied: bool,
}

fn default_hr_threshold() -> u32 {
    24
}

fn default_headhunter_titles() -> Vec<String> {
    vec!["headhunter".to_string(), "猎头".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            blacklist_companies: Vec::new(),
            blacklist_keywords: Vec::new(),
            hr_activity_threshold_hours: default_hr_threshold(),
            headhunter_titles: default_headhunter_titles(),
            exclude_headhunter: true,
            exclude_applied: true,
        }
    }
}

/// Settings for the relevance scoring service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    #[serde(default = "default_scorer_model")]
    pub model: String,
    #[serde(default = "default_scorer_base_url")]
    pub base_url: String,
    /// Listings scoring below this never reach the apply gate.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: u8,
}

fn default_scorer_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_scorer_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_score_threshold() -> u8 {
    70
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            model: default_scorer_model(),
            base_url: default_scorer_base_url(),
            score_threshold: default_score_threshold(),
        }
    }
}

/// Notification side-channel settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub webhook_url: String,
}

/// Scheduler settings for `jobpilot schedule`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_interval")]
    pub interval_minutes: u64,
    /// Optional daily window, "HH:MM". Empty means unbounded.
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
}

fn default_interval() -> u64 {
    30
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_minutes: default_interval(),
            start_time: String::new(),
            end_time: String::new(),
        }
    }
}

/// Outbound proxy settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
}

/// Jitter bounds (seconds) for the anti-burst delays between outbound
/// actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_filter_min")]
    pub filter_delay_min_secs: u64,
    #[serde(default = "default_filter_max")]
    pub filter_delay_max_secs: u64,
    #[serde(default = "default_apply_min")]
    pub apply_delay_min_secs: u64,
    #[serde(default = "default_apply_max")]
    pub apply_delay_max_secs: u64,
}

fn default_filter_min() -> u64 {
    2
}
fn default_filter_max() -> u64 {
    5
}
fn default_apply_min() -> u64 {
    10
}
fn default_apply_max() -> u64 {
    20
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            filter_delay_min_secs: default_filter_min(),
            filter_delay_max_secs: default_filter_max(),
            apply_delay_min_secs: default_apply_min(),
            apply_delay_max_secs: default_apply_max(),
        }
    }
}

/// Root configuration, deserialized from a JSON file. Session tokens and
/// API keys come from the environment, not the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub platforms: BTreeMap<String, PlatformConfig>,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub scorer: ScorerConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    /// Directory for the durable ledger files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "data".to_string()
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: AppConfig = serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("invalid config {}: {e}", path.display())))?;
        Ok(config)
    }

    /// Fill session tokens from `<PLATFORM>_SESSION_TOKEN` environment
    /// variables for platforms that have none in the file.
    pub fn apply_env_tokens(&mut self) {
        for (name, platform) in &mut self.platforms {
            if platform.session_token.is_empty() {
                let var = format!("{}_SESSION_TOKEN", name.to_uppercase());
                if let Ok(token) = std::env::var(&var) {
                    platform.session_token = token;
                }
            }
        }
    }

    /// Validate required fields. Any error here is fatal at process
    /// start, before any platform runs.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.search.job_intentions.is_empty() {
            return Err(AppError::Config("search.job_intentions is empty".into()));
        }
        if self.search.target_cities.is_empty() {
            return Err(AppError::Config("search.target_cities is empty".into()));
        }
        if self.search.salary_range.min > self.search.salary_range.max {
            return Err(AppError::Config("salary_range.min exceeds max".into()));
        }
        if self.scorer.score_threshold > 100 {
            return Err(AppError::Config(format!(
                "scorer.score_threshold must be 0-100, got {}",
                self.scorer.score_threshold
            )));
        }
        for (name, platform) in &self.platforms {
            if platform.enabled && platform.session_token.is_empty() {
                return Err(AppError::Config(format!(
                    "platform {name} is enabled but has no session token"
                )));
            }
            if platform.enabled && platform.daily_limit == 0 {
                return Err(AppError::Config(format!(
                    "platform {name} is enabled with daily_limit 0"
                )));
            }
        }
        if self.notify.enabled && self.notify.webhook_url.is_empty() {
            return Err(AppError::Config(
                "notify.enabled is set but webhook_url is empty".into(),
            ));
        }
        if self.schedule.enabled && self.schedule.interval_minutes == 0 {
            return Err(AppError::Config(
                "schedule.interval_minutes must be positive".into(),
            ));
        }
        if self.proxy.enabled && self.proxy.url.is_empty() {
            return Err(AppError::Config(
                "proxy.enabled is set but proxy.url is empty".into(),
            ));
        }
        Ok(())
    }

    /// Names of platforms enabled for this run, in stable order.
    pub fn enabled_platforms(&self) -> Vec<&str> {
        self.platforms
            .iter()
            .filter(|(_, p)| p.enabled)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
