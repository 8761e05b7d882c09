//! File-backed [`Ledger`] implementation.
//!
//! Three JSON stores under a data directory:
//!
//! - `applications.json` — append-only application history
//! - `blacklist.json` — company blacklist with accumulated reasons
//! - `profiles/<platform>.json` — cached candidate profiles
//!
//! A missing file reads as empty. Every mutation rewrites the affected
//! file through a sibling temp file plus rename, so readers never see a
//! half-written store and a crash after N applications leaves exactly N
//! durable records. Single-writer access is assumed; the in-process
//! mutex serializes tasks, not processes.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use jobpilot_core::error::AppError;
use jobpilot_core::models::{
    ApplicationRecord, ApplicationStatus, BlacklistEntry, CandidateProfile,
};
use jobpilot_core::traits::Ledger;

const APPLICATIONS_FILE: &str = "applications.json";
const BLACKLIST_FILE: &str = "blacklist.json";
const PROFILES_DIR: &str = "profiles";

/// Durable ledger rooted at a data directory.
#[derive(Clone)]
pub struct FileLedger {
    data_dir: PathBuf,
    state: Arc<Mutex<LedgerState>>,
}

#[derive(Debug, Default)]
struct LedgerState {
    loaded: bool,
    applications: Vec<ApplicationRecord>,
    blacklist: Vec<BlacklistEntry>,
}

impl FileLedger {
    /// Open a ledger at `data_dir`, creating the directory if needed.
    /// Files are loaded lazily on first access.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(data_dir.join(PROFILES_DIR))
            .map_err(|e| ledger_io("create data directory", &data_dir, &e))?;
        Ok(Self {
            data_dir,
            state: Arc::new(Mutex::new(LedgerState::default())),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn applications_path(&self) -> PathBuf {
        self.data_dir.join(APPLICATIONS_FILE)
    }

    fn blacklist_path(&self) -> PathBuf {
        self.data_dir.join(BLACKLIST_FILE)
    }

    fn profile_path(&self, platform: &str) -> PathBuf {
        self.data_dir.join(PROFILES_DIR).join(format!("{platform}.json"))
    }

    /// Lock the state, loading both stores from disk on first use.
    async fn state(&self) -> Result<tokio::sync::OwnedMutexGuard<LedgerState>, AppError> {
        let mut guard = Arc::clone(&self.state).lock_owned().await;
        if !guard.loaded {
            guard.applications = read_json_or_default(&self.applications_path())?;
            guard.blacklist = read_json_or_default(&self.blacklist_path())?;
            guard.loaded = true;
            tracing::debug!(
                path = %self.data_dir.display(),
                applications = guard.applications.len(),
                blacklist = guard.blacklist.len(),
                "Loaded ledger"
            );
        }
        Ok(guard)
    }
}

impl Ledger for FileLedger {
    async fn record_application(&self, record: &ApplicationRecord) -> Result<bool, AppError> {
        let mut state = self.state().await?;

        if record.status == ApplicationStatus::Applied
            && has_applied(&state.applications, &record.platform, &record.job_id)
        {
            tracing::debug!(
                platform = %record.platform,
                job_id = %record.job_id,
                "Duplicate applied record suppressed"
            );
            return Ok(false);
        }

        state.applications.push(record.clone());
        write_json_atomic(&self.applications_path(), &state.applications)?;
        Ok(true)
    }

    async fn is_applied(&self, platform: &str, job_id: &str) -> Result<bool, AppError> {
        let state = self.state().await?;
        Ok(has_applied(&state.applications, platform, job_id))
    }

    async fn applied_job_ids(&self, platform: &str) -> Result<HashSet<String>, AppError> {
        let state = self.state().await?;
        Ok(state
            .applications
            .iter()
            .filter(|r| r.platform == platform && r.status == ApplicationStatus::Applied)
            .map(|r| r.job_id.clone())
            .collect())
    }

    async fn applied_count_on(&self, platform: &str, date: NaiveDate) -> Result<usize, AppError> {
        let state = self.state().await?;
        Ok(state
            .applications
            .iter()
            .filter(|r| {
                r.platform == platform
                    && r.status == ApplicationStatus::Applied
                    && r.applied_on() == date
            })
            .count())
    }

    async fn add_blacklist_reason(&self, company: &str, reason: &str) -> Result<(), AppError> {
        let mut state = self.state().await?;

        let now = Utc::now();
        match state.blacklist.iter_mut().find(|e| e.company == company) {
            Some(entry) => {
                entry.reasons.push(reason.to_string());
                entry.updated_at = now;
            }
            None => state.blacklist.push(BlacklistEntry {
                company: company.to_string(),
                reasons: vec![reason.to_string()],
                created_at: now,
                updated_at: now,
            }),
        }
        write_json_atomic(&self.blacklist_path(), &state.blacklist)?;
        tracing::info!(company, reason, "Blacklisted company");
        Ok(())
    }

    async fn blacklist(&self) -> Result<Vec<BlacklistEntry>, AppError> {
        let state = self.state().await?;
        Ok(state.blacklist.clone())
    }

    async fn cached_profile(&self, platform: &str) -> Result<Option<CandidateProfile>, AppError> {
        let path = self.profile_path(platform);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|e| ledger_io("read profile cache", &path, &e))?;
        // A corrupt cache entry is discarded, not fatal.
        match serde_json::from_slice(&bytes) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Discarding corrupt profile cache");
                Ok(None)
            }
        }
    }

    async fn cache_profile(
        &self,
        platform: &str,
        profile: &CandidateProfile,
    ) -> Result<(), AppError> {
        write_json_atomic(&self.profile_path(platform), profile)
    }
}

fn has_applied(applications: &[ApplicationRecord], platform: &str, job_id: &str) -> bool {
    applications.iter().any(|r| {
        r.platform == platform && r.job_id == job_id && r.status == ApplicationStatus::Applied
    })
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, AppError> {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            AppError::LedgerError(format!("corrupt store {}: {e}", path.display()))
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(ledger_io("read store", path, &e)),
    }
}

/// Write `value` as pretty JSON via a sibling temp file and rename, so
/// the destination is always either the old or the new complete content.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let json = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &json).map_err(|e| ledger_io("write store", &tmp, &e))?;
    fs::rename(&tmp, path).map_err(|e| ledger_io("commit store", path, &e))?;
    Ok(())
}

fn ledger_io(action: &str, path: &Path, error: &io::Error) -> AppError {
    AppError::LedgerError(format!("{action} {}: {error}", path.display()))
}
