pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod pacing;
pub mod pipeline;
pub mod schedule;
#[cfg(test)]
pub mod testutil;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;
pub use models::{
    ApplicationRecord, ApplicationStatus, CandidateProfile, JobDetail, JobListing,
    PlatformRunReport, RelevanceReport, RunSummary,
};
pub use pipeline::{PipelineConfig, PipelineService};
pub use traits::{GreetingComposer, JobPlatform, Ledger, Notifier, RelevanceScorer};
