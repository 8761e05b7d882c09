use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jobpilot_client::{ChatClient, LlmGreeter, OpenAiScorer, WebhookNotifier, ZhipinPlatform};
use jobpilot_core::config::AppConfig;
use jobpilot_core::models::{PlatformRunReport, RunSummary};
use jobpilot_core::pipeline::{PipelineConfig, PipelineService};
use jobpilot_core::schedule::TimeWindow;
use jobpilot_core::traits::{Notifier, NullNotifier};
use jobpilot_ledger::FileLedger;

#[derive(Parser)]
#[command(name = "jobpilot", version, about = "Automated job-application pipeline")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, env = "JOBPILOT_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// API key for the OpenAI-compatible scoring/greeting service
    #[arg(long, env = "JOBPILOT_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once across all enabled platforms
    Run {
        /// Restrict the run to a single platform
        #[arg(short, long)]
        platform: Option<String>,
    },

    /// Run repeatedly on the configured interval and daily time window
    Schedule,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobpilot=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    config.apply_env_tokens();
    config.validate().context("invalid configuration")?;

    if cli.api_key.is_empty() {
        tracing::warn!(
            "No API key configured; scoring falls back to neutral scores and \
             greetings fall back to the plain template"
        );
    }

    match cli.command {
        Commands::Run { platform } => {
            let summary = run_once(&config, &cli.api_key, platform.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Schedule => cmd_schedule(&config, &cli.api_key).await?,
    }

    Ok(())
}

/// One full pipeline invocation over the enabled platforms.
async fn run_once(
    config: &AppConfig,
    api_key: &str,
    only_platform: Option<&str>,
) -> Result<RunSummary> {
    let run_id = uuid::Uuid::new_v4().to_string();
    let started_at = chrono::Utc::now();
    tracing::info!(%run_id, "Starting run");

    let ledger = FileLedger::new(&config.data_dir)
        .with_context(|| format!("opening ledger in {}", config.data_dir))?;
    let notifier = build_notifier(config)?;

    let mut reports = Vec::new();
    for name in config.enabled_platforms() {
        if only_platform.is_some_and(|only| only != name) {
            continue;
        }
        let report = run_platform(config, api_key, name, &ledger, &notifier).await;
        reports.push(report);
    }

    if reports.is_empty() {
        tracing::warn!("No enabled platform matched; nothing to do");
    }

    let summary = RunSummary::aggregate(run_id, started_at, reports);
    notifier
        .notify("Run complete", &summary.summary_text())
        .await;
    tracing::info!(
        platforms = summary.platforms,
        applied = summary.total_applied,
        "Run finished"
    );
    Ok(summary)
}

/// Run one platform end to end. Adapter construction failures produce a
/// skipped report so the other platforms still run.
async fn run_platform(
    config: &AppConfig,
    api_key: &str,
    name: &str,
    ledger: &FileLedger,
    notifier: &CliNotifier,
) -> PlatformRunReport {
    let pipeline_config = match PipelineConfig::for_platform(config, name) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(platform = name, error = %e, "Bad platform configuration");
            return PlatformRunReport::skipped(name, e.to_string());
        }
    };

    let scorer = match OpenAiScorer::new(api_key, &config.scorer) {
        Ok(scorer) => scorer,
        Err(e) => {
            tracing::error!(platform = name, error = %e, "Cannot build scorer");
            return PlatformRunReport::skipped(name, e.to_string());
        }
    };
    let greeter = match ChatClient::new(api_key, &config.scorer.model, &config.scorer.base_url) {
        Ok(chat) => LlmGreeter::new(chat),
        Err(e) => {
            tracing::error!(platform = name, error = %e, "Cannot build greeter");
            return PlatformRunReport::skipped(name, e.to_string());
        }
    };

    match name {
        "zhipin" => {
            let Some(platform_cfg) = config.platforms.get(name) else {
                return PlatformRunReport::skipped(name, "platform missing from config");
            };
            match ZhipinPlatform::new(platform_cfg, &config.proxy) {
                Ok(platform) => {
                    PipelineService::new(
                        platform,
                        scorer,
                        greeter,
                        ledger.clone(),
                        notifier.clone(),
                        pipeline_config,
                    )
                    .run_platform()
                    .await
                }
                Err(e) => {
                    tracing::error!(platform = name, error = %e, "Cannot build adapter");
                    PlatformRunReport::skipped(name, e.to_string())
                }
            }
        }
        other => {
            tracing::warn!(platform = other, "No adapter for platform, skipping");
            PlatformRunReport::skipped(other, "no adapter for platform")
        }
    }
}

/// Run on the configured interval, applying the daily time window.
async fn cmd_schedule(config: &AppConfig, api_key: &str) -> Result<()> {
    let interval = Duration::from_secs(config.schedule.interval_minutes * 60);
    let window = TimeWindow::from_config(&config.schedule);
    tracing::info!(
        interval_minutes = config.schedule.interval_minutes,
        windowed = window.is_some(),
        "Scheduler started"
    );

    loop {
        let inside = window.map(|w| w.contains_now()).unwrap_or(true);
        if inside {
            if let Err(e) = run_once(config, api_key, None).await {
                tracing::error!(error = %e, "Scheduled run failed");
            }
        } else {
            tracing::info!("Outside the configured time window, skipping this cycle");
        }
        tokio::time::sleep(interval).await;
    }
}

fn build_notifier(config: &AppConfig) -> Result<CliNotifier> {
    if config.notify.enabled {
        let webhook = WebhookNotifier::new(config.notify.webhook_url.clone())
            .context("building webhook notifier")?;
        Ok(CliNotifier::Webhook(webhook))
    } else {
        Ok(CliNotifier::Null(NullNotifier))
    }
}

/// Notifier selected at startup from configuration.
#[derive(Clone)]
enum CliNotifier {
    Webhook(WebhookNotifier),
    Null(NullNotifier),
}

impl Notifier for CliNotifier {
    async fn notify(&self, title: &str, body: &str) {
        match self {
            CliNotifier::Webhook(webhook) => webhook.notify(title, body).await,
            CliNotifier::Null(null) => null.notify(title, body).await,
        }
    }
}
