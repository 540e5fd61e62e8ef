use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use bt_core::types::{Project, ProjectState};
use bt_core::{ProjectRegistry, Result, SectionClassifier, StateStore};
use bt_orchestrator::{BatchConfig, BatchOrchestrator, ProjectPipeline};
use bt_outline::OutlineClient;
use bt_storage::{create_snapshot_store, create_state_store, SNAPSHOT_RETENTION_DAYS};
use bt_twitter::{AccountRateLimiter, HttpPostingApi, HttpProjectRegistry, RateLimiterConfig};

#[derive(Debug, Clone)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if let Ok(num) = current_number.parse::<u64>() {
                match c {
                    's' => total_seconds += num,
                    'm' => total_seconds += num * 60,
                    'h' => total_seconds += num * 3600,
                    'd' => total_seconds += num * 86400,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                }
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // a trailing bare number counts as seconds
        if !current_number.is_empty() {
            match current_number.parse::<u64>() {
                Ok(num) => {
                    total_seconds += num;
                    has_unit = true;
                }
                Err(_) => return Err("Invalid number in duration".to_string()),
            }
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Brainlift change tracker", long_about = None)]
struct Cli {
    /// Storage backend for project state and snapshots
    #[arg(long, default_value = "memory")]
    storage: String,
    /// Base URL of the rest storage backend
    #[arg(long)]
    storage_url: Option<String>,
    /// Base URL of the tweet/project backend
    #[arg(long, default_value = "http://localhost:8000")]
    backend_url: String,
    /// Base URL of the outline content source
    #[arg(long, default_value = "https://workflowy.com")]
    outline_url: String,
    #[arg(
        long,
        default_value = "dummy",
        help = "Classifier model. Available models: dummy (default), deepseek"
    )]
    model: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the scrape-diff-compose-post pipeline over tracked projects
    Run {
        /// Single project id; all active projects when omitted
        #[arg(long)]
        project: Option<String>,
        #[arg(long, default_value_t = 5)]
        batch_size: usize,
        /// Pause between batches (e.g. 30s, 1m)
        #[arg(long, default_value = "30s")]
        delay: HumanDuration,
        /// Keep running on this interval (e.g. 1h, 30m, 1h15m30s)
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// List active projects
    List,
    /// Remove scraped snapshots past the retention window
    Prune,
}

async fn check_state_store(store: &Arc<dyn StateStore>, storage_type: &str) -> Result<()> {
    let probe_id = "healthcheck";
    let probe = ProjectState::empty();
    let mut retries = 3;
    loop {
        let write = store
            .put_state(probe_id, &probe, chrono::Duration::minutes(1))
            .await;
        let result = match write {
            Ok(()) => store.get_state(probe_id).await.map(|_| ()),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                info!("🏦 Storage backend ready (using {})", storage_type);
                return Ok(());
            }
            Err(e) if retries > 1 => {
                retries -= 1;
                info!("Storage health check failed ({}), retrying...", e);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn load_projects(
    registry: &HttpProjectRegistry,
    project: Option<&str>,
) -> Result<Vec<Project>> {
    match project {
        Some(id) => Ok(vec![registry.get_project(id).await?]),
        None => registry.get_all_active_projects().await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let api_key = std::env::var("BT_BACKEND_API_KEY").unwrap_or_default();

    match cli.command {
        Commands::Run {
            project,
            batch_size,
            delay,
            interval,
        } => {
            let state_store = create_state_store(&cli.storage, cli.storage_url.as_deref())?;
            let snapshot_store = create_snapshot_store(&cli.storage, cli.storage_url.as_deref())?;
            check_state_store(&state_store, &cli.storage).await?;

            let classifier = bt_inference::create_classifier(Some(bt_inference::Config {
                api_key: std::env::var("BT_DEEPSEEK_API_KEY").ok(),
                model_name: Some(cli.model.clone()),
                base_url: None,
            }))
            .await?;
            info!("🧠 Classifier initialized (using {})", classifier.name());

            let source = Arc::new(OutlineClient::new(
                cli.outline_url.clone(),
                std::env::var("BT_OUTLINE_USERNAME").ok(),
                std::env::var("BT_OUTLINE_PASSWORD").ok(),
            ));
            let posting = Arc::new(HttpPostingApi::new(cli.backend_url.clone(), api_key.clone()));
            let registry = HttpProjectRegistry::new(cli.backend_url.clone(), api_key);
            let limiter = Arc::new(AccountRateLimiter::new(RateLimiterConfig::default()));

            let pipeline = Arc::new(ProjectPipeline::new(
                source,
                classifier,
                state_store,
                snapshot_store.clone(),
                posting,
                limiter,
            ));
            let orchestrator = BatchOrchestrator::new(
                pipeline,
                snapshot_store,
                BatchConfig {
                    batch_size,
                    delay_between_batches: delay.0,
                },
            );

            if let Some(interval) = interval {
                info!("Running in periodic mode every {}s", interval.0.as_secs());
                loop {
                    match load_projects(&registry, project.as_deref()).await {
                        Ok(projects) => {
                            info!("📋 Tracking {} project(s)", projects.len());
                            orchestrator.run(&projects).await;
                        }
                        Err(e) => eprintln!("Failed to load projects: {}", e),
                    }
                    info!("Waiting {}s before next run", interval.0.as_secs());
                    tokio::time::sleep(interval.0).await;
                }
            } else {
                let projects = load_projects(&registry, project.as_deref()).await?;
                info!("📋 Tracking {} project(s)", projects.len());
                orchestrator.run(&projects).await;
            }
        }
        Commands::List => {
            let registry = HttpProjectRegistry::new(cli.backend_url.clone(), api_key);
            let projects = registry.get_all_active_projects().await?;
            for project in projects {
                println!(
                    "{} - {} ({}) [account {}]",
                    project.project_id, project.name, project.url, project.account_id
                );
            }
        }
        Commands::Prune => {
            let snapshot_store = create_snapshot_store(&cli.storage, cli.storage_url.as_deref())?;
            let removed = snapshot_store
                .prune_snapshots(chrono::Duration::days(SNAPSHOT_RETENTION_DAYS))
                .await?;
            println!("Removed {} scraped snapshot(s)", removed);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_duration_units() {
        assert_eq!(HumanDuration::from_str("30s").unwrap().0.as_secs(), 30);
        assert_eq!(HumanDuration::from_str("2m").unwrap().0.as_secs(), 120);
        assert_eq!(
            HumanDuration::from_str("1h15m30s").unwrap().0.as_secs(),
            4530
        );
        assert_eq!(HumanDuration::from_str("1d").unwrap().0.as_secs(), 86400);
        // bare numbers are seconds
        assert_eq!(HumanDuration::from_str("45").unwrap().0.as_secs(), 45);
    }

    #[test]
    fn test_human_duration_rejects_garbage() {
        assert!(HumanDuration::from_str("").is_err());
        assert!(HumanDuration::from_str("abc").is_err());
        assert!(HumanDuration::from_str("1x").is_err());
    }
}
