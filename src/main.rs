use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cementai_monitor::api::types::SensorReadings;
use cementai_monitor::api::{ApiError, HttpPlantApi, PlantApi};
use cementai_monitor::chat::ChatMessage;
use cementai_monitor::config::{ClientConfig, ConfigError};
use cementai_monitor::dashboard::Dashboard;
use cementai_monitor::kpi::{self, Kpi};
use cementai_monitor::refresh::{DashboardState, RefreshOutcome};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("refresh failed: {0}")]
    Refresh(String),
    #[error("no KPI named `{0}` in the current prediction")]
    UnknownKpi(String),
    #[error("failed to read {}: {source}", path.display())]
    ReadParams { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "cementai-monitor", about = "CementAI plant monitoring client")]
struct Cli {
    /// Backend base URL; overrides `CEMENTAI_API_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// JSON file with sensor readings for the prediction request.
    #[arg(long, global = true)]
    params: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh periodically and log each cycle until interrupted.
    Watch {
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Refresh once and print the full snapshot.
    Snapshot,
    /// Refresh once and print the KPI cards.
    Kpis,
    /// Refresh once and print KPIs in crisis.
    Alerts,
    /// Refresh once and print AI recommendations.
    Recommendations,
    /// Refresh once and print the top energy model factors.
    Factors,
    /// Refresh once and print the prediction model roster.
    Models,
    /// Send one chat turn, optionally seeded from a KPI or topic.
    Chat(ChatArgs),
}

#[derive(Args, Debug)]
struct ChatArgs {
    /// Seed the conversation with this KPI's gap analysis.
    #[arg(long, conflicts_with = "context")]
    kpi: Option<String>,

    /// Seed the conversation with a free-text topic.
    #[arg(long)]
    context: Option<String>,

    message: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    let params = cli.params.as_deref().map(read_params).transpose()?;

    let api: Arc<dyn PlantApi> = Arc::new(HttpPlantApi::new(&config)?);
    tracing::info!(base_url = %config.base_url, "backend configured");
    let mut dashboard = Dashboard::new(api);

    match cli.command {
        Command::Watch { interval_secs } => {
            let config = match interval_secs {
                Some(secs) => config.with_refresh_interval(secs)?,
                None => config,
            };
            run_watch(&dashboard, &config, params).await;
            Ok(())
        }
        Command::Snapshot => {
            refresh_once(&dashboard, params).await?;
            let snapshot = dashboard.refresh().snapshot().await;
            print_json(&json!({
                "health": snapshot.health,
                "plant_status": snapshot.plant_status,
                "prediction": snapshot.prediction,
                "models_status": snapshot.models_status,
                "feature_importance": snapshot.feature_importance,
                "fetched_at_ms": snapshot.fetched_at_ms,
            }))
        }
        Command::Kpis => {
            refresh_once(&dashboard, params).await?;
            print_kpis(&dashboard.kpis().await);
            Ok(())
        }
        Command::Alerts => {
            refresh_once(&dashboard, params).await?;
            let alerts = dashboard.crisis_alerts().await;
            if alerts.is_empty() {
                println!("No crisis alerts: all KPIs within acceptable ranges");
            }
            for k in &alerts {
                println!(
                    "{} CRISIS: {} {unit} -> {} {unit} (gap {} {unit})",
                    k.label,
                    k.current,
                    k.target,
                    k.gap_label(),
                    unit = k.unit
                );
            }
            Ok(())
        }
        Command::Recommendations => {
            refresh_once(&dashboard, params).await?;
            for (i, rec) in dashboard.recommendations().await.iter().enumerate() {
                println!("[{i}] {} [{}]", rec.headline, rec.priority_label);
                println!("    {}", rec.description);
                println!("    savings/day: {:.0}", rec.savings_per_day);
            }
            let snapshot = dashboard.refresh().snapshot().await;
            if let Some(prediction) = &snapshot.prediction {
                println!(
                    "Total potential savings: {:.0}/day | {:.0}/year",
                    prediction.total_savings_per_day,
                    kpi::yearly_savings(prediction)
                );
            }
            Ok(())
        }
        Command::Factors => {
            refresh_once(&dashboard, params).await?;
            let snapshot = dashboard.refresh().snapshot().await;
            if let Some(factors) = &snapshot.feature_importance {
                for f in factors.top(8) {
                    println!("{:<28} {:>5.1}%", f.feature, f.importance * 100.0);
                }
            } else {
                println!("feature importance unavailable");
            }
            Ok(())
        }
        Command::Models => {
            refresh_once(&dashboard, params).await?;
            print_models(&dashboard, &config).await;
            Ok(())
        }
        Command::Chat(args) => run_chat(&mut dashboard, params, args).await,
    }
}

async fn refresh_once(dashboard: &Dashboard, params: Option<SensorReadings>) -> Result<(), CliError> {
    match dashboard.refresh().refresh(params).await {
        RefreshOutcome::Committed | RefreshOutcome::Skipped => Ok(()),
        RefreshOutcome::Failed => {
            let state = dashboard.refresh().state().await;
            Err(CliError::Refresh(state.error.unwrap_or_default()))
        }
    }
}

async fn run_watch(dashboard: &Dashboard, config: &ClientConfig, params: Option<SensorReadings>) {
    let mut updates = dashboard.refresh().subscribe();
    let task = dashboard.start(Duration::from_secs(config.refresh_interval_secs), params);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = dashboard.refresh().state().await;
                log_cycle(&state, &dashboard.crisis_alerts().await);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted; stopping refresh");
                break;
            }
        }
    }
    task.shutdown();
}

fn log_cycle(state: &DashboardState, alerts: &[Kpi]) {
    let live = state.snapshot.health.is_some();
    let timestamp = state
        .snapshot
        .prediction
        .as_ref()
        .map_or("N/A", |p| p.timestamp.as_str());
    match &state.error {
        Some(error) => tracing::warn!(live, %error, "refresh cycle failed"),
        None => tracing::info!(live, prediction = timestamp, crisis_alerts = alerts.len(), "refresh cycle ok"),
    }
}

async fn run_chat(dashboard: &mut Dashboard, params: Option<SensorReadings>, args: ChatArgs) -> Result<(), CliError> {
    if let Some(label) = &args.kpi {
        refresh_once(dashboard, params).await?;
        if !dashboard.open_chat_for_kpi(label).await {
            return Err(CliError::UnknownKpi(label.clone()));
        }
    } else {
        dashboard
            .chat_mut()
            .open_with_context(None, args.context.as_deref());
    }

    let chat = dashboard.chat_mut();
    chat.set_input(args.message.join(" "));
    chat.send_input().await;

    for message in chat.messages() {
        print_message(message);
    }
    Ok(())
}

fn print_kpis(kpis: &[Kpi]) {
    for k in kpis {
        println!(
            "{:<18} {:>8} -> {:>8} {:<8} gap {:>6} ({}) [{}]",
            k.label,
            k.current,
            k.target,
            k.unit,
            k.gap_label(),
            k.improvement,
            k.model
        );
    }
}

async fn print_models(dashboard: &Dashboard, config: &ClientConfig) {
    let roster = dashboard.model_roster().await;
    for m in &roster {
        let state = if m.active { "LIVE" } else { "OFFLINE" };
        println!("{:<22} {:<8} {} (optimizes {})", m.name, state, m.description, m.optimizes);
    }
    let snapshot = dashboard.refresh().snapshot().await;
    if let Some(status) = &snapshot.models_status {
        println!("Registry: {}/{} models active", status.active_count(), status.models.len());
    }
    println!(
        "{}",
        kpi::roster_footer(&roster, snapshot.prediction.as_ref(), config.refresh_interval_secs)
    );
}

fn print_message(message: &ChatMessage) {
    println!("{}: {}", message.role.as_str(), message.content);
    for step in message.reasoning.iter().flatten() {
        println!("  - {step}");
    }
}

fn read_params(path: &std::path::Path) -> Result<SensorReadings, CliError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|source| CliError::ReadParams { path: path.to_owned(), source })?;
    Ok(serde_json::from_str(&raw)?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
