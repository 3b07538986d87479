use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use proctor_app::AttemptSupervisor;
use proctor_core::{HttpEventSink, ProctorConfig, SystemClock};
use proctor_session::{ChannelSignalSource, SeverityBand, SignalSource};

#[derive(Parser, Debug)]
#[command(name = "proctor", version, about = "Proctor — timed-assessment countdown and integrity monitoring")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "proctor.toml")]
    config: String,

    /// Attempt identifier to proctor
    #[arg(short, long, default_value = "local-attempt")]
    attempt_id: String,

    /// Attempt duration in seconds
    #[arg(short, long, default_value_t = 3600)]
    duration_secs: u32,

    /// Collector base URL (overrides config file)
    #[arg(long)]
    collector_url: Option<String>,

    /// Log level (overrides config file)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Generate a default config file and exit
    #[arg(long)]
    generate_config: bool,

    /// Dry-run: load config, validate, print status, exit
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Generate Config ──────────────────────────────────────────────
    if cli.generate_config {
        let config = ProctorConfig::default();
        config.save(&cli.config)?;
        println!("Default configuration written to {}", cli.config);
        return Ok(());
    }

    // ── Load Config ──────────────────────────────────────────────────
    let mut config = ProctorConfig::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: {}, using defaults", e);
        ProctorConfig::default()
    });
    if let Some(url) = cli.collector_url {
        config.reporter.collector_url = url;
    }

    let log_level = cli.log_level.as_deref().unwrap_or(&config.general.log_level);

    // ── Tracing ──────────────────────────────────────────────────────
    let level = match log_level {
        "trace" => Level::TRACE, "debug" => Level::DEBUG,
        "warn" => Level::WARN, "error" => Level::ERROR, _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Proctor v{}", env!("CARGO_PKG_VERSION"));
    info!(collector = %config.reporter.collector_url, "Event collector configured");

    // ── Supervisor ───────────────────────────────────────────────────
    let sink = Arc::new(HttpEventSink::new(&config.reporter));
    let supervisor = Arc::new(AttemptSupervisor::new(
        &config,
        Arc::new(SystemClock),
        sink,
    ));

    // Host signal source. Embedders feed browser/host events through this
    // channel; the binary wires it here so the monitor is live end to end.
    let signals: Arc<ChannelSignalSource> = Arc::new(ChannelSignalSource::new());
    supervisor.attach(signals.clone() as Arc<dyn SignalSource>);

    // ── Console Callbacks ────────────────────────────────────────────
    supervisor.engine().on_warning(Arc::new(|minutes| {
        warn!(minutes, "Time warning");
    }));
    supervisor.engine().on_tick(Arc::new(|remaining, band| {
        if band == SeverityBand::Critical && remaining % 60 == 0 {
            warn!(remaining, "Countdown critical");
        }
    }));
    supervisor.monitor().on_advisory(Arc::new(|advisory| {
        warn!(message = advisory.message(), "Integrity advisory");
    }));
    supervisor.monitor().on_suspicious(Arc::new(|kind| {
        warn!(kind = kind.wire_name(), "Suspicious behavior flagged");
    }));

    // ── Dry Run ──────────────────────────────────────────────────────
    if cli.dry_run {
        let status = supervisor.status();
        println!("{}", serde_json::to_string_pretty(&status)?);
        info!("Dry-run complete. Configuration valid.");
        return Ok(());
    }

    // ── Run Attempt ──────────────────────────────────────────────────
    supervisor.begin_attempt(&cli.attempt_id, cli.duration_secs)?;
    info!(attempt_id = %cli.attempt_id, duration = cli.duration_secs, "Proctoring. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    supervisor.end_attempt();
    let status = supervisor.status();
    info!(
        remaining = status.remaining_seconds,
        tab_switches = status.monitor.tab_switch_count,
        full_screen_exits = status.monitor.full_screen_exit_count,
        events_reported = status.monitor.events_reported,
        "Shutdown complete"
    );

    Ok(())
}
