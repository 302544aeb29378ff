//! Main application orchestration and execution

use crate::{
    cli::Cli,
    client::{MailTransport, NetworkMailTransport},
    config::{display_config_summary, load_config, EnvManager, LoadedConfig},
    error::Result,
    executor::{RoundTripProbe, Scheduler, SpamScoreProbe},
    logging::init_logging,
    output::{render_metrics, StatusTemplate},
    server::{MetricsServer, ServerState},
    store::MetricsStore,
    types::Signal,
    PKG_NAME, VERSION,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// How long a running check may take to notice a shutdown before it is abandoned
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    /// Create a new application instance with CLI configuration
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the application until a shutdown signal, or for one check with `--once`
    pub async fn run(self) -> Result<()> {
        if self.cli.print_env_template {
            print!("{}", EnvManager::create_example_env_content());
            return Ok(());
        }

        let LoadedConfig { config, warnings } = load_config(self.cli.clone())?;
        init_logging(config.log_level)?;

        tracing::info!(
            "{} v{} (built {}, commit {})",
            PKG_NAME,
            VERSION,
            option_env!("BUILD_TIME").unwrap_or("unknown"),
            option_env!("GIT_COMMIT").unwrap_or("unknown")
        );
        for warning in &warnings {
            warning.log();
        }
        tracing::debug!("{}", self.cli.get_config_summary());
        tracing::debug!("Configuration:\n{}", display_config_summary(&config));

        let template = Arc::new(StatusTemplate::load(&config.status_html_file)?);
        let store = Arc::new(MetricsStore::new());
        let transport: Arc<dyn MailTransport> = Arc::new(NetworkMailTransport::new(config.timeout()));

        let roundtrip = RoundTripProbe::new(&config, transport.clone(), store.clone());
        let spam_score = SpamScoreProbe::new(&config, transport, store.clone())?;
        let mut scheduler = Scheduler::new(roundtrip, spam_score, config.check_interval());

        if self.cli.once {
            let report = scheduler.tick().await;
            tracing::info!(healthy = report.cycle.is_healthy(), "Single check finished");
            print!("{}", render_metrics(&store.snapshot()));
            return Ok(());
        }

        let (shutdown, _) = broadcast::channel(16);
        let server = MetricsServer::bind(config.http_port, ServerState { store, template }).await?;
        let server_task = tokio::spawn(server.serve(shutdown.subscribe()));
        let mut scheduler_task = tokio::spawn(scheduler.run(shutdown.subscribe()));

        wait_for_shutdown().await?;
        tracing::info!("Received interrupt signal, shutting down...");
        let _ = shutdown.send(Signal::Shutdown);

        // A check in flight only sees the signal once it finishes
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut scheduler_task).await.is_err() {
            tracing::warn!("Abandoning the check in progress");
            scheduler_task.abort();
        }

        server_task.await??;
        tracing::info!("Mail Health Exporter stopped");
        Ok(())
    }
}

/// Resolve on Ctrl-C, or on SIGTERM where available
async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}
