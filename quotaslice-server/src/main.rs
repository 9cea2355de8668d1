use anyhow::{Result, bail};
use quotaslice::{QuotaRegistry, SystemClock};
use tokio::task::JoinSet;

use quotaslice_server::actor::QuotaActor;
use quotaslice_server::config::Config;
use quotaslice_server::rules::{load_rules, read_rules_file};
use quotaslice_server::transport::{Transport, http::HttpTransport};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from environment variables and CLI arguments
    let config = Config::from_env_and_args()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("quotaslice={}", config.log_level).parse()?)
                .add_directive(format!("quotaslice_server={}", config.log_level).parse()?),
        )
        .init();

    tracing::debug!("Validating rules in {}", config.rules.path.display());

    let rules = read_rules_file(&config.rules.path)?;
    let report = load_rules(&rules, SystemClock);

    for error in &report.errors {
        tracing::error!("{}", error);
    }

    if !report.is_clean() && config.rules.strict {
        bail!(
            "unable to create quota rules from configuration ({} error(s))",
            report.errors.len()
        );
    }

    if report.periods.is_empty() {
        tracing::warn!("Found zero valid quota rules in configuration");
    } else {
        tracing::info!("Found {} quota rule(s) in configuration", report.periods.len());
    }

    let registry: QuotaRegistry<SystemClock> = report.periods.into_iter().collect();
    let quotas = QuotaActor::spawn(config.buffer_size, registry);

    // Create a set to manage multiple transport tasks
    let mut transport_tasks = JoinSet::new();

    if let Some(http_config) = &config.transports.http {
        let transport = HttpTransport::new(&http_config.host, http_config.port)?;
        let quotas = quotas.clone();

        transport_tasks.spawn(async move {
            tracing::info!("Starting HTTP transport");
            transport.start(quotas).await
        });
    }

    tracing::info!("quotaslice server started, buffer size: {}", config.buffer_size);

    // Wait for all transport tasks to complete (they run indefinitely)
    while let Some(result) = transport_tasks.join_next().await {
        match result {
            Ok(Ok(())) => {
                tracing::info!("Transport task completed successfully");
            }
            Ok(Err(e)) => {
                tracing::error!("Transport task failed: {}", e);
                return Err(e);
            }
            Err(e) => {
                tracing::error!("Transport task panicked: {}", e);
                return Err(anyhow::anyhow!("Transport task panicked"));
            }
        }
    }

    Ok(())
}
