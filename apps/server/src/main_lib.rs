use std::sync::Arc;

use banksync_core::{
    AccountResolver, Error as CoreError, ForwardingPipeline, IntakeHandle, LedgerClient,
    PipelineHandle, TransactionSubmitter,
};
use banksync_firefly::FireflyApiClient;
#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::api::{app_router, AppState};
use crate::config::{Config, LogFormat};
use crate::monobank::{
    generate_webhook_path, MonobankApiClient, REACHABILITY_ATTEMPTS, REACHABILITY_INTERVAL,
};

pub fn init_tracing(log_format: LogFormat) {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

/// Wire the forwarding chain onto `ledger` and start the pipeline.
pub fn build_pipeline(
    config: &Config,
    ledger: Arc<dyn LedgerClient>,
) -> (Arc<AccountResolver>, IntakeHandle, PipelineHandle) {
    let resolver = Arc::new(
        AccountResolver::new(ledger.clone())
            .with_namespace(config.mapping_namespace.clone())
            .with_cache_ttl(config.account_cache_ttl),
    );
    let submitter = Arc::new(TransactionSubmitter::new(
        ledger,
        resolver.clone(),
        config.submitter_options(),
    ));
    let (intake, pipeline) = ForwardingPipeline::spawn(submitter, config.pipeline_config());
    (resolver, intake, pipeline)
}

/// Ambiguous mappings abort startup; an unreachable ledger does not.
pub async fn validate_mappings(resolver: &AccountResolver) -> anyhow::Result<()> {
    match resolver.validate_mappings().await {
        Ok(mapped) => {
            tracing::info!(
                "{} ledger account(s) carry a '{}' mapping tag",
                mapped,
                resolver.namespace()
            );
            Ok(())
        }
        Err(e @ CoreError::AmbiguousAccountMapping { .. }) => Err(e.into()),
        Err(e) => {
            tracing::warn!("Could not validate account mappings at startup: {}", e);
            Ok(())
        }
    }
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let ledger: Arc<dyn LedgerClient> = Arc::new(FireflyApiClient::new(
        &config.ledger_url,
        &config.ledger_token,
        config.request_timeout,
    )?);

    let (resolver, intake, pipeline) = build_pipeline(&config, ledger);
    validate_mappings(&resolver).await?;

    let webhook_path = generate_webhook_path();
    let webhook_url = format!("{}{}", config.public_host, webhook_path);
    let router = app_router(Arc::new(AppState { intake }), &webhook_path);

    tracing::info!("Listening on {}", config.listen_addr);
    tracing::info!("Your url is {}", webhook_url);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    if config.register_webhook {
        let monobank = MonobankApiClient::new(
            &config.monobank_api_url,
            &config.monobank_token,
            config.request_timeout,
        )?;
        tokio::spawn(async move {
            if let Err(e) = monobank
                .register_webhook(&webhook_url, REACHABILITY_INTERVAL, REACHABILITY_ATTEMPTS)
                .await
            {
                tracing::error!("Webhook registration failed: {:#}", e);
            }
        });
    }

    // The router owns the only intake handle; dropping it closes the queue.
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Listener stopped, waiting for in-flight submissions");
    let stats = pipeline.stopped().await;
    tracing::info!(
        "Shutdown complete: {} forwarded, {} failed",
        stats.succeeded,
        stats.failed
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match TerminationSignals::register() {
            Ok(mut signals) => {
                let name = signals.recv().await;
                tracing::info!("Received {}", name);
            }
            Err(e) => {
                tracing::error!("Failed to listen for termination signals: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

/// SIGTERM, SIGHUP and SIGQUIT all stop the service; SIGINT goes through ctrl-c.
#[cfg(unix)]
struct TerminationSignals {
    terminate: Signal,
    hangup: Signal,
    quit: Signal,
}

#[cfg(unix)]
impl TerminationSignals {
    fn register() -> std::io::Result<Self> {
        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    /// Wait for the first of the signals and return its name.
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.hangup.recv() => "SIGHUP",
            _ = self.quit.recv() => "SIGQUIT",
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_hangup_is_a_termination_signal() {
        let mut signals = TerminationSignals::register().unwrap();

        let status = std::process::Command::new("sh")
            .arg("-c")
            .arg(format!("kill -HUP {}", std::process::id()))
            .status()
            .unwrap();
        assert!(status.success());

        let name = tokio::time::timeout(Duration::from_secs(5), signals.recv())
            .await
            .unwrap();
        assert_eq!(name, "SIGHUP");
    }
}
