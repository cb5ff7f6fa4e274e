use std::time::Duration;
use tokio_util::sync::CancellationToken;
use user_dispatcher::utils::{logger, validation::Validate};
use user_dispatcher::{ApiClient, Config, Dispatcher, RetryPolicy, RetryingSender};

/// How long the process lingers after the pass so in-flight log output and
/// signal handling can settle.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Logger picks its format from the config, so this one error
            // goes straight to stderr.
            eprintln!("configuration error: {}", e);
            std::process::exit(1);
        }
    };

    logger::init(&config.env);

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "configuration validation failed");
        std::process::exit(1);
    }

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::warn!("shutdown signal received, cancelling processing");
        cancel_on_signal.cancel();
    });

    let client = ApiClient::new(&config)?;
    let policy = RetryPolicy {
        max_attempts: config.max_retries,
        base_delay: config.retry_base_delay(),
    };
    let sender = RetryingSender::new(client.clone(), policy);
    let dispatcher = Dispatcher::new(client, sender);

    tracing::info!("starting users processing");
    let outcome = dispatcher.process_all(&cancel).await;

    match &outcome {
        Ok(tally) => {
            tracing::info!(
                matched = tally.matched,
                skipped = tally.skipped,
                "processing finished successfully"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "processing finished with error");
        }
    }

    tokio::select! {
        _ = tokio::time::sleep(SHUTDOWN_GRACE) => {}
        _ = cancel.cancelled() => {}
    }

    if outcome.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
