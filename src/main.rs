// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use certificate_controller::{
    config::{Cli, LeaseSettings},
    constants::TOKIO_WORKER_THREADS,
    context::Context,
    controller::run_service_controller,
    kube_client::{create_client, credential_source, home_dir},
    leader::LeaderElection,
    reconcilers::{AnnotationWriter, KubeAnnotationWriter, WriteRetryPolicy},
    server::{start_server, ServerState},
};
use clap::Parser;
use kube::Client;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("certificate-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging.
///
/// Respects `RUST_LOG` (default `info`) and `RUST_LOG_FORMAT` (`json` or `text`).
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    info!("Starting certificate controller");
    debug!(?cli, "Parsed command line");

    let identity = cli
        .identity()
        .inspect_err(|e| error!(error = %e, "Invalid configuration"))?;
    let resync_interval = cli
        .resync_interval()
        .inspect_err(|e| error!(error = %e, "Invalid configuration"))?;

    info!(
        certificate_arn = identity.target_value(),
        controller_class = identity.controller_class(),
        "Certificate ARN found"
    );

    let source = credential_source(cli.kubeconfig.as_deref(), home_dir().as_deref());
    let client = create_client(&source)
        .await
        .inspect_err(|e| error!(error = %e, "Unable to get Kubernetes credentials"))?;
    debug!("Kubernetes client initialized successfully");

    let ready = Arc::new(AtomicBool::new(false));
    let server_state = Arc::new(ServerState {
        is_ready: ready.clone(),
    });
    let metrics_address = cli.metrics_address();
    tokio::spawn(async move {
        if let Err(e) = start_server(&metrics_address, server_state).await {
            error!(error = %e, "Metrics server stopped");
        }
    });

    let writer: Arc<dyn AnnotationWriter> = Arc::new(KubeAnnotationWriter::new(
        client.clone(),
        WriteRetryPolicy::with_budget(cli.write_retry_budget()),
    ));
    let ctx = Arc::new(Context::new(identity, writer));

    match cli.lease_settings() {
        Some(settings) => run_as_leader(client, ctx, resync_interval, ready, &settings).await?,
        None => {
            run_service_controller(client, ctx, resync_interval, ready, shutdown_signal()).await;
        }
    }

    info!("Graceful shutdown completed successfully");
    Ok(())
}

/// Run the controller only while holding the leader election lease.
///
/// Returns an error when leadership is lost so the process restarts and competes again.
async fn run_as_leader(
    client: Client,
    ctx: Arc<Context>,
    resync_interval: Duration,
    ready: Arc<AtomicBool>,
    settings: &LeaseSettings,
) -> Result<()> {
    let mut election = LeaderElection::start(client.clone(), settings).await?;

    info!("Waiting for leadership");
    let acquired = tokio::select! {
        acquired = election.acquired() => acquired,
        () = shutdown_signal() => false,
    };
    if !acquired {
        election.release().await;
        return Ok(());
    }

    let shutdown = async {
        tokio::select! {
            () = shutdown_signal() => {}
            () = election.lost() => {}
        }
    };
    run_service_controller(client, ctx, resync_interval, ready, shutdown).await;

    let lost = !election.is_leader();
    info!("Stopping controller and releasing leader election lease...");
    election.release().await;

    if lost {
        anyhow::bail!("Leadership lost, exiting so another replica can take over");
    }
    Ok(())
}

/// Resolve on SIGTERM (pod termination) or SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown..."),
        () = terminate => info!("Received SIGTERM (pod termination), initiating graceful shutdown..."),
    }
}
