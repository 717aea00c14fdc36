use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mail_digest::config::Config;
use mail_digest::fetch::{GmailFetcher, MailFetch};
use mail_digest::hub::PushHub;
use mail_digest::hub::ws::push_routes;
use mail_digest::llm::create_summarizer;
use mail_digest::notify::Notifier;
use mail_digest::pipeline::dedup::{DedupTracker, SeenStore};
use mail_digest::pipeline::{Pipeline, PipelineDeps};
use mail_digest::store::LibSqlSeenStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Startup failures are fatal: no cycle state exists yet, so exit
    // instead of limping along without a collaborator.
    let config = Config::from_env()?;

    eprintln!("📬 Mail Digest v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   LLM: {} (model: {})", config.llm.backend, config.llm.model);
    eprintln!("   Push WS: ws://0.0.0.0:{}/ws", config.ws_port);
    eprintln!("   Dashboard: http://0.0.0.0:{}/", config.ws_port);
    eprintln!("   Poll interval: {}s\n", config.poll_interval_secs);

    let summarizer = create_summarizer(&config.llm)?;
    summarizer.set_profile(&config.profile);

    let fetcher: Arc<dyn MailFetch> = Arc::new(GmailFetcher::new(config.fetch.clone()));

    let seen: Box<dyn SeenStore> = match &config.db_path {
        Some(path) => {
            eprintln!("   Seen store: {path}");
            Box::new(LibSqlSeenStore::new_local(Path::new(path)).await?)
        }
        None => {
            eprintln!("   Seen store: in-memory");
            Box::new(DedupTracker::new())
        }
    };

    let hub = PushHub::new();
    let app = push_routes(Arc::clone(&hub), &config.dashboard_dir);
    let ws_port = config.ws_port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{ws_port}")).await?;
    tokio::spawn(async move {
        tracing::info!(port = ws_port, "Push WebSocket server started");
        axum::serve(listener, app).await.ok();
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for shutdown signal");
                // Keep the sender alive so the pipeline keeps running.
                std::future::pending::<()>().await;
            }
        }
    });

    let pipeline = Pipeline::new(
        PipelineDeps {
            fetcher,
            summarizer,
            seen,
            hub,
            notifier: Notifier::new(config.notifications),
        },
        Duration::from_secs(config.poll_interval_secs),
        Duration::from_secs(config.summarize_timeout_secs),
    );
    pipeline.run(shutdown_rx).await;

    Ok(())
}
