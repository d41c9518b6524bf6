use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use agentview_feedback::FeedbackStore;

use crate::api;
use crate::config::Settings;

pub async fn handle_serve_command(settings: &Settings, port: u16, open_browser: bool) -> Result<()> {
    let source = settings.event_source()?;
    let store: Arc<dyn FeedbackStore> = Arc::new(settings.open_database()?);

    tracing::info!(
        "Serving events from {} and feedback from {}",
        source.describe(),
        settings.db_path.display()
    );

    let router = api::create_router(source, store);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind API server to {}", addr))?;

    let url = format!("http://localhost:{}", port);
    eprintln!();
    eprintln!("  {} {}", "->".bright_green(), format!("API on {}", url).bold());
    eprintln!("  {} Press {} to stop", "->".dimmed(), "Ctrl+C".bold());
    eprintln!();

    if open_browser {
        let sessions_url = format!("{}/api/sessions", url);
        if let Err(e) = open::that(&sessions_url) {
            eprintln!(
                "Failed to open browser: {} (open {} manually)",
                e, sessions_url
            );
        }
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    eprintln!("\nShutting down...");
}
