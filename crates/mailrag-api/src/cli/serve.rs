//! HTTP server command.

use anyhow::Result;
use console::style;

use crate::http::router::build_router;
use crate::settings::Settings;
use crate::state::AppState;

/// Start the summarization server and run until Ctrl+C or SIGTERM.
///
/// The credential and store connection are established before the port is
/// bound, so a misconfigured server never accepts a request.
pub async fn serve(settings: &Settings, json: bool, quiet: bool) -> Result<()> {
    let state = AppState::init(settings).await?;
    let server = &settings.config.server;

    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(%local_addr, "summarization server listening");

    if json {
        let started = serde_json::json!({
            "status": "listening",
            "address": format!("http://{local_addr}"),
            "version": env!("CARGO_PKG_VERSION"),
        });
        println!("{}", serde_json::to_string(&started)?);
    } else if !quiet {
        println!(
            "  {} mailrag listening on {}",
            style("⚡").bold(),
            style(format!("http://{local_addr}")).cyan()
        );
        println!("  {}", style("Press Ctrl+C to stop").dim());
    }

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if !json && !quiet {
        println!("\n  Server stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
    tracing::info!("shutdown signal received");
}
