use anyhow::{Context, Result};
use clap::Parser;
use projectboard::{
    build_router,
    cli::{Cli, Command, StoreHandle},
    config::AppConfig,
    web::AppState,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("failed to load application configuration")?;
    cli.apply(&mut config);

    let handle = StoreHandle::open(&config).await?;
    let state = AppState::new(handle.store());

    let outcome = match cli.command {
        Command::Serve { .. } => serve(&config, state).await,
        Command::Seed => seed(&state).await,
        Command::Reindex => reindex(&state).await,
    };

    handle.close().await?;
    outcome
}

async fn serve(config: &AppConfig, state: AppState) -> Result<()> {
    let app = build_router(state);

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, "project dashboard started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("project dashboard stopped");
    Ok(())
}

async fn seed(state: &AppState) -> Result<()> {
    let inserted = state
        .projects
        .ensure_seed(&state.seed)
        .await
        .context("failed to seed projects")?;
    if inserted {
        println!("Inserted {} seed projects", state.seed.len());
    } else {
        println!("Projects already seeded; nothing to do");
    }
    Ok(())
}

async fn reindex(state: &AppState) -> Result<()> {
    let report = state
        .projects
        .reconcile()
        .await
        .context("failed to rebuild project index")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to render report")?
    );
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("projectboard=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
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
}
