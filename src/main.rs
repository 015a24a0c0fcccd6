use std::sync::Arc;

use clap::{Parser, Subcommand};
use shipment_tracker::api;
use shipment_tracker::config::Config;
use shipment_tracker::error::AppError;
use shipment_tracker::session::{ReviewDraft, TrackingSession};
use shipment_tracker::state::AppState;
use shipment_tracker::tracking::render::render_session;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shipment-tracker")]
#[command(about = "Shipment tracking proxy and client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP proxy (default).
    Serve,
    /// Look up a tracking code and print its status.
    Track { code: String },
    /// Rate a delivered shipment.
    Review {
        code: String,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        text: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let repo = AppState::repository(&config)?;
    let state = Arc::new(AppState::new(repo, &config));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(state, config.http_port).await,
        Commands::Track { code } => {
            let mut session = TrackingSession::new();
            session
                .track(&state.service, &code)
                .await
                .map_err(|err| AppError::BadRequest(err.to_string()))?;
            print!("{}", render_session(&session));
            Ok(())
        }
        Commands::Review { code, rating, text } => {
            let mut session = TrackingSession::new();
            session
                .track(&state.service, &code)
                .await
                .map_err(|err| AppError::BadRequest(err.to_string()))?;

            let draft = ReviewDraft::new(rating, text.unwrap_or_default());
            let outcome = session.submit_review(&state.service, &draft).await;
            print!("{}", render_session(&session));
            outcome
                .map(|_| ())
                .map_err(|err| AppError::BadRequest(err.to_string()))
        }
    }
}

async fn serve(state: Arc<AppState>, http_port: u16) -> Result<(), AppError> {
    let app = api::rest::router(state.clone());

    let bind_addr = format!("0.0.0.0:{http_port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port,
        backend = state.service.backend_tag(),
        "http server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
