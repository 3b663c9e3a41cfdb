use chat_convert_web::config::ServerConfig;
use chat_convert_web::startup::preflight::{missing_files, required_files};
use chat_convert_web::{AppState, create_app};
use clap::Parser;
use dotenvy::dotenv;
use std::path::Path;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(about = "ChatGPT to Open-WebUI converter web server")]
struct Args {
    /// Port to run the server on (default: 3010)
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind (default: 127.0.0.1)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_convert_web=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }

    info!("🚀 Starting ChatGPT to Open-WebUI converter...");

    let missing = missing_files(Path::new("."), &required_files(&config));
    if !missing.is_empty() {
        error!("❌ Missing required files: {}", missing.join(", "));
        std::process::exit(1);
    }

    info!(
        "🛠️  Converter: {} run {} (timeout {}s), max upload {}MB",
        config.converter_tool,
        config.converter_script,
        config.conversion_timeout.as_secs(),
        config.max_upload_size / 1024 / 1024
    );

    let addr = format!("{}:{}", config.host, config.port);
    let app = create_app(AppState::from_config(config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("✅ Server ready at http://{}", listener.local_addr()?);
    info!("Press Ctrl+C to stop the server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
