use chat_convert_web::config::ServerConfig;
use chat_convert_web::startup::browser::{BROWSER_DELAY, schedule_browser_open};
use chat_convert_web::startup::preflight::{PreflightError, check_dependencies};
use chat_convert_web::startup::server::{ServerExit, parse_port, run_server, server_binary};
use clap::Parser;
use dotenvy::dotenv;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(about = "Check prerequisites, open a browser and run the converter web server")]
struct Args {
    /// Port for the web server (default: 3010)
    port: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "start_web_server=info,chat_convert_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("ChatGPT to Open-WebUI Converter Web Server");

    let args = Args::parse();
    let config = ServerConfig::from_env();

    if let Err(e) = check_dependencies(Path::new("."), &config) {
        error!("❌ {}", e);
        if matches!(e, PreflightError::ToolUnavailable { .. }) {
            info!("You can install it with: pip install {}", config.converter_tool);
        }
        error!("Please fix the above issues and try again.");
        return ExitCode::FAILURE;
    }

    let port = match parse_port(args.port.as_deref(), config.port) {
        Ok(port) => port,
        Err(msg) => {
            error!("❌ {}", msg);
            return ExitCode::FAILURE;
        }
    };

    let url = format!("http://localhost:{}", port);
    let _browser = schedule_browser_open(url.clone(), BROWSER_DELAY);

    info!("Starting web server on port {}...", port);
    info!("Access the converter at: {}", url);
    info!("Press Ctrl+C to stop the server");

    match run_server(&server_binary(), port).await {
        Ok(ServerExit::Interrupted) => {
            info!("🛑 Server stopped by user.");
            ExitCode::SUCCESS
        }
        Ok(ServerExit::Finished(status)) if status.success() => ExitCode::SUCCESS,
        Ok(ServerExit::Finished(status)) => {
            error!("❌ Server exited with {}", status);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("❌ Error starting server: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
