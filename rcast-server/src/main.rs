//! rcast server — entry point.
//!
//! ```text
//! rcast-server                   Run with defaults (or rcast-server.toml)
//! rcast-server --config <path>   Load a custom config TOML
//! rcast-server --port <port>     Override the listen port
//! rcast-server --gen-config      Write default config to stdout
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rcast_server::config::ServerConfig;
use rcast_server::server::RemoteServer;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rcast-server", about = "rcast screen streaming server")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "rcast-server.toml")]
    config: PathBuf,

    /// Override the bind address.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&ServerConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = ServerConfig::load(&cli.config);
    if let Some(host) = cli.host {
        config.network.host = host;
    }
    if let Some(port) = cli.port {
        config.network.port = port;
    }
    config.validate()?;

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("rcast-server v{}", env!("CARGO_PKG_VERSION"));
    info!("listen: {}:{}", config.network.host, config.network.port);
    info!("max sessions: {}", config.network.max_sessions);
    info!(
        "capture: scale {}, quality {}, {} fps",
        config.capture.scale, config.capture.quality, config.capture.frame_rate
    );

    let server = RemoteServer::new(config);
    let stop = server.stop_handle();

    // Ctrl-C handler.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received — shutting down");
        stop.store(false, std::sync::atomic::Ordering::SeqCst);
    });

    server.run().await?;

    Ok(())
}
