//! rcast client — entry point.
//!
//! ```text
//! rcast-client                    Prompt for a server address
//! rcast-client 192.168.1.20      Connect on the default port
//! rcast-client 192.168.1.20:9999 Connect to an explicit port
//! rcast-client --config <path>   Use custom config TOML
//! rcast-client --gen-config      Dump default config and exit
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rcast_client::compositor::{DisplayRenderer, place};
use rcast_client::config::ClientConfig;
use rcast_client::connection;
use rcast_client::consumer::{frame_channel, run_consumer};
use rcast_client::input::InputMapper;
use rcast_client::window::{NativeWindow, WindowEvent};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rcast-client", about = "rcast remote display viewer")]
struct Cli {
    /// Server address: host or host:port. Prompted for when absent.
    server: Option<String>,

    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "rcast-client.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

/// Split `host[:port]`, falling back to the configured port.
fn parse_address(input: &str, default_port: u16) -> (String, u16) {
    match input.rsplit_once(':') {
        Some((host, port)) => match port.parse() {
            Ok(port) => (host.to_string(), port),
            Err(_) => (input.to_string(), default_port),
        },
        None => (input.to_string(), default_port),
    }
}

fn prompt_for_address() -> String {
    print!("Server address [localhost]: ");
    std::io::stdout().flush().ok();
    let mut line = String::new();
    std::io::stdin().read_line(&mut line).ok();
    let trimmed = line.trim();
    if trimmed.is_empty() {
        "localhost".to_string()
    } else {
        trimmed.to_string()
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&ClientConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let config = ClientConfig::load(&cli.config);

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("rcast-client v{}", env!("CARGO_PKG_VERSION"));

    let address = cli.server.unwrap_or_else(prompt_for_address);
    let (host, port) = parse_address(&address, config.network.port);

    // ── 1. Create the window ────────────────────────────────────

    let window = NativeWindow::create(
        &config.display.title,
        config.display.width,
        config.display.height,
    )?;
    let mut renderer = DisplayRenderer::new(
        window.hwnd(),
        config.display.width,
        config.display.height,
    );

    // ── 2. Connect and start the consumer ───────────────────────

    let timeout = Duration::from_secs(config.network.connect_timeout_secs);
    let (frames, mut commands) = connection::connect(&host, port, timeout).await?;

    let (frame_tx, mut frame_rx) = frame_channel();
    let connected = Arc::new(AtomicBool::new(true));
    let consumer = tokio::spawn(run_consumer(frames, frame_tx, Arc::clone(&connected)));

    window.set_title(&format!("{} — {host}:{port}", config.display.title));

    // ── 3. Event loop ───────────────────────────────────────────

    let mut mapper = InputMapper::new();
    let mut latest = None;
    let mut waiting_shown = false;

    'outer: while connected.load(Ordering::SeqCst) {
        // Pump window messages.
        for event in window.poll_events() {
            match &event {
                WindowEvent::Close => break 'outer,
                WindowEvent::Resize(w, h) => renderer.resize(*w, *h),
                _ => {}
            }

            let (win_w, win_h) = renderer.size();
            let Some(image) = &latest else { continue };
            let Some(transform) = place(image, win_w, win_h) else {
                continue;
            };

            if let Some(command) = mapper.map(&event, &transform) {
                if let Err(e) = commands.send(&command).await {
                    warn!("command send failed: {e}");
                    break 'outer;
                }
            }
        }

        // Render the newest frame, if any arrived.
        if frame_rx.has_changed().unwrap_or(false) {
            let first_frame = latest.is_none();
            latest = frame_rx.borrow_and_update().clone();
            if let Some(image) = &latest {
                if first_frame {
                    window.set_title(&format!("{} — {host}:{port}", config.display.title));
                }
                if let Err(e) = renderer.render(image) {
                    warn!("render error: {e}");
                }
            }
        } else if latest.is_none() && !waiting_shown {
            window.set_title(&format!(
                "{} — waiting for frames from {host}:{port}",
                config.display.title
            ));
            waiting_shown = true;
        }

        tokio::time::sleep(Duration::from_millis(16)).await;
    }

    // ── 4. Shutdown ─────────────────────────────────────────────

    info!("shutting down");
    consumer.abort();
    let _ = consumer.await;

    Ok(())
}
