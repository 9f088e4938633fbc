use anyhow::{Context, Result};
use gamepad_link::{ConnectionMonitor, KeyEvent, LinkConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = match std::env::args().nth(1) {
        Some(endpoint) => {
            let (host, port) = endpoint
                .rsplit_once(':')
                .with_context(|| format!("expected host:port, got {endpoint}"))?;
            LinkConfig {
                host: host.to_string(),
                port: port.parse().context("invalid port")?,
                ..Default::default()
            }
        }
        None => LinkConfig::default(),
    };

    info!("Gamepad link starting");
    info!("  server: {}:{}", config.host, config.port);

    let monitor = ConnectionMonitor::new(config);
    monitor.start().await;

    // Log connectivity transitions as the host UI would display them.
    let mut signal = monitor.subscribe();
    tokio::spawn(async move {
        while signal.changed().await.is_ok() {
            if *signal.borrow_and_update() {
                info!("link up");
            } else {
                warn!("link down");
            }
        }
    });

    // Stand-in for the gesture layer: map console commands to key events.
    println!("commands: press <ID> | release <ID> | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let event = match line.trim().split_once(' ') {
            Some(("press", control)) => KeyEvent::press(control.trim()),
            Some(("release", control)) => KeyEvent::release(control.trim()),
            None if line.trim() == "quit" => break,
            _ => {
                println!("commands: press <ID> | release <ID> | quit");
                continue;
            }
        };

        if let Err(e) = monitor.send_message(&event.to_string()).await {
            warn!("send failed: {e:#}");
        }
    }

    monitor.stop().await;
    info!("Gamepad link stopped");
    Ok(())
}
