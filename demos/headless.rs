//! Headless client: connects, logs every presented frame and exits with a
//! status code describing why the session ended.
//!
//! ```text
//! cargo run --example headless -- client.yaml [cycle_seconds]
//! RUST_LOG=panelcast=debug cargo run --example headless -- client.yaml 5
//! ```
//!
//! With `cycle_seconds` the active window advances on that interval, the way
//! a tap on the display would cycle windows.

use std::time::Duration;

use anyhow::Context;
use futures::StreamExt;
use panelcast::{ClientConfig, DecodedFrame, DisplaySink, LayoutRequest, Panelcast};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Logs instead of drawing
struct LogSink {
    presented: u64,
}

impl DisplaySink for LogSink {
    fn target_size(&self) -> Option<(u32, u32)> {
        Some((800, 600))
    }

    fn present(&mut self, frame: DecodedFrame) {
        self.presented += 1;
        let (width, height) = frame.image.dimensions();
        info!(
            window = frame.window_id,
            sequence = frame.sequence,
            width,
            height,
            presented = self.presented,
            "Frame"
        );
    }

    fn relayout(&mut self, request: &LayoutRequest) {
        info!("Now showing {} ({}x{})", request.title, request.width, request.height);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().context("usage: headless <config.yaml> [cycle_seconds]")?;
    let cycle = args
        .next()
        .map(|s| s.parse::<u64>().context("cycle_seconds must be a whole number"))
        .transpose()?;

    let config = ClientConfig::from_file(&path)?;

    let client = match Panelcast::connect(&config).await {
        Ok(client) => client,
        Err(err) => exit_with(err),
    };
    for window in &client.session().windows {
        info!("Window {} at {:?}", window.name, window.bounds);
    }

    let mut statuses = client.status_updates();
    tokio::spawn(async move {
        while let Some(status) = statuses.next().await {
            info!(?status, "Status");
            if status.is_terminal() {
                break;
            }
        }
    });

    if let Some(seconds) = cycle.filter(|&s| s > 0) {
        let selector = client.selector();
        let shutdown = client.shutdown_token();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(seconds));
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        selector.advance();
                    }
                }
            }
        });
    }

    match client.run(LogSink { presented: 0 }).await {
        Ok((received, consumed)) => {
            info!(?received, ?consumed, "Shut down");
            Ok(())
        }
        Err(err) => exit_with(err),
    }
}

fn exit_with(err: panelcast::PanelcastError) -> ! {
    eprintln!("panelcast: {}", err);
    for suggestion in err.recovery_suggestions() {
        eprintln!("  - {}", suggestion);
    }
    std::process::exit(err.exit_code());
}
