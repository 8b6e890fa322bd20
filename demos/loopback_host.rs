//! Minimal texture host for trying the client without a simulator.
//!
//! Serves a two window session and streams solid colour PNG frames for both
//! windows, alternating, at roughly 20 records per second.
//!
//! ```text
//! cargo run --example loopback_host -- 52500
//! ```

use std::io::Cursor;
use std::time::Duration;

use anyhow::Context;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use panelcast::protocol::{DEFAULT_PORT, PROTOCOL_VERSION, write_record};
use panelcast::{Session, WindowBounds, WindowDescriptor};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn session() -> Session {
    let window = |name: &str, left: i32| WindowDescriptor {
        name: name.to_string(),
        bounds: WindowBounds { left, top: 0, right: left + 320, bottom: 240 },
    };
    Session {
        version: PROTOCOL_VERSION.to_string(),
        aircraft: "LOOPBACK".to_string(),
        texture_width: 1024,
        texture_height: 1024,
        windows: vec![window("PFD", 0), window("ND", 320)],
    }
}

fn frame(width: u32, height: u32, shade: u8, window_id: u8) -> anyhow::Result<Vec<u8>> {
    let colour = if window_id == 0 { [shade, 40, 40, 255] } else { [40, 40, shade, 255] };
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(colour)))
        .write_to(&mut out, ImageOutputFormat::Png)?;
    Ok(out.into_inner())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = match std::env::args().nth(1) {
        Some(arg) => arg.parse().context("port must be a number")?,
        None => DEFAULT_PORT,
    };
    let session = session();
    let block = session.encode_block()?;

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Serving {} on port {}", session.aircraft, port);

    loop {
        let (mut socket, peer) = listener.accept().await?;
        info!("Client connected from {}", peer);
        let block = block.clone();
        let windows = session.windows.clone();

        tokio::spawn(async move {
            let result: anyhow::Result<()> = async {
                tokio::io::AsyncWriteExt::write_all(&mut socket, &block).await?;
                let mut ticker = tokio::time::interval(Duration::from_millis(50));
                for n in 0u64.. {
                    ticker.tick().await;
                    let window_id = (n % windows.len() as u64) as u8;
                    let bounds = windows[window_id as usize].bounds;
                    let payload =
                        frame(bounds.width(), bounds.height(), (n % 256) as u8, window_id)?;
                    write_record(&mut socket, window_id, &payload).await?;
                }
                Ok(())
            }
            .await;

            if let Err(e) = result {
                warn!("Client {} gone: {}", peer, e);
            }
        });
    }
}
