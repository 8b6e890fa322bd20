//! Loopback tests for the connection layer
//!
//! A small host runs on 127.0.0.1 and writes handshake blocks and records
//! through the same framing code a real host plugin would use.

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::*;
use crate::ErrorCategory;
use crate::protocol::write_record;
use crate::test_utils::{ChannelSink, SinkEvent, handshake_block, png_payload};

const SINGLE_COCKPIT: &str = "XTEv3\nC172\n1024 1024\nCOCKPIT 0 0 800 600\n__EOF__\n";
const TWO_WINDOWS: &str = "XTEv3\nA320\n2048 2048\nPFD 0 0 512 512\nND 512 0 1024 512\n__EOF__\n";

/// What the host writes after the handshake
enum HostStep {
    Record(u8, Vec<u8>),
    Raw(Vec<u8>),
    /// Wait for the test before continuing
    Hold(oneshot::Receiver<()>),
}

async fn host(handshake: &str, steps: Vec<HostStep>) -> (ClientConfig, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let block = handshake_block(handshake);

    let task = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(&block).await.unwrap();
        for step in steps {
            match step {
                HostStep::Record(window_id, payload) => {
                    write_record(&mut socket, window_id, &payload).await.unwrap()
                }
                HostStep::Raw(bytes) => socket.write_all(&bytes).await.unwrap(),
                HostStep::Hold(release) => {
                    let _ = release.await;
                }
            }
        }
        socket.shutdown().await.ok();
    });

    (ClientConfig::new("127.0.0.1").with_port(port), task)
}

async fn next_frame(events: &mut mpsc::UnboundedReceiver<SinkEvent>) -> crate::DecodedFrame {
    loop {
        match events.recv().await.expect("sink closed before a frame arrived") {
            SinkEvent::Frame(frame) => return frame,
            SinkEvent::Layout(_) => continue,
        }
    }
}

#[tokio::test]
async fn handshake_exposes_session_and_default_window() {
    let (release_tx, release) = oneshot::channel();
    let (config, host_task) = host(SINGLE_COCKPIT, vec![HostStep::Hold(release)]).await;

    let client = crate::Panelcast::connect(&config).await.unwrap();
    let session = client.session();
    assert_eq!(session.aircraft, "C172");
    assert_eq!((session.texture_width, session.texture_height), (1024, 1024));
    assert_eq!(session.window_count(), 1);
    assert_eq!(session.windows[0].name, "COCKPIT");
    assert_eq!(client.selector().current(), 0);
    assert_eq!(
        client.current_status(),
        ClientStatus::Connected { aircraft: "C172".into(), windows: 1 }
    );

    release_tx.send(()).unwrap();
    host_task.await.unwrap();
}

#[tokio::test]
async fn frames_reach_the_sink_until_the_host_closes() {
    let (release_tx, release) = oneshot::channel();
    let (config, host_task) = host(
        SINGLE_COCKPIT,
        vec![
            HostStep::Record(0, png_payload(16, 12, [0, 255, 0, 255])),
            HostStep::Hold(release),
        ],
    )
    .await;

    let client = StreamClient::connect(&config).await.unwrap();
    let mut statuses = client.status_updates();
    assert!(matches!(statuses.next().await, Some(ClientStatus::Connected { .. })));

    let (sink, mut events) = ChannelSink::new();
    let running = tokio::spawn(client.run(sink));

    let frame = next_frame(&mut events).await;
    assert_eq!(frame.window_id, 0);
    assert_eq!(frame.image.dimensions(), (16, 12));
    match events.recv().await {
        Some(SinkEvent::Layout(layout)) => assert_eq!(layout.title, "C172 COCKPIT"),
        other => panic!("expected a layout request, got {:?}", other),
    }

    // Closing the connection is fatal, never a clean end
    release_tx.send(()).unwrap();
    let err = running.await.unwrap().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Stream);
    host_task.await.unwrap();

    // Intermediate states may be coalesced; the final one never is
    let rest: Vec<_> = statuses.collect().await;
    let last = rest.last().expect("a final status");
    assert!(last.is_terminal());
    assert!(rest[..rest.len() - 1].iter().all(|status| !status.is_terminal()));
}

#[tokio::test]
async fn only_the_selected_window_is_displayed() {
    let (release_tx, release) = oneshot::channel();
    let (config, host_task) = host(
        TWO_WINDOWS,
        vec![
            HostStep::Record(0, b"not even decoded".to_vec()),
            HostStep::Record(1, png_payload(8, 8, [1, 1, 1, 255])),
            HostStep::Hold(release),
        ],
    )
    .await;

    let client = StreamClient::connect(&config.with_initial_window(1)).await.unwrap();
    assert_eq!(client.selector().current(), 1);

    let (sink, mut events) = ChannelSink::new();
    let running = tokio::spawn(client.run(sink));

    let frame = next_frame(&mut events).await;
    assert_eq!(frame.window_id, 1);

    release_tx.send(()).unwrap();
    let err = running.await.unwrap().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Stream);
    host_task.await.unwrap();
}

#[tokio::test]
async fn out_of_range_initial_window_falls_back_to_first() {
    let (release_tx, release) = oneshot::channel();
    let (config, host_task) = host(TWO_WINDOWS, vec![HostStep::Hold(release)]).await;

    let client = StreamClient::connect(&config.with_initial_window(7)).await.unwrap();
    assert_eq!(client.selector().current(), 0);

    release_tx.send(()).unwrap();
    host_task.await.unwrap();
}

#[tokio::test]
async fn corrupted_record_header_is_framing_error() {
    let mut bad = crate::protocol::RecordHeader::new(0, 4).encode();
    bad[3] = b'X';
    let (config, host_task) = host(
        SINGLE_COCKPIT,
        vec![HostStep::Record(0, png_payload(2, 2, [0; 4])), HostStep::Raw(bad.to_vec())],
    )
    .await;

    let client = StreamClient::connect(&config).await.unwrap();
    let (sink, _events) = ChannelSink::new();
    let err = client.run(sink).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Framing);
    host_task.await.unwrap();
}

#[tokio::test]
async fn version_mismatch_is_rejected_before_streaming() {
    let (config, host_task) =
        host("XTEv2\nC172\n1024 1024\nCOCKPIT 0 0 800 600\n__EOF__\n", vec![]).await;

    let err = StreamClient::connect(&config).await.unwrap_err();
    match err {
        PanelcastError::Version { expected, found } => {
            assert_eq!(expected, "XTEv3");
            assert_eq!(found, "XTEv2");
        }
        other => panic!("expected version error, got {:?}", other),
    }
    host_task.await.unwrap();
}

#[tokio::test]
async fn refused_connection_is_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = StreamClient::connect(&ClientConfig::new("127.0.0.1").with_port(port))
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Connection);
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn invalid_config_fails_before_connecting() {
    let err = StreamClient::connect(&ClientConfig::new("")).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Config);
}

#[tokio::test]
async fn shutdown_token_stops_a_healthy_session() {
    let (release_tx, release) = oneshot::channel();
    let (config, host_task) = host(SINGLE_COCKPIT, vec![HostStep::Hold(release)]).await;

    let client = StreamClient::connect(&config).await.unwrap();
    let shutdown = client.shutdown_token();
    let mut statuses = client.status_updates();
    let (sink, _events) = ChannelSink::new();
    let running = tokio::spawn(client.run(sink));

    shutdown.cancel();
    let (received, consumed) = running.await.unwrap().unwrap();
    assert_eq!(received.records, 0);
    assert_eq!(consumed.presented, 0);

    let mut last = None;
    while let Some(status) = statuses.next().await {
        last = Some(status);
    }
    assert_eq!(last, Some(ClientStatus::Disconnected { reason: "shut down".into() }));

    release_tx.send(()).ok();
    host_task.await.unwrap();
}

#[tokio::test]
async fn from_stream_accepts_in_memory_transport() {
    let (mut host_end, client_end) = tokio::io::duplex(8 * 1024);
    host_end.write_all(&handshake_block(TWO_WINDOWS)).await.unwrap();

    let client = StreamClient::from_stream(client_end, &ClientConfig::new("unused"))
        .await
        .unwrap();
    assert_eq!(client.session().aircraft, "A320");
    assert_eq!(client.selector().count(), 2);
}

#[tokio::test]
async fn from_stream_rejects_zero_geometry() {
    let (_host_end, client_end) = tokio::io::duplex(64);
    let config = ClientConfig::new("unused")
        .with_display(crate::DisplayMode::Geometry { width: 0, height: 480 });

    let err = StreamClient::from_stream(client_end, &config).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Config);
}
