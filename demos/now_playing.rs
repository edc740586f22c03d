//! # Demo: now_playing
//!
//! A fake music player polled twice: once into a cache (REST-style reads) and
//! once into a live stream (websocket-style push), with a console observer
//! printing engine events.
//!
//! Shows how to:
//! - Wrap an async fetch in [`ProducerFn`].
//! - Serve stale-but-present data from a [`Precacher`] while the upstream fails.
//! - Turn a [`Streamer`] subscription into client events with [`NowPlayingEvents`].
//!
//! ## Flow
//! ```text
//! FakePlayer ──► Precacher ──► results()            (every 500ms)
//!            └─► Streamer  ──► session filter ──► NowPlayingEvents ──► println
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example now_playing
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use pollcast::domain::music::{self, CurrentlyPlaying, NowPlayingEvent, NowPlayingEvents, Track};
use pollcast::{
    Event, EventKind, Observe, PollerConfig, Precacher, ProducerError, ProducerFn, Streamer,
    StreamerConfig, Telemetry,
};
use tokio_util::sync::CancellationToken;

/// Prints the events worth seeing in a demo.
struct ConsoleObserver;

#[async_trait::async_trait]
impl Observe for ConsoleObserver {
    async fn on_event(&self, ev: &Event) {
        let source = ev.source.as_deref().unwrap_or("<unknown>");
        match ev.kind {
            EventKind::ProduceFailed => println!(
                "[obs] {source}: cycle {} failed: {}",
                ev.cycle.unwrap_or(0),
                ev.reason.as_deref().unwrap_or("<none>")
            ),
            EventKind::SubscriberAdded | EventKind::SubscriberRemoved => println!(
                "[obs] {source}: {:?} subscriber={}",
                ev.kind,
                ev.subscriber.unwrap_or(0)
            ),
            _ => println!("[obs] {source}: {:?}", ev.kind),
        }
    }

    fn name(&self) -> &'static str {
        "console"
    }

    fn interested(&self, kind: EventKind) -> bool {
        matches!(
            kind,
            EventKind::ProduceFailed
                | EventKind::SubscriberAdded
                | EventKind::SubscriberRemoved
                | EventKind::PollerStopped
                | EventKind::BroadcasterClosed
        )
    }
}

/// Deterministic fake upstream: plays, pauses, errors, stops, plays again.
fn snapshot_for(call: u64) -> Result<Option<CurrentlyPlaying>, ProducerError> {
    let track = Track {
        id: "4uLU6hMCjMI75M1A2tKUQC".into(),
        uri: "music:track:4uLU6hMCjMI75M1A2tKUQC".into(),
        external_url: "https://music.example.com/track/4uLU6hMCjMI75M1A2tKUQC".into(),
        name: "Never Gonna Give You Up".into(),
        duration: Duration::from_secs(213),
        album: None,
        artists: Vec::new(),
    };
    let at = |progress_s: u64, playing: bool| CurrentlyPlaying {
        timestamp: SystemTime::now(),
        track: track.clone(),
        progress: Duration::from_secs(progress_s),
        playing,
    };
    match call {
        1..=3 => Ok(Some(at(call * 10, true))),
        4..=5 => Ok(Some(at(30, false))),
        6 => Err(ProducerError::fail("upstream 503")),
        7..=8 => Ok(None),
        _ => Ok(Some(at(call, true))),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let telemetry = Telemetry::builder()
        .observer(Arc::new(ConsoleObserver))
        .build();

    let calls = Arc::new(AtomicU64::new(0));
    let player = ProducerFn::arc("player", move || {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            snapshot_for(call)
        }
    });

    let mut cache_cfg = PollerConfig::named("player-cache");
    cache_cfg.interval = Duration::from_millis(500);
    let cache = Precacher::builder(player.clone())
        .config(cache_cfg)
        .bus(telemetry.bus())
        .spawn()?;

    let mut stream_cfg = StreamerConfig::default();
    stream_cfg.poller.name = "player-stream".into();
    stream_cfg.poller.interval = Duration::from_millis(200);
    stream_cfg.sink_capacity = 4;
    let streamer = Streamer::builder(player)
        .config(stream_cfg)
        .bus(telemetry.bus())
        .spawn()?;

    let token = CancellationToken::new();
    let mut rx = streamer
        .subscribe_filtered(token.clone(), music::session_filter())
        .await;

    let client = tokio::spawn(async move {
        let mut events = NowPlayingEvents::new();
        while let Some(result) = rx.recv().await {
            match events.classify(&result) {
                Some(NowPlayingEvent::NowPlaying(Some(np))) => println!(
                    "[ws] nowplaying: {} ({})",
                    np.track.name,
                    if np.playing { "playing" } else { "paused" }
                ),
                Some(NowPlayingEvent::NowPlaying(None)) => println!("[ws] nowplaying: nothing"),
                Some(NowPlayingEvent::Progress(p)) => println!("[ws] progress: {}s", p.as_secs()),
                Some(NowPlayingEvent::Error(e)) => println!("[ws] error: {}", e.as_message()),
                None => {}
            }
        }
        println!("[ws] stream closed");
    });

    for _ in 0..6 {
        tokio::time::sleep(Duration::from_millis(500)).await;
        match cache.results() {
            Ok(entry) => println!(
                "[rest] cycle {}: playing={:?} stale={}",
                entry.cycle,
                entry.get().map(|np| np.playing),
                entry.is_stale()
            ),
            Err(e) => println!("[rest] {}", e.as_label()),
        }
    }

    token.cancel();
    streamer.stop().await;
    cache.stop();
    let _ = client.await;
    telemetry.shutdown().await;
    Ok(())
}
